//! Curriculum manifest parsing, enrichment, and persistence.
//!
//! The manifest is the hierarchical batch input: ordered modules, each an
//! ordered collection of lesson descriptors. Unknown keys round-trip
//! through `#[serde(flatten)]` maps so enrichment never drops fields it
//! does not understand.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

/// Filename of the enriched manifest inside the output root.
pub const ENRICHED_MANIFEST_FILENAME: &str = "curriculum.json";

/// One lesson descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonEntry {
    pub lesson_id: String,

    /// Relative path of the generated artifact; attached during
    /// enrichment for succeeded lessons only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_path: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One module: ordered lessons plus identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleEntry {
    pub module_id: String,
    pub module_title: String,
    pub lessons: Vec<LessonEntry>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The curriculum manifest: an ordered collection of modules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurriculumManifest {
    pub modules: Vec<ModuleEntry>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CurriculumManifest {
    /// Load and parse a manifest. A malformed or unreadable manifest is
    /// fatal to the entire batch — no partial batch proceeds without one.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ForgeError::ManifestUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| ForgeError::ManifestMalformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Deep-copy with `lesson_path` attached to every lesson whose id is
    /// in `succeeded`. Failed and skipped lessons pass through
    /// unannotated, never dropped.
    pub fn enrich(&self, succeeded: &HashSet<String>, artifact_extension: &str) -> Self {
        let mut enriched = self.clone();
        for module in &mut enriched.modules {
            for lesson in &mut module.lessons {
                if succeeded.contains(&lesson.lesson_id) {
                    lesson.lesson_path = Some(format!(
                        "{}/{}.{}",
                        module.module_id, lesson.lesson_id, artifact_extension
                    ));
                }
            }
        }
        enriched
    }

    /// Write the manifest fully formed: serialize to a temporary sibling
    /// file, then rename into place so a partial manifest is never
    /// observable as final.
    pub async fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes()).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}
