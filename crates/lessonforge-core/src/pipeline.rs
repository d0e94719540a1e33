//! Batch orchestration over a curriculum manifest.
//!
//! Lessons are processed strictly in manifest order and one failure never
//! aborts the batch: each lesson lands in exactly one of three buckets
//! (succeeded, failed, skipped) and an enriched manifest is written at the
//! end regardless of how many failed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::agent::AgentClient;
use crate::config::ForgeConfig;
use crate::error::Result;
use crate::manifest::{CurriculumManifest, ENRICHED_MANIFEST_FILENAME};
use crate::runner::{GenerationRequest, LessonRunner};
use crate::validator::LessonValidator;

/// Where every lesson of a batch ended up. The buckets are disjoint and
/// together cover the processed manifest exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Lesson ids that passed validation.
    pub succeeded: Vec<String>,

    /// Lesson ids that reached a terminal failure (agent failure or
    /// exhausted attempts).
    pub failed: Vec<String>,

    /// Lesson ids whose spec file was missing; never attempted.
    pub skipped: Vec<String>,
}

impl BatchOutcome {
    /// Total number of lessons considered.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }

    /// Whether every attempted lesson succeeded (skips do not count
    /// against a clean batch).
    pub fn all_attempted_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives a whole curriculum through the per-document runner.
pub struct BatchPipeline<'a> {
    config: &'a ForgeConfig,
    agent: &'a dyn AgentClient,
    validator: &'a dyn LessonValidator,
}

impl<'a> BatchPipeline<'a> {
    pub fn new(
        config: &'a ForgeConfig,
        agent: &'a dyn AgentClient,
        validator: &'a dyn LessonValidator,
    ) -> Self {
        Self {
            config,
            agent,
            validator,
        }
    }

    /// Process every lesson in the manifest (optionally restricted to one
    /// module), then write the enriched manifest into `output_root`.
    ///
    /// Spec files are expected at
    /// `<manifest dir>/<module_id>/<lesson_id>.<spec extension>`;
    /// artifacts land at
    /// `<output_root>/<module_id>/<lesson_id>.<artifact extension>`.
    pub async fn run(
        &self,
        curriculum_path: &Path,
        output_root: &Path,
        module_filter: Option<&str>,
    ) -> Result<BatchOutcome> {
        let manifest = CurriculumManifest::load(curriculum_path)?;
        let manifest_dir = curriculum_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let runner = LessonRunner::load(self.config, self.agent, self.validator)?;

        let mut outcome = BatchOutcome::default();

        for module in &manifest.modules {
            if let Some(filter) = module_filter {
                if module.module_id != filter {
                    continue;
                }
            }
            info!(
                module = %module.module_id,
                title = %module.module_title,
                lessons = module.lessons.len(),
                "processing module"
            );

            let module_out = output_root.join(&module.module_id);

            for lesson in &module.lessons {
                let spec_path = manifest_dir
                    .join(&module.module_id)
                    .join(format!("{}.{}", lesson.lesson_id, self.config.spec_extension));

                if !spec_path.exists() {
                    warn!(
                        lesson = %lesson.lesson_id,
                        spec = %spec_path.display(),
                        "spec file missing, skipping"
                    );
                    outcome.skipped.push(lesson.lesson_id.clone());
                    continue;
                }

                // Created per lesson so a module whose specs are all
                // missing leaves no empty directory behind.
                tokio::fs::create_dir_all(&module_out).await?;

                let request = GenerationRequest::new(
                    spec_path,
                    curriculum_path.to_path_buf(),
                    &module_out,
                    &self.config.artifact_extension,
                );
                let document = runner.run(&request).await;
                if document.passed() {
                    outcome.succeeded.push(lesson.lesson_id.clone());
                } else {
                    outcome.failed.push(lesson.lesson_id.clone());
                }
            }
        }

        let succeeded_set: HashSet<String> = outcome.succeeded.iter().cloned().collect();
        let enriched = manifest.enrich(&succeeded_set, &self.config.artifact_extension);
        tokio::fs::create_dir_all(output_root).await?;
        let enriched_path = output_root.join(ENRICHED_MANIFEST_FILENAME);
        enriched.write(&enriched_path).await?;
        info!(
            manifest = %enriched_path.display(),
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            skipped = outcome.skipped.len(),
            "batch complete"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;
    use crate::fakes::{ScriptedAgent, ScriptedValidator};

    #[tokio::test]
    async fn test_missing_manifest_is_fatal() {
        let config = ForgeConfig::new(PathBuf::from("."), PathBuf::from("cli.js"));
        let agent = ScriptedAgent::new();
        let validator = ScriptedValidator::new();
        let pipeline = BatchPipeline::new(&config, &agent, &validator);

        let err = pipeline
            .run(Path::new("/no/such/curriculum.json"), Path::new("out"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::ManifestUnreadable { .. }));
    }

    #[test]
    fn test_buckets_are_accounted() {
        let outcome = BatchOutcome {
            succeeded: vec!["a".into(), "b".into()],
            failed: vec!["c".into()],
            skipped: vec!["d".into()],
        };
        assert_eq!(outcome.total(), 4);
        assert!(!outcome.all_attempted_succeeded());

        let clean = BatchOutcome {
            succeeded: vec!["a".into()],
            failed: vec![],
            skipped: vec!["d".into()],
        };
        assert!(clean.all_attempted_succeeded(), "skips do not fail a batch");
    }
}
