//! Shared configuration: paths, model defaults, and attempt ceilings.
//!
//! A [`ForgeConfig`] is constructed once at process start and passed by
//! reference into the runner and pipeline. No ambient globals — the loops
//! stay unit-testable with injected fakes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default model identifier for agent invocations.
pub const DEFAULT_MODEL: &str = "claude-opus-4-5";

/// Default maximum agent turns per invocation.
pub const DEFAULT_MAX_TURNS: u32 = 30;

/// Default ceiling on validation attempts per document.
///
/// High on purpose: validation is cheap and automated fixing is preferred
/// over early abandonment.
pub const DEFAULT_MAX_VALIDATION_ATTEMPTS: u32 = 500;

/// Default validator subprocess timeout in seconds.
pub const DEFAULT_VALIDATOR_TIMEOUT_SECS: u64 = 30;

/// Configuration for the external validator CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Runtime used to execute the validator (e.g. `node`).
    pub runtime: String,

    /// Path to the validator CLI entry point.
    pub cli_path: PathBuf,

    /// Subprocess timeout in seconds.
    pub timeout_secs: u64,
}

impl ValidatorConfig {
    /// Create a validator configuration with the default runtime and timeout.
    pub fn new(cli_path: PathBuf) -> Self {
        Self {
            runtime: "node".to_string(),
            cli_path,
            timeout_secs: DEFAULT_VALIDATOR_TIMEOUT_SECS,
        }
    }
}

/// Top-level LessonForge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Model identifier passed to the agent.
    pub model: String,

    /// Maximum agent turns per invocation (generation or fix).
    pub max_turns: u32,

    /// Maximum validation attempts per document.
    pub max_validation_attempts: u32,

    /// Working directory handed to the agent; spec, curriculum, and output
    /// paths are resolved against it so the agent and the validator see the
    /// same files.
    pub project_root: PathBuf,

    /// Agent CLI program name or path.
    pub agent_program: String,

    /// Path to the static lesson-format reference document.
    pub format_guide_path: PathBuf,

    /// Extension of lesson spec files inside the curriculum tree.
    pub spec_extension: String,

    /// Extension of generated lesson artifacts.
    pub artifact_extension: String,

    /// External validator settings.
    pub validator: ValidatorConfig,
}

impl ForgeConfig {
    /// Create a configuration with source defaults for the given project
    /// root and validator CLI path.
    pub fn new(project_root: PathBuf, validator_cli: PathBuf) -> Self {
        let format_guide_path = project_root.join("assets").join("format-guide.md");
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            max_validation_attempts: DEFAULT_MAX_VALIDATION_ATTEMPTS,
            project_root,
            agent_program: "claude".to_string(),
            format_guide_path,
            spec_extension: "md".to_string(),
            artifact_extension: "lesson".to_string(),
            validator: ValidatorConfig::new(validator_cli),
        }
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the per-invocation turn budget.
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Override the per-document validation attempt ceiling.
    pub fn with_max_validation_attempts(mut self, attempts: u32) -> Self {
        self.max_validation_attempts = attempts;
        self
    }
}
