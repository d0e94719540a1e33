//! Single-document generation loop with externally enforced validation.
//!
//! The finite-state retry loop at the heart of LessonForge:
//!
//! ```text
//! GENERATING -> VALIDATING <-> FIXING -> {PASSED, EXHAUSTED, AGENT_FAILED}
//! ```
//!
//! 1. The agent generates the lesson file (generation phase)
//! 2. The validator CLI runs externally — the agent cannot skip it
//! 3. On errors, the raw diagnostics are fed back as a fix prompt
//! 4. Repeat 2-3 until validation passes or the attempt budget is spent
//!
//! The authority on pass/fail is always the external validator, never the
//! agent's own self-report. The self-report only gates the initial
//! generation step, where no file exists yet to validate.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::agent::{AgentClient, AgentInvocation};
use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};
use crate::prompts::{build_fix_prompt, build_generation_prompt, document_id_from_stem};
use crate::validator::LessonValidator;

/// Number of diagnostic lines shown in validation-failure previews.
pub const DIAGNOSTIC_PREVIEW_LINES: usize = 20;

/// Identifies one lesson document to produce. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Lesson specification file (markdown).
    pub spec_path: PathBuf,

    /// Course-context file (curriculum JSON).
    pub curriculum_path: PathBuf,

    /// Exact path the agent must write.
    pub output_file: PathBuf,

    /// Derived identifier: letters, digits, and hyphens only.
    pub document_id: String,
}

impl GenerationRequest {
    /// Build a request for the given spec, placing the artifact in
    /// `output_dir` with the spec's stem and the configured extension.
    pub fn new(
        spec_path: PathBuf,
        curriculum_path: PathBuf,
        output_dir: &Path,
        artifact_extension: &str,
    ) -> Self {
        let stem = spec_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let document_id = document_id_from_stem(&stem);
        let output_file = output_dir.join(format!("{stem}.{artifact_extension}"));
        Self {
            spec_path,
            curriculum_path,
            output_file,
            document_id,
        }
    }
}

/// Terminal state of one document's retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Validation passed on the given attempt.
    Passed { attempts: u32 },

    /// The attempt budget was spent without a passing validation.
    Exhausted { attempts: u32 },

    /// The agent reported failure during initial generation; no
    /// validation was attempted.
    AgentFailed,
}

impl DocumentOutcome {
    /// Whether the document passed validation.
    pub fn passed(&self) -> bool {
        matches!(self, DocumentOutcome::Passed { .. })
    }
}

/// First `max_lines` of a diagnostic text plus the number of elided lines.
///
/// The preview is for observability only; fix prompts always receive the
/// full text.
pub fn diagnostic_preview(raw: &str, max_lines: usize) -> (String, usize) {
    let total = raw.lines().count();
    let preview = raw
        .lines()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n");
    (preview, total.saturating_sub(max_lines))
}

/// Drives one document through generate, validate, and fix cycles.
pub struct LessonRunner<'a> {
    config: &'a ForgeConfig,
    agent: &'a dyn AgentClient,
    validator: &'a dyn LessonValidator,
    system_prompt: String,
}

impl<'a> LessonRunner<'a> {
    /// Build a runner, reading the format guide from the configured path.
    pub fn load(
        config: &'a ForgeConfig,
        agent: &'a dyn AgentClient,
        validator: &'a dyn LessonValidator,
    ) -> Result<Self> {
        let guide = std::fs::read_to_string(&config.format_guide_path).map_err(|source| {
            ForgeError::FormatGuideUnreadable {
                path: config.format_guide_path.clone(),
                source,
            }
        })?;
        Ok(Self::with_system_prompt(
            config,
            agent,
            validator,
            crate::prompts::build_system_prompt(&guide),
        ))
    }

    /// Build a runner with an already-assembled system prompt.
    pub fn with_system_prompt(
        config: &'a ForgeConfig,
        agent: &'a dyn AgentClient,
        validator: &'a dyn LessonValidator,
        system_prompt: String,
    ) -> Self {
        Self {
            config,
            agent,
            validator,
            system_prompt,
        }
    }

    /// Run one document to a terminal outcome.
    ///
    /// Document-local failures never escape as errors — every path
    /// resolves to a [`DocumentOutcome`].
    pub async fn run(&self, request: &GenerationRequest) -> DocumentOutcome {
        info!(
            document = %request.document_id,
            spec = %request.spec_path.display(),
            output = %request.output_file.display(),
            model = %self.config.model,
            "generating lesson"
        );

        // Phase 1: generation. The agent's self-report gates this step
        // only — there is no file to validate yet.
        let generation = AgentInvocation::new(
            build_generation_prompt(
                &request.spec_path,
                &request.curriculum_path,
                &request.output_file,
                &request.document_id,
            ),
            self.system_prompt.clone(),
        );

        let outcome = match self.agent.invoke(&generation).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(document = %request.document_id, error = %e, "agent invocation error during generation");
                return DocumentOutcome::AgentFailed;
            }
        };
        if !outcome.succeeded {
            error!(document = %request.document_id, "agent failed during generation phase");
            return DocumentOutcome::AgentFailed;
        }
        let mut session_id = outcome.session_id;

        // Phase 2: external validation loop. Exactly one validator
        // invocation per attempt, bounded by the configured maximum.
        let max_attempts = self.config.max_validation_attempts;
        for attempt in 1..=max_attempts {
            info!(
                document = %request.document_id,
                attempt,
                max_attempts,
                "validation attempt"
            );

            let result = self.validator.validate(&request.output_file).await;

            if result.success {
                info!(
                    document = %request.document_id,
                    attempt,
                    "validation passed"
                );
                return DocumentOutcome::Passed { attempts: attempt };
            }

            let (preview, elided) = diagnostic_preview(&result.raw_output, DIAGNOSTIC_PREVIEW_LINES);
            warn!(
                document = %request.document_id,
                errors = result.error_count,
                "validation failed:\n{preview}"
            );
            if elided > 0 {
                warn!(document = %request.document_id, "... ({elided} more lines)");
            }

            if attempt == max_attempts {
                error!(
                    document = %request.document_id,
                    attempts = max_attempts,
                    "exhausted validation attempts"
                );
                return DocumentOutcome::Exhausted { attempts: attempt };
            }

            // Phase 3: feed the full diagnostics back for fixing, resuming
            // the same session so the agent keeps its context. A fix that
            // self-reports failure may still have improved the file, so we
            // re-validate regardless.
            info!(document = %request.document_id, attempt, "sending errors to agent for fixing");
            let fix = AgentInvocation::new(
                build_fix_prompt(&request.output_file, &result.raw_output, attempt),
                self.system_prompt.clone(),
            )
            .resuming(session_id.clone());

            match self.agent.invoke(&fix).await {
                Ok(outcome) => {
                    if let Some(sid) = outcome.session_id {
                        session_id = Some(sid);
                    }
                    if !outcome.succeeded {
                        warn!(
                            document = %request.document_id,
                            attempt,
                            "agent reported issues during fix attempt, re-validating anyway"
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        document = %request.document_id,
                        attempt,
                        error = %e,
                        "agent invocation error during fix attempt, re-validating anyway"
                    );
                }
            }
        }

        DocumentOutcome::Exhausted {
            attempts: max_attempts,
        }
    }
}
