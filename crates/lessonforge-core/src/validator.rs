//! External lesson validator adapter.
//!
//! Runs the validator CLI via subprocess and normalizes its result into a
//! [`ValidationOutcome`]. This is the mechanically enforced check — the
//! agent cannot skip or circumvent it.
//!
//! The adapter is a single-shot probe: it never retries. Infrastructure
//! failures (missing binary, missing runtime, timeout) are reported as
//! ordinary failing outcomes so the retry loop treats every failure
//! uniformly; the trade-off is that unfixable infrastructure problems
//! consume retry budget.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::ValidatorConfig;

/// Result of one validator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// True iff the validator exited with code 0.
    pub success: bool,

    /// Number of errors detected. Zero iff `success`; floors at 1 on
    /// failure even when no explicit error lines are parseable.
    pub error_count: usize,

    /// Full stdout + stderr from the validator CLI, forwarded verbatim
    /// into the next fix prompt.
    pub raw_output: String,
}

impl ValidationOutcome {
    /// A passing outcome.
    pub fn passed(raw_output: String) -> Self {
        Self {
            success: true,
            error_count: 0,
            raw_output,
        }
    }

    /// A failing outcome; `error_count` floors at 1.
    pub fn failed(raw_output: String, error_count: usize) -> Self {
        Self {
            success: false,
            error_count: error_count.max(1),
            raw_output,
        }
    }
}

/// Structural validator for generated lesson documents.
#[async_trait]
pub trait LessonValidator: Send + Sync {
    /// Validate one document. Infallible by design: every failure shape,
    /// including infrastructure failures, is a failing outcome.
    async fn validate(&self, document: &Path) -> ValidationOutcome;
}

/// Count output lines that look like errors.
///
/// A line counts when it contains the case-insensitive substring "error"
/// and its trimmed form does not start with a comment marker.
pub fn count_error_lines(output: &str) -> usize {
    output
        .lines()
        .filter(|line| line.to_lowercase().contains("error") && !line.trim_start().starts_with('#'))
        .count()
}

/// Subprocess-backed validator: `<runtime> <cli_path> <document>`.
pub struct CliValidator {
    config: ValidatorConfig,
}

impl CliValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LessonValidator for CliValidator {
    async fn validate(&self, document: &Path) -> ValidationOutcome {
        if !self.config.cli_path.exists() {
            return ValidationOutcome::failed(
                format!(
                    "Validator CLI not found at {}. Build it first.",
                    self.config.cli_path.display()
                ),
                1,
            );
        }

        if !document.exists() {
            return ValidationOutcome::failed(format!("File not found: {}", document.display()), 1);
        }

        let child = Command::new(&self.config.runtime)
            .arg(&self.config.cli_path)
            .arg(document)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ValidationOutcome::failed(
                    format!(
                        "Runtime '{}' not found. Ensure it is on your PATH.",
                        self.config.runtime
                    ),
                    1,
                );
            }
            Err(e) => {
                return ValidationOutcome::failed(
                    format!("Unexpected error running validator: {e}"),
                    1,
                );
            }
        };

        let output = match tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return ValidationOutcome::failed(
                    format!("Unexpected error running validator: {e}"),
                    1,
                );
            }
            Err(_) => {
                return ValidationOutcome::failed(
                    format!(
                        "Validator timed out after {} seconds.",
                        self.config.timeout_secs
                    ),
                    1,
                );
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            combined.push('\n');
            combined.push_str(&stderr);
        }
        let combined = combined.trim().to_string();

        if output.status.success() {
            ValidationOutcome::passed(combined)
        } else {
            let count = count_error_lines(&combined);
            ValidationOutcome::failed(combined, count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_with(cli_path: PathBuf) -> ValidatorConfig {
        ValidatorConfig {
            runtime: "node".to_string(),
            cli_path,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_outcome_invariant_success_means_zero_errors() {
        let ok = ValidationOutcome::passed("all good".to_string());
        assert!(ok.success);
        assert_eq!(ok.error_count, 0);

        let bad = ValidationOutcome::failed("broken".to_string(), 0);
        assert!(!bad.success);
        assert_eq!(bad.error_count, 1, "failure floors at 1");
    }

    #[test]
    fn test_count_error_lines() {
        let output = "Error: missing <Meta>\nline ok\nparse ERROR near line 4\n# error in comment\n";
        assert_eq!(count_error_lines(output), 2);
    }

    #[test]
    fn test_count_error_lines_none() {
        assert_eq!(count_error_lines("everything fine\n"), 0);
    }

    #[tokio::test]
    async fn test_missing_cli_reported() {
        let validator = CliValidator::new(config_with(PathBuf::from("/no/such/cli.js")));
        let outcome = validator.validate(Path::new("/tmp/whatever.lesson")).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error_count, 1);
        assert!(outcome.raw_output.contains("/no/such/cli.js"));
        assert!(outcome.raw_output.contains("Build it"));
    }

    #[tokio::test]
    async fn test_missing_document_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cli = dir.path().join("cli.js");
        std::fs::write(&cli, "// stub").unwrap();

        let validator = CliValidator::new(config_with(cli));
        let missing = dir.path().join("absent.lesson");
        let outcome = validator.validate(&missing).await;
        assert!(!outcome.success);
        assert!(outcome.raw_output.contains("File not found"));
    }

    #[tokio::test]
    async fn test_missing_runtime_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cli = dir.path().join("cli.js");
        let doc = dir.path().join("doc.lesson");
        std::fs::write(&cli, "// stub").unwrap();
        std::fs::write(&doc, "<Lesson/>").unwrap();

        let validator = CliValidator::new(ValidatorConfig {
            runtime: "no-such-runtime-xyz".to_string(),
            cli_path: cli,
            timeout_secs: 5,
        });
        let outcome = validator.validate(&doc).await;
        assert!(!outcome.success);
        assert!(outcome.raw_output.contains("not found"));
        assert!(outcome.raw_output.contains("PATH"));
    }

    #[tokio::test]
    async fn test_exit_zero_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let cli = dir.path().join("cli");
        let doc = dir.path().join("doc.lesson");
        std::fs::write(&cli, "ignored").unwrap();
        std::fs::write(&doc, "<Lesson/>").unwrap();

        // "true" ignores its arguments and exits 0
        let validator = CliValidator::new(ValidatorConfig {
            runtime: "true".to_string(),
            cli_path: cli,
            timeout_secs: 5,
        });
        let outcome = validator.validate(&doc).await;
        assert!(outcome.success);
        assert_eq!(outcome.error_count, 0);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cli = dir.path().join("cli");
        let doc = dir.path().join("doc.lesson");
        std::fs::write(&cli, "ignored").unwrap();
        std::fs::write(&doc, "<Lesson/>").unwrap();

        let validator = CliValidator::new(ValidatorConfig {
            runtime: "false".to_string(),
            cli_path: cli,
            timeout_secs: 5,
        });
        let outcome = validator.validate(&doc).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error_count, 1, "no error lines still floors at 1");
    }
}
