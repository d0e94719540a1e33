//! LessonForge — generate interactive lesson documents from curriculum specs.
//!
//! Single lesson:
//!
//! ```text
//! lessonforge curriculum/module_01/lesson_01_01.md
//! ```
//!
//! Whole curriculum (optionally one module):
//!
//! ```text
//! lessonforge --all curriculum/curriculum.json
//! lessonforge --all --module module_01 curriculum/curriculum.json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{warn, Level};

use lessonforge_core::telemetry::init_tracing;
use lessonforge_core::{
    BatchPipeline, CliAgentClient, CliValidator, DocumentOutcome, ForgeConfig, GenerationRequest,
    LessonRunner,
};

#[derive(Parser)]
#[command(name = "lessonforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate validated lesson documents from curriculum specs", long_about = None)]
struct Cli {
    /// Path to a lesson spec (.md), or to curriculum.json with --all
    input: PathBuf,

    /// Generate every lesson listed in a curriculum.json file
    #[arg(long)]
    all: bool,

    /// Restrict --all to one module (e.g. module_01)
    #[arg(long)]
    module: Option<String>,

    /// Output directory for generated lesson files
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Model identifier passed to the agent
    #[arg(long)]
    model: Option<String>,

    /// Maximum agent turns per invocation
    #[arg(long)]
    max_turns: Option<u32>,

    /// Maximum validation attempts per lesson
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Path to the validator CLI entry point
    #[arg(long, env = "LESSONFORGE_VALIDATOR", default_value = "validator/dist/cli.js")]
    validator: PathBuf,

    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as newline-delimited JSON
    #[arg(long, global = true)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let project_root = std::env::current_dir().context("failed to resolve working directory")?;
    let mut config = ForgeConfig::new(project_root.clone(), cli.validator.clone());
    if let Some(model) = &cli.model {
        config = config.with_model(model);
    }
    if let Some(max_turns) = cli.max_turns {
        config = config.with_max_turns(max_turns);
    }
    if let Some(max_attempts) = cli.max_attempts {
        config = config.with_max_validation_attempts(max_attempts);
    }

    let output_dir = if cli.output.is_absolute() {
        cli.output.clone()
    } else {
        project_root.join(&cli.output)
    };
    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let agent = CliAgentClient::from_config(&config);
    let validator = CliValidator::new(config.validator.clone());

    if cli.all {
        run_batch(&config, &agent, &validator, &cli.input, &output_dir, cli.module.as_deref())
            .await
    } else {
        run_single(&config, &agent, &validator, &cli.input, &output_dir).await
    }
}

/// Batch mode. Partial failure is reported, not a process failure.
async fn run_batch(
    config: &ForgeConfig,
    agent: &CliAgentClient,
    validator: &CliValidator,
    curriculum: &Path,
    output_dir: &Path,
    module_filter: Option<&str>,
) -> Result<ExitCode> {
    let pipeline = BatchPipeline::new(config, agent, validator);
    let outcome = pipeline
        .run(curriculum, output_dir, module_filter)
        .await
        .context("batch generation failed")?;

    println!();
    println!("{}", "=".repeat(60));
    println!("BATCH RESULTS");
    println!("{}", "=".repeat(60));
    println!("Succeeded: {} lessons", outcome.succeeded.len());
    println!("Failed:    {} lessons", outcome.failed.len());
    println!("Skipped:   {} lessons", outcome.skipped.len());
    if !outcome.failed.is_empty() {
        println!();
        println!("Failed lessons: {}", outcome.failed.join(", "));
    }
    if !outcome.skipped.is_empty() {
        println!("Skipped lessons: {}", outcome.skipped.join(", "));
    }

    Ok(ExitCode::SUCCESS)
}

/// Single-lesson mode. The exit code reflects the document's outcome.
async fn run_single(
    config: &ForgeConfig,
    agent: &CliAgentClient,
    validator: &CliValidator,
    spec: &Path,
    output_dir: &Path,
) -> Result<ExitCode> {
    anyhow::ensure!(spec.exists(), "{} not found", spec.display());

    let curriculum = discover_curriculum(spec).unwrap_or_else(|| {
        warn!(
            spec = %spec.display(),
            "curriculum.json not found near spec, proceeding without course context"
        );
        PathBuf::new()
    });

    let runner = LessonRunner::load(config, agent, validator)?;
    let request = GenerationRequest::new(
        spec.to_path_buf(),
        curriculum,
        output_dir,
        &config.artifact_extension,
    );
    let outcome = runner.run(&request).await;

    match outcome {
        DocumentOutcome::Passed { attempts } => {
            println!(
                "Lesson written to {} (validated on attempt {attempts})",
                request.output_file.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        DocumentOutcome::Exhausted { attempts } => {
            println!("Lesson failed validation after {attempts} attempts");
            Ok(ExitCode::FAILURE)
        }
        DocumentOutcome::AgentFailed => {
            println!("Agent failed to generate the lesson");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Probe for curriculum.json beside the spec's module directory, then
/// beside the spec itself.
fn discover_curriculum(spec: &Path) -> Option<PathBuf> {
    let candidates = [
        spec.parent()?.parent().map(|p| p.join("curriculum.json")),
        spec.parent().map(|p| p.join("curriculum.json")),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| candidate.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_curriculum_prefers_grandparent() {
        let dir = tempfile::tempdir().unwrap();
        let module = dir.path().join("module_01");
        std::fs::create_dir_all(&module).unwrap();
        let spec = module.join("lesson_01_01.md");
        std::fs::write(&spec, "# spec").unwrap();

        assert_eq!(discover_curriculum(&spec), None);

        std::fs::write(module.join("curriculum.json"), "{}").unwrap();
        assert_eq!(
            discover_curriculum(&spec),
            Some(module.join("curriculum.json"))
        );

        std::fs::write(dir.path().join("curriculum.json"), "{}").unwrap();
        assert_eq!(
            discover_curriculum(&spec),
            Some(dir.path().join("curriculum.json"))
        );
    }
}
