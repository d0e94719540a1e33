//! LessonForge core: agent-driven lesson generation with externally
//! enforced validation.
//!
//! An agent CLI writes interactive lesson documents from markdown specs;
//! an external validator CLI decides whether each document is acceptable.
//! The [`runner::LessonRunner`] drives one document through a bounded
//! generate/validate/fix loop, and the [`pipeline::BatchPipeline`] walks a
//! whole curriculum manifest, bucketing lessons into succeeded, failed,
//! and skipped, and writing an enriched manifest at the end.
//!
//! The agent and validator sit behind traits ([`agent::AgentClient`],
//! [`validator::LessonValidator`]) so the loops are testable with the
//! scripted fakes in [`fakes`].

pub mod agent;
pub mod config;
pub mod error;
pub mod fakes;
pub mod manifest;
pub mod pipeline;
pub mod prompts;
pub mod runner;
pub mod telemetry;
pub mod validator;

pub use agent::{AgentClient, AgentInvocation, AgentOutcome, CliAgentClient};
pub use config::{ForgeConfig, ValidatorConfig};
pub use error::{ForgeError, Result};
pub use manifest::{CurriculumManifest, LessonEntry, ModuleEntry, ENRICHED_MANIFEST_FILENAME};
pub use pipeline::{BatchOutcome, BatchPipeline};
pub use runner::{DocumentOutcome, GenerationRequest, LessonRunner};
pub use validator::{CliValidator, LessonValidator, ValidationOutcome};
