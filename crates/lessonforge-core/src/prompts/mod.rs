//! Prompt builders for the generation agent.
//!
//! Three pure, stateless functions: the system/persona prompt, the initial
//! generation prompt, and the error-driven fix prompt. Identical inputs
//! produce identical output — no hidden state.

mod fix;
mod generation;
mod system;

pub use fix::build_fix_prompt;
pub use generation::build_generation_prompt;
pub use system::build_system_prompt;

/// Derive a document identifier from a file stem.
///
/// Identifiers may contain only letters, digits, and hyphens, so
/// underscores are transliterated to hyphens.
pub fn document_id_from_stem(stem: &str) -> String {
    stem.replace('_', "-")
}
