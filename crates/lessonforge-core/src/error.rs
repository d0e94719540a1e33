//! Domain-level error taxonomy for LessonForge.
//!
//! Only batch-wide structural problems live here. Failures local to one
//! document (agent hard failure, exhausted validation attempts) are values,
//! not errors — see [`crate::runner::DocumentOutcome`].

use std::path::PathBuf;

/// LessonForge domain errors.
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    #[error("curriculum manifest not readable: {path}")]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("curriculum manifest malformed: {path}: {source}")]
    ManifestMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("format guide not readable: {path}")]
    FormatGuideUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("agent invocation error: {0}")]
    Agent(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for LessonForge domain operations.
pub type Result<T> = std::result::Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_errors_name_the_path() {
        let err = ForgeError::ManifestUnreadable {
            path: PathBuf::from("/tmp/curriculum.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("curriculum.json"));

        let bad: serde_json::Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ForgeError::ManifestMalformed {
            path: PathBuf::from("/tmp/curriculum.json"),
            source: bad,
        };
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err: ForgeError = io.into();
        assert!(err.to_string().contains("disk on fire"));
    }
}
