//! Domain-specific errors for package builds.
//!
//! Every variant is fatal to the current package's build. The engine
//! never retries or suppresses; errors propagate to the orchestrator
//! with full diagnostic context.

use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy for the build adapter layer.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A wildcard lookup matched zero or more than one path. Carries
    /// the verbatim match list so operators can see what was found.
    #[error("expected exactly one match for '{pattern}', found {count}: {matches:?}")]
    AmbiguousOrMissingPath {
        /// The glob pattern that was searched.
        pattern: String,
        /// Number of filesystem matches (never 1).
        count: usize,
        /// Every path that matched, unsorted, as returned by the glob.
        matches: Vec<PathBuf>,
    },

    /// A required environment value or dependency path is absent.
    #[error("missing required dependency value: {0}")]
    MissingRequiredDependency(String),

    /// The external configure/build tool failed: non-zero exit, or an
    /// error marker in its output even when the exit code was zero.
    #[error("external tool failed: {0}")]
    ExternalTool(String),

    /// Post-install verification found absent files or directories.
    #[error("missing artifacts after install: {}", missing.join(", "))]
    MissingArtifact {
        /// Every expected path that does not exist, install-relative.
        missing: Vec<String>,
    },

    /// The declarative package spec could not be read or parsed.
    #[error("invalid package spec: {0}")]
    Spec(String),

    /// A glob pattern was syntactically invalid.
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Parse error from the glob engine.
        source: glob::PatternError,
    },

    /// Filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
