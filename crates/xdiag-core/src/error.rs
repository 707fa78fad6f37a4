//! Error types for xdiag-core

use std::path::PathBuf;

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Writing the sample artifact failed
    #[error("artifact error at {}: {source}", path.display())]
    Artifact {
        /// File or directory being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
