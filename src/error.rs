//! Defines the error types surfaced at the crate's I/O and configuration edges.
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Failures that prevent a verification run from starting.
///
/// Data-quality problems inside a filing are never reported here; they
/// become `CheckResult`s instead.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl VerifyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VerifyError::Io { path: path.into(), source }
    }

    pub(crate) fn json(origin: impl Into<String>, source: serde_json::Error) -> Self {
        VerifyError::Json { origin: origin.into(), source }
    }
}
