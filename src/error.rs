use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised by the dataset tools and the training launcher.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON ({}): {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid device selector {0:?}: expected 'cpu' or comma-separated device indices")]
    InvalidDevice(String),

    #[error("Invalid value {value:?} in environment variable {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} {mode} exited with {status}")]
    Backend {
        program: String,
        mode: &'static str,
        status: ExitStatus,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
