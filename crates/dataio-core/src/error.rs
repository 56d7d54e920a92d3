use std::path::PathBuf;

use thiserror::Error;

use crate::node::NodeKind;

pub type Result<T> = std::result::Result<T, DataError>;

/// Distinguished failure reasons behind the collapsed `None`/`false`/default
/// results of the main API. Only the `try_*` entry points return these.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("path not found: '{0}'")]
    PathNotFound(String),

    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("no backend available for {0}")]
    BackendUnavailable(String),

    #[error("path too long: {len} bytes (max {max})")]
    PathTooLong { len: usize, max: usize },

    #[error("value too long: {len} bytes (max {max})")]
    ValueTooLong { len: usize, max: usize },

    #[error("{backend} parse error: {message}")]
    Parse {
        backend: &'static str,
        message: String,
    },

    #[error("{backend} serialize error: {message}")]
    Serialize {
        backend: &'static str,
        message: String,
    },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DataError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the path/value length failures.
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(
            self,
            DataError::PathTooLong { .. } | DataError::ValueTooLong { .. }
        )
    }
}
