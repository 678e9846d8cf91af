//! Error types for log merging and results aggregation.
//!
//! Every failure is reported once, for the whole operation, and names the
//! file and the step that failed. Whether a failure is fatal is up to the
//! caller.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a filesystem failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoKind {
    NotFound,
    PermissionDenied,
    Other,
}

impl From<io::ErrorKind> for IoKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => IoKind::NotFound,
            io::ErrorKind::PermissionDenied => IoKind::PermissionDenied,
            _ => IoKind::Other,
        }
    }
}

impl fmt::Display for IoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoKind::NotFound => write!(f, "not found"),
            IoKind::PermissionDenied => write!(f, "permission denied"),
            IoKind::Other => write!(f, "I/O error"),
        }
    }
}

/// Failure while building or serializing the results document.
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("individual '{individual}' has {found} scores but there are {expected} objectives")]
    ScoreLength {
        individual: String,
        expected: usize,
        found: usize,
    },

    #[error("individual '{individual}' has a non-finite score ({value}) for objective #{index}")]
    NonFinite {
        individual: String,
        index: usize,
        value: f64,
    },

    #[error("individual name '{0}' appears more than once in the population")]
    DuplicateName(String),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),
}

/// Terminal error of a merge or aggregation.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("failed to {step} '{}': {kind} ({source})", .path.display())]
    Io {
        step: &'static str,
        path: PathBuf,
        kind: IoKind,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl CollectError {
    /// Wraps an I/O error with the step and path it happened on.
    pub fn io(step: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        CollectError::Io {
            step,
            path: path.into(),
            kind: source.kind().into(),
            source,
        }
    }

    /// Returns the I/O classification, if this is an I/O failure.
    pub fn io_kind(&self) -> Option<IoKind> {
        match self {
            CollectError::Io { kind, .. } => Some(*kind),
            CollectError::Serialization(_) => None,
        }
    }
}

/// Result type alias using CollectError
pub type Result<T> = std::result::Result<T, CollectError>;
