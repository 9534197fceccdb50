//! Error types for the agent build pipeline.
//!
//! Every failure names the resource or marker that caused it, so a caller
//! can tell "config key marker missing" apart from "signature marker
//! missing" without parsing strings.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::markers::Marker;

/// Coarse classification of a [`BuildError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Template, deployment record, builder, core file or marker absent.
    NotFound,
    /// Filesystem, archive or storage transfer failure.
    IoFailure,
    /// A secret needed to build a marker payload is unavailable.
    CryptoInputMissing,
    /// Inputs were present but unusable (wrong length, ambiguous marker).
    InvalidInput,
}

/// Errors raised while building an agent.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Builder for {0} not found")]
    BuilderNotFound(String),

    #[error("Core for {0} not found")]
    TemplateNotFound(String),

    #[error("Factory {0} not found")]
    FactoryNotFound(String),

    #[error("Core file {0} not found in the template")]
    CoreFileMissing(String),

    #[error("File name {0} does not stay inside the workspace")]
    UnsafeFileName(String),

    #[error("{0} marker not found")]
    MarkerNotFound(Marker),

    #[error("{0} marker found {1} times, expected exactly once")]
    MarkerAmbiguous(Marker, usize),

    #[error("{marker} payload is {actual} bytes but the marker is {expected} bytes")]
    PayloadLength {
        marker: Marker,
        expected: usize,
        actual: usize,
    },

    #[error("Secret for the {0} marker is missing")]
    CryptoInputMissing(Marker),

    #[error("Factory {0} has no configuration")]
    ConfigMissing(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid core archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: &'static str, message: String },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl BuildError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::BuilderNotFound(_)
            | BuildError::TemplateNotFound(_)
            | BuildError::FactoryNotFound(_)
            | BuildError::CoreFileMissing(_)
            | BuildError::MarkerNotFound(_)
            | BuildError::ConfigMissing(_) => ErrorKind::NotFound,
            BuildError::CryptoInputMissing(_) => ErrorKind::CryptoInputMissing,
            BuildError::MarkerAmbiguous(..)
            | BuildError::PayloadLength { .. }
            | BuildError::UnsafeFileName(_) => ErrorKind::InvalidInput,
            BuildError::Io { .. }
            | BuildError::Archive(_)
            | BuildError::Stage { .. }
            | BuildError::Store(_) => ErrorKind::IoFailure,
        }
    }

    /// Wrap an I/O error with the path it concerns.
    pub fn io(action: &str, path: &Path, source: io::Error) -> Self {
        BuildError::Io {
            context: format!("Failed to {} {}", action, path.display()),
            source,
        }
    }

    /// Failure inside a platform stage.
    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        BuildError::Stage {
            stage,
            message: message.into(),
        }
    }
}

/// Result alias for the build core.
pub type Result<T, E = BuildError> = std::result::Result<T, E>;

/// Extension for attaching path context to `io::Result`.
pub trait IoContext<T> {
    fn with_path(self, action: &str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn with_path(self, action: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| BuildError::io(action, &path.into(), e))
    }
}
