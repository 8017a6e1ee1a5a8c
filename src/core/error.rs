//! Typed errors for the library layers
//!
//! Command handlers wrap these in `anyhow` with context; nothing below the
//! command layer exits the process.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read a text file
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("file not found")]
    NotFound,

    #[error("file appears to be binary (contains null bytes)")]
    Binary,

    #[error("file exceeds size limit ({size} > {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("file contains invalid UTF-8")]
    InvalidUtf8,

    #[error(transparent)]
    Io(std::io::Error),
}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ReadError::NotFound,
            _ => ReadError::Io(err),
        }
    }
}

/// Failure to resolve a single include directive.
///
/// Never propagated past the document being rewritten: the rewriter turns it
/// into a placeholder and keeps going.
#[derive(Debug, Error)]
pub enum IncludeError {
    #[error("{source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    #[error("include cycle through {}", .0.display())]
    Cycle(PathBuf),

    #[error("include depth limit ({0}) exceeded")]
    DepthExceeded(usize),
}

impl IncludeError {
    /// Stable code used in reports
    pub fn code(&self) -> &'static str {
        match self {
            IncludeError::Read {
                source: ReadError::NotFound,
                ..
            } => "INCLUDE_NOT_FOUND",
            IncludeError::Read { .. } => "INCLUDE_READ_FAILED",
            IncludeError::Cycle(_) => "INCLUDE_CYCLE",
            IncludeError::DepthExceeded(_) => "INCLUDE_DEPTH",
        }
    }
}

/// Top-level failure while assembling a book. These abort the book.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("source directory not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("cannot read summary file {}", .path.display())]
    Summary {
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    #[error(
        "output directory {} would overwrite source directory {}",
        .out.display(),
        .src.display()
    )]
    OutputOverlapsSource { src: PathBuf, out: PathBuf },

    #[error("cannot prepare output directory {}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize book manifest")]
    Manifest(#[from] toml::ser::Error),

    #[error("cannot build worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Failure to load `bookforge.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}
