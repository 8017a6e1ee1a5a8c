//! Unified file reading strategies
//!
//! Provides consistent handling for:
//! - Non-UTF-8 files
//! - Oversized files
//! - Binary files
//!
//! Included sources are never truncated: a partial snippet spliced into a
//! book is worse than a visible failure.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::core::error::ReadError;

/// Default maximum file size in bytes (16 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Number of leading bytes inspected for null bytes
const BINARY_SNIFF_LEN: usize = 8192;

/// Strategy for handling non-UTF-8 content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingStrategy {
    /// Reject non-UTF-8 files
    Strict,
    /// Use lossy conversion (replace invalid bytes with U+FFFD)
    #[default]
    Lossy,
}

/// Configuration for file reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadPolicy {
    /// Maximum file size to read (bytes)
    pub max_file_size: u64,

    /// How to handle non-UTF-8 content
    pub encoding: EncodingStrategy,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            encoding: EncodingStrategy::Lossy,
        }
    }
}

/// Read a text file with the given policy
pub fn read_text_with_policy(path: &Path, policy: &ReadPolicy) -> Result<String, ReadError> {
    let metadata = fs::metadata(path)?;
    let size = metadata.len();
    if size > policy.max_file_size {
        return Err(ReadError::TooLarge {
            size,
            limit: policy.max_file_size,
        });
    }

    let mut bytes = Vec::with_capacity(size as usize);
    fs::File::open(path)?.read_to_end(&mut bytes)?;

    let check_len = std::cmp::min(BINARY_SNIFF_LEN, bytes.len());
    if bytes[..check_len].contains(&0) {
        return Err(ReadError::Binary);
    }

    match String::from_utf8(bytes) {
        Ok(content) => Ok(content),
        Err(err) => match policy.encoding {
            EncodingStrategy::Strict => Err(ReadError::InvalidUtf8),
            EncodingStrategy::Lossy => {
                warn!(path = %path.display(), "lossy UTF-8 conversion applied");
                Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
            }
        },
    }
}

/// Convenience function with default policy
pub fn read_text(path: &Path) -> Result<String, ReadError> {
    read_text_with_policy(path, &ReadPolicy::default())
}
