//! Read-through cache of included source files
//!
//! Shared by every worker of a run. Entries are never invalidated; a run is
//! a single pass over trees that are not modified underneath it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

use crate::core::error::ReadError;
use crate::core::file_reader::{read_text_with_policy, ReadPolicy};

/// Cache hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Source text keyed by cleaned path
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: RwLock<HashMap<PathBuf, Arc<str>>>,
    policy: ReadPolicy,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the file's text, reading it on first use.
    ///
    /// Failed reads are not cached.
    pub fn get(&self, path: &Path) -> Result<Arc<str>, ReadError> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(text) = entries.get(path) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(text));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(path = %path.display(), "source cache miss");
        let text: Arc<str> = Arc::from(read_text_with_policy(path, &self.policy)?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another worker may have raced us here; keep the first entry
        let text = entries
            .entry(path.to_path_buf())
            .or_insert(text)
            .clone();
        Ok(text)
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: entries.len(),
        }
    }
}
