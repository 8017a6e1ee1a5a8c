//! File scanning
//!
//! Uses the ignore crate for traversal: hidden entries are skipped and
//! ignore files are respected unless disabled.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::paths::make_relative;

/// Options for scanning a tree
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Include hidden files/directories
    pub hidden: bool,
    /// Respect .gitignore and other ignore files
    pub ignore: bool,
    /// Subtrees to leave out (e.g. an output dir nested in the source)
    pub exclude: Vec<PathBuf>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            hidden: false,
            ignore: true,
            exclude: Vec::new(),
        }
    }
}

/// A file found by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Full path on disk
    pub path: PathBuf,
    /// Path relative to the scan root, '/' separated
    pub relative: String,
}

/// Scan all files under `root`, sorted by relative path
pub fn scan_files(root: &Path, options: &ScanOptions) -> Vec<ScannedFile> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(!options.hidden)
        .git_ignore(options.ignore)
        .git_global(options.ignore)
        .git_exclude(options.ignore)
        .ignore(options.ignore);

    let exclude = options.exclude.clone();
    builder.filter_entry(move |entry| !exclude.iter().any(|ex| entry.path().starts_with(ex)));

    let mut files = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        let relative = match make_relative(path, root) {
            Some(r) => r,
            None => continue,
        };

        files.push(ScannedFile {
            path: path.to_path_buf(),
            relative,
        });
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    files
}
