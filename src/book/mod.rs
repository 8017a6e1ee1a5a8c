//! Book module - Assemble self-contained mdBook books
//!
//! - `assemble`: copy a source tree into an output book with includes resolved
//! - `frontmatter`: YAML front matter of source chapters
//! - `manifest`: copy or synthesize `book.toml`
//! - `summary`: read or synthesize `SUMMARY.md`
//! - `pool`: bounded worker pool used for per-file work

pub mod assemble;
pub mod frontmatter;
pub mod manifest;
pub mod pool;
pub mod summary;

use std::path::PathBuf;

use crate::include::rewriter::IncludeBase;

/// Everything needed to assemble one book
#[derive(Debug, Clone)]
pub struct BookSpec {
    pub name: String,
    /// Markdown source tree (the book's `src/`)
    pub src: PathBuf,
    /// Output book root; markdown lands in `<out>/src`
    pub out: PathBuf,
    pub include_base: IncludeBase,
    /// Explicit `book.toml` to copy
    pub manifest: Option<PathBuf>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    /// Only process chapters linked from SUMMARY.md
    pub summary_only: bool,
    /// Empty `<out>/src` before writing
    pub clean: bool,
}

impl BookSpec {
    pub fn new(name: impl Into<String>, src: impl Into<PathBuf>, out: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            src: src.into(),
            out: out.into(),
            include_base: IncludeBase::default(),
            manifest: None,
            title: None,
            authors: Vec::new(),
            summary_only: false,
            clean: true,
        }
    }

    /// Book title, defaulting to the book name
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Directory markdown is written to
    pub fn out_src(&self) -> PathBuf {
        self.out.join("src")
    }
}
