//! Configuration - `bookforge.toml`
//!
//! Lists the books a `build` assembles. The file is found by walking up
//! from the current directory unless a path is given; relative paths inside
//! it resolve against the directory containing the file.
//!
//! ```toml
//! jobs = 8
//!
//! [[book]]
//! name = "sway"
//! src = "sway/docs/book/src"
//! out = "dist/sway"
//! include_root = "sway"
//! summary_only = true
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::book::BookSpec;
use crate::core::error::ConfigError;
use crate::include::rewriter::IncludeBase;

pub const CONFIG_FILENAME: &str = "bookforge.toml";

fn default_true() -> bool {
    true
}

/// One `[[book]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookConfig {
    pub name: String,
    pub src: PathBuf,
    pub out: PathBuf,
    /// Fixed include root; includes resolve against each document's directory when unset
    #[serde(default)]
    pub include_root: Option<PathBuf>,
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub summary_only: bool,
    #[serde(default = "default_true")]
    pub clean: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Worker count; the CLI flag wins when both are set
    #[serde(default)]
    pub jobs: Option<usize>,
    #[serde(default, rename = "book")]
    pub books: Vec<BookConfig>,
    /// Directory containing the config file
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Config {
    /// Load from `path`, or discover `bookforge.toml` from the current directory
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let cwd = std::env::current_dir().map_err(|source| ConfigError::Read {
                    path: PathBuf::from("."),
                    source,
                })?;
                Self::discover_from(&cwd).ok_or(ConfigError::NotFound(cwd.join(CONFIG_FILENAME)))?
            }
        };
        Self::load_from_file(&path)
    }

    /// Search `start` and its parents for the config file
    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        config.validate()?;

        debug!(path = %path.display(), books = config.books.len(), "loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.books.is_empty() {
            return Err(ConfigError::Invalid("config defines no [[book]] entries".into()));
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::Invalid("jobs must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for book in &self.books {
            if !seen.insert(book.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate book name '{}'",
                    book.name
                )));
            }
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Book specs with resolved paths, restricted to `only` when non-empty
    pub fn book_specs(&self, only: &[String]) -> Result<Vec<BookSpec>, ConfigError> {
        let unknown: Vec<&str> = only
            .iter()
            .filter(|name| !self.books.iter().any(|b| &b.name == *name))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "unknown book(s): {}",
                unknown.join(", ")
            )));
        }

        Ok(self
            .books
            .iter()
            .filter(|b| only.is_empty() || only.contains(&b.name))
            .map(|b| BookSpec {
                name: b.name.clone(),
                src: self.resolve(&b.src),
                out: self.resolve(&b.out),
                include_base: match &b.include_root {
                    Some(root) => IncludeBase::Root(self.resolve(root)),
                    None => IncludeBase::DocumentDir,
                },
                manifest: b.manifest.as_deref().map(|m| self.resolve(m)),
                title: b.title.clone(),
                authors: b.authors.clone(),
                summary_only: b.summary_only,
                clean: b.clean,
            })
            .collect())
    }
}
