//! book.toml handling

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::book::BookSpec;
use crate::core::error::BookError;
use crate::core::model::{Kind, ReportItem, Status};

pub const MANIFEST_NAME: &str = "book.toml";

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    book: BookSection<'a>,
}

#[derive(Debug, Serialize)]
struct BookSection<'a> {
    title: &'a str,
    authors: &'a [String],
    language: &'a str,
    multilingual: bool,
    src: &'a str,
}

/// Default manifest for a book without one
pub fn default_manifest(title: &str, authors: &[String]) -> Result<String, toml::ser::Error> {
    toml::to_string(&Manifest {
        book: BookSection {
            title,
            authors,
            language: "en",
            multilingual: false,
            src: "src",
        },
    })
}

/// Manifest to copy: the configured one, else `book.toml` next to `src`
fn manifest_source(spec: &BookSpec) -> Option<PathBuf> {
    if let Some(path) = &spec.manifest {
        if path.is_file() {
            return Some(path.clone());
        }
        warn!(
            book = %spec.name,
            path = %path.display(),
            "configured manifest not found, generating one"
        );
        return None;
    }

    spec.src
        .parent()
        .map(|parent| parent.join(MANIFEST_NAME))
        .filter(|path| path.is_file())
}

/// Copy or synthesize `<out>/book.toml`
pub fn write_manifest(spec: &BookSpec) -> Result<ReportItem, BookError> {
    let target = spec.out.join(MANIFEST_NAME);
    let output_err = |source| BookError::Output {
        path: target.clone(),
        source,
    };

    let status = match manifest_source(spec) {
        Some(source) if same_file(&source, &target) => Status::Unchanged,
        Some(source) => {
            fs::copy(&source, &target).map_err(output_err)?;
            info!(book = %spec.name, from = %source.display(), "copied book.toml");
            Status::Copied
        }
        None => {
            let manifest = default_manifest(spec.title(), &spec.authors)?;
            fs::write(&target, manifest).map_err(output_err)?;
            info!(book = %spec.name, "generated book.toml");
            Status::Generated
        }
    };

    Ok(ReportItem::new(Kind::Manifest, MANIFEST_NAME, status))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
