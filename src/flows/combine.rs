//! Combined docs flow - concatenate generated books into one markdown file

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::core::file_reader::read_text;
use crate::core::model::{Kind, Report, ReportItem, Status};
use crate::core::paths::{is_hidden, is_markdown, is_summary, make_relative};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::hash_bytes;

pub const COMBINED_TITLE: &str = "# Combined Documentation\n\n";

/// Directories under the books root that are never books
const SKIPPED_DIRS: [&str; 1] = ["node_modules"];

/// Book directories under `books_dir`, sorted by name
pub fn book_dirs(books_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut books = Vec::new();
    let entries = fs::read_dir(books_dir)
        .with_context(|| format!("cannot read books directory {}", books_dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() || is_hidden(&path) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if SKIPPED_DIRS.contains(&name.as_str()) {
            continue;
        }
        books.push((name, path));
    }

    books.sort();
    Ok(books)
}

/// Markdown files of one book except its summary, sorted
fn book_pages(book: &Path) -> Vec<PathBuf> {
    WalkDir::new(book)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_markdown(p) && !is_summary(p))
        .collect()
}

/// Build the combined document and a report of the pages it contains
pub fn combine(books_dir: &Path) -> Result<(String, Report)> {
    let mut combined = String::from(COMBINED_TITLE);
    let mut report = Report::new();

    for (name, dir) in book_dirs(books_dir)? {
        info!(book = %name, "combining book");
        combined.push_str(&format!("## Book: {}\n\n", name));

        for page in book_pages(&dir) {
            let relative = make_relative(&page, books_dir)
                .unwrap_or_else(|| page.display().to_string());
            let content = match read_text(&page) {
                Ok(c) => c,
                Err(err) => {
                    warn!(path = %relative, error = %err, "skipping unreadable page");
                    report.push(
                        ReportItem::failed(Kind::Markdown, relative, "READ_FAILED", err.to_string())
                            .with_book(name.as_str()),
                    );
                    continue;
                }
            };

            combined.push_str(&format!("### File: {}\n\n{}\n\n---\n\n", relative, content));
            report.push(
                ReportItem::new(Kind::Markdown, relative, Status::Copied).with_book(name.as_str()),
            );
        }
    }

    Ok((combined, report))
}

/// Run the combine command
pub fn run_combine(books_dir: &Path, out: &Path, config: RenderConfig) -> Result<()> {
    let (combined, mut report) = combine(books_dir)?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    fs::write(out, &combined).with_context(|| format!("cannot write {}", out.display()))?;
    info!(path = %out.display(), "combined documentation written");

    report.sort();
    report.push(
        ReportItem::new(Kind::Combined, out.display().to_string(), Status::Written)
            .with_hash(hash_bytes(combined.as_bytes())),
    );

    let renderer = Renderer::with_config(config);
    renderer.render_to(&report, std::io::stdout().lock())?;

    Ok(())
}
