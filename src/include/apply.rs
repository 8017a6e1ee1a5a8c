//! In-place include processing
//!
//! Rewrites the directives of one markdown file, or of every markdown file
//! under a directory, writing back only files whose content changed.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::book::pool::WorkerPool;
use crate::cache::source::SourceCache;
use crate::core::file_reader::read_text;
use crate::core::model::{Kind, Report, ReportItem, SourceDocument, Status};
use crate::core::paths::{is_markdown, normalize_path};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::scan::{scan_files, ScanOptions};
use crate::core::util::hash_bytes;
use crate::include::rewriter::{IncludeBase, RewriteOutcome, Rewriter};

/// Options for the `include` command
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub base: IncludeBase,
    pub dry_run: bool,
    pub jobs: usize,
}

/// Markdown files targeted by `path`, with their report path
fn collect_targets(path: &Path) -> Result<Vec<(PathBuf, String)>> {
    let metadata =
        fs::metadata(path).with_context(|| format!("cannot access {}", path.display()))?;

    if metadata.is_file() {
        let name = path
            .file_name()
            .map(|n| normalize_path(Path::new(n)))
            .unwrap_or_else(|| normalize_path(path));
        return Ok(vec![(path.to_path_buf(), name)]);
    }

    Ok(scan_files(path, &ScanOptions::default())
        .into_iter()
        .filter(|f| is_markdown(&f.path))
        .map(|f| (f.path, f.relative))
        .collect())
}

/// A file rewritten in memory, not yet written back
enum Planned {
    Done(ReportItem),
    Changed {
        path: PathBuf,
        relative: String,
        outcome: RewriteOutcome,
    },
}

/// Resolve the includes of one file without touching it on disk
fn plan_file(rewriter: &Rewriter, path: &Path, relative: &str) -> Planned {
    let text = match read_text(path) {
        Ok(t) => t,
        Err(err) => {
            return Planned::Done(ReportItem::failed(
                Kind::Markdown,
                relative,
                "READ_FAILED",
                err.to_string(),
            ))
        }
    };

    let outcome = rewriter.rewrite(&SourceDocument::new(path, text.as_str()));
    if outcome.text == text {
        debug!(path = relative, "unchanged");
        return Planned::Done(
            ReportItem::new(Kind::Markdown, relative, Status::Unchanged)
                .with_includes(outcome.stats)
                .with_issues(outcome.issues),
        );
    }

    Planned::Changed {
        path: path.to_path_buf(),
        relative: relative.to_string(),
        outcome,
    }
}

fn commit(planned: Planned, dry_run: bool) -> ReportItem {
    let (path, relative, outcome) = match planned {
        Planned::Done(item) => return item,
        Planned::Changed {
            path,
            relative,
            outcome,
        } => (path, relative, outcome),
    };

    let item = |status| {
        ReportItem::new(Kind::Markdown, relative.as_str(), status)
            .with_includes(outcome.stats)
            .with_issues(outcome.issues.clone())
    };
    if dry_run {
        return item(Status::Pending);
    }

    match fs::write(&path, &outcome.text) {
        Ok(()) => {
            info!(path = %relative, "processed includes");
            item(Status::Written).with_hash(hash_bytes(outcome.text.as_bytes()))
        }
        Err(err) => {
            ReportItem::failed(Kind::Markdown, relative.as_str(), "WRITE_FAILED", err.to_string())
                .with_includes(outcome.stats)
        }
    }
}

/// Rewrite one file in place
pub fn apply_file(rewriter: &Rewriter, path: &Path, relative: &str, dry_run: bool) -> ReportItem {
    commit(plan_file(rewriter, path, relative), dry_run)
}

/// Process includes in place for a file or directory.
///
/// Every target is rewritten before any is written back, so documents that
/// include each other always see the original text.
pub fn apply_includes(path: &Path, options: &ApplyOptions) -> Result<Report> {
    let targets = collect_targets(path)?;
    let pool = WorkerPool::new(options.jobs)?;
    let rewriter = Rewriter::new(options.base.clone(), Arc::new(SourceCache::new()));

    let planned = pool.map(targets, |(file, relative)| {
        plan_file(&rewriter, &file, &relative)
    });
    let items = pool.map(planned, |planned| commit(planned, options.dry_run));

    let mut report = Report::new();
    report.extend(items);
    report.sort();
    Ok(report)
}

/// Run the include command
pub fn run_include(path: &Path, options: &ApplyOptions, config: RenderConfig) -> Result<()> {
    let report = apply_includes(path, options)?;

    let renderer = Renderer::with_config(config);
    renderer.render_to(&report, std::io::stdout().lock())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("docs/nested")).unwrap();
        fs::write(
            temp.path().join("docs/code.rs"),
            "// ANCHOR: hi\nfn hi() {}\n// ANCHOR_END: hi\n",
        )
        .unwrap();
        fs::write(temp.path().join("docs/a.md"), "# A\n{{#include code.rs:hi}}\n").unwrap();
        fs::write(temp.path().join("docs/plain.md"), "# Plain\n").unwrap();
        fs::write(
            temp.path().join("docs/nested/b.md"),
            "{{#include ../code.rs}}\n",
        )
        .unwrap();
        temp
    }

    #[test]
    fn test_apply_directory_in_place() {
        let temp = setup();
        let docs = temp.path().join("docs");

        let report = apply_includes(&docs, &ApplyOptions::default()).unwrap();
        let statuses: Vec<_> = report
            .items
            .iter()
            .map(|i| (i.path.as_str(), i.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("a.md", Status::Written),
                ("nested/b.md", Status::Written),
                ("plain.md", Status::Unchanged),
            ]
        );

        let a = fs::read_to_string(docs.join("a.md")).unwrap();
        assert_eq!(a, "# A\n```rust\nfn hi() {}\n```\n");
        let b = fs::read_to_string(docs.join("nested/b.md")).unwrap();
        assert_eq!(b, "```rust\nfn hi() {}\n```\n");

        // Second run has nothing left to do
        let again = apply_includes(&docs, &ApplyOptions::default()).unwrap();
        assert!(again.items.iter().all(|i| i.status == Status::Unchanged));
    }

    #[test]
    fn test_apply_dry_run_leaves_files() {
        let temp = setup();
        let file = temp.path().join("docs/a.md");

        let options = ApplyOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = apply_includes(&file, &options).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.items[0].path, "a.md");
        assert_eq!(report.items[0].status, Status::Pending);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "# A\n{{#include code.rs:hi}}\n"
        );
    }

    #[test]
    fn test_apply_document_including_rewritten_document() {
        let temp = setup();
        let docs = temp.path().join("docs");
        fs::write(docs.join("partial.md"), "{{#include code.rs:hi}}\n").unwrap();
        for i in 0..8 {
            fs::write(
                docs.join(format!("user{}.md", i)),
                "# User\n{{#include partial.md}}\n",
            )
            .unwrap();
        }

        let options = ApplyOptions {
            jobs: 4,
            ..Default::default()
        };
        let report = apply_includes(&docs, &options).unwrap();
        assert!(report.items.iter().all(|i| i.status != Status::Failed));

        let partial = fs::read_to_string(docs.join("partial.md")).unwrap();
        assert_eq!(partial, "```rust\nfn hi() {}\n```\n");
        for i in 0..8 {
            let user = fs::read_to_string(docs.join(format!("user{}.md", i))).unwrap();
            assert!(user.contains("```rust\nfn hi() {}\n```"), "user{}.md: {:?}", i, user);
            assert!(!user.contains("{{#include"));
        }
    }

    #[test]
    fn test_apply_missing_path_errors() {
        let temp = tempdir().unwrap();
        assert!(apply_includes(&temp.path().join("nope"), &ApplyOptions::default()).is_err());
    }
}
