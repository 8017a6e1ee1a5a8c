//! Book assembly
//!
//! Copies a source tree into `<out>/src`, rewriting include directives in
//! every markdown file on the worker pool and copying everything else
//! verbatim. Per-file failures are reported and do not stop the book.

use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::book::frontmatter::split_front_matter;
use crate::book::manifest::write_manifest;
use crate::book::pool::WorkerPool;
use crate::book::summary::{
    first_heading, retarget_mdx_links, summary_links, synthesize_summary, title_from_path,
    Chapter, ALWAYS_INCLUDED,
};
use crate::book::BookSpec;
use crate::cache::source::SourceCache;
use crate::core::error::BookError;
use crate::core::file_reader::read_text;
use crate::core::model::{Kind, Report, ReportItem, SourceDocument, Status};
use crate::core::paths::{book_relative, canonicalize_lenient, clean_path, is_markdown, is_mdx};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::scan::{scan_files, ScanOptions, ScannedFile};
use crate::core::util::hash_bytes;
use crate::include::rewriter::Rewriter;

const SUMMARY_NAME: &str = "SUMMARY.md";

enum Task {
    Markdown(ScannedFile),
    Asset(ScannedFile),
    /// `.mdx` source whose `.md` output name is taken by another source
    Conflict(ScannedFile),
}

/// Outcome of one task; `chapter` is set for written chapters
struct Processed {
    item: ReportItem,
    chapter: Option<Chapter>,
}

/// Assemble one book
pub fn assemble(
    spec: &BookSpec,
    pool: &WorkerPool,
    cache: Arc<SourceCache>,
) -> Result<Report, BookError> {
    let src = clean_path(&spec.src);
    let out = clean_path(&spec.out);
    if !src.is_dir() {
        return Err(BookError::MissingSource(spec.src.clone()));
    }

    let out_src = out.join("src");
    if canonicalize_lenient(&src).starts_with(canonicalize_lenient(&out_src)) {
        return Err(BookError::OutputOverlapsSource {
            src: spec.src.clone(),
            out: out_src,
        });
    }

    info!(book = %spec.name, src = %src.display(), out = %out.display(), "assembling book");
    prepare_output(&out_src, spec.clean)?;

    let files = scan_files(
        &src,
        &ScanOptions {
            exclude: vec![out.clone()],
            ..Default::default()
        },
    );

    let selected = if spec.summary_only {
        Some(summary_selection(&src)?)
    } else {
        None
    };

    let has_summary = files.iter().any(|f| is_root_summary(&f.relative));
    let plain_markdown: HashSet<String> = files
        .iter()
        .filter(|f| is_markdown(&f.path) && !is_mdx(&f.path))
        .map(|f| f.relative.clone())
        .collect();

    let tasks: Vec<Task> = files
        .into_iter()
        .filter_map(|file| {
            if !is_markdown(&file.path) {
                return Some(Task::Asset(file));
            }
            match &selected {
                Some(keep)
                    if !keep.contains(&file.relative)
                        && !keep.contains(&book_relative(&file.relative)) =>
                {
                    debug!(path = %file.relative, "not in SUMMARY.md, skipped");
                    None
                }
                _ if is_mdx(&file.path)
                    && plain_markdown.contains(&book_relative(&file.relative)) =>
                {
                    Some(Task::Conflict(file))
                }
                _ => Some(Task::Markdown(file)),
            }
        })
        .collect();

    let rewriter = Rewriter::new(spec.include_base.clone(), cache);
    let processed = pool.map(tasks, |task| match task {
        Task::Markdown(file) => process_markdown(&rewriter, &file, &out_src),
        Task::Asset(file) => process_asset(&file, &out_src),
        Task::Conflict(file) => conflict(&file),
    });

    let mut report = Report::new();
    let mut chapters = Vec::new();
    for p in processed {
        chapters.extend(p.chapter);
        report.push(p.item);
    }

    if !has_summary {
        report.push(write_summary(&out_src, &chapters));
    }
    report.push(write_manifest(spec)?);

    for item in &mut report.items {
        item.book = Some(spec.name.clone());
    }
    report.sort();

    let totals = report.totals();
    info!(
        book = %spec.name,
        files = totals.files,
        failed = totals.failed_files,
        includes = totals.includes.resolved,
        failed_includes = totals.includes.failed,
        "book assembled"
    );
    Ok(report)
}

fn is_root_summary(relative: &str) -> bool {
    relative.eq_ignore_ascii_case(SUMMARY_NAME)
}

fn prepare_output(out_src: &Path, clean: bool) -> Result<(), BookError> {
    let output_err = |source| BookError::Output {
        path: out_src.to_path_buf(),
        source,
    };

    if clean && out_src.exists() {
        fs::remove_dir_all(out_src).map_err(output_err)?;
    }
    fs::create_dir_all(out_src).map_err(output_err)
}

/// Relative paths processed in summary-only mode
fn summary_selection(src: &Path) -> Result<HashSet<String>, BookError> {
    let path = src.join(SUMMARY_NAME);
    let summary = read_text(&path).map_err(|source| BookError::Summary {
        path: path.clone(),
        source,
    })?;

    let mut keep: HashSet<String> = summary_links(&summary).into_iter().collect();
    keep.insert(SUMMARY_NAME.to_string());
    keep.extend(ALWAYS_INCLUDED.iter().map(|s| s.to_string()));
    Ok(keep)
}

/// Rewrite one document into the book. Front matter is dropped and `.mdx`
/// sources are written as `.md`.
fn process_markdown(rewriter: &Rewriter, file: &ScannedFile, out_src: &Path) -> Processed {
    let relative = book_relative(&file.relative);
    let kind = if is_root_summary(&file.relative) {
        Kind::Summary
    } else {
        Kind::Markdown
    };
    let failed = |code: &str, message: String| {
        error!(path = %file.relative, code, "{}", message);
        Processed {
            item: ReportItem::failed(kind, relative.as_str(), code, message),
            chapter: None,
        }
    };

    let text = match read_text(&file.path) {
        Ok(t) => t,
        Err(err) => return failed("READ_FAILED", err.to_string()),
    };
    let (front, body) = split_front_matter(&text);
    let body = match kind {
        Kind::Summary => retarget_mdx_links(body),
        _ => body.into(),
    };

    let outcome = rewriter.rewrite(&SourceDocument::new(&file.path, &*body));
    if let Err(err) = write_file(&out_src.join(&relative), outcome.text.as_bytes()) {
        return failed("WRITE_FAILED", err.to_string());
    }

    debug!(path = %relative, "wrote chapter");
    let chapter = match kind {
        Kind::Summary => None,
        _ => {
            let front = front.unwrap_or_default();
            let title = front
                .title
                .or_else(|| first_heading(&outcome.text))
                .unwrap_or_else(|| title_from_path(&relative));
            Some(Chapter::new(relative.as_str(), title).with_category(front.category))
        }
    };

    Processed {
        item: ReportItem::new(kind, relative.as_str(), Status::Written)
            .with_includes(outcome.stats)
            .with_hash(hash_bytes(outcome.text.as_bytes()))
            .with_issues(outcome.issues),
        chapter,
    }
}

fn conflict(file: &ScannedFile) -> Processed {
    let message = format!("{} is also a source file", book_relative(&file.relative));
    error!(path = %file.relative, "{}", message);
    Processed {
        item: ReportItem::failed(
            Kind::Markdown,
            file.relative.as_str(),
            "OUTPUT_CONFLICT",
            message,
        ),
        chapter: None,
    }
}

fn process_asset(file: &ScannedFile, out_src: &Path) -> Processed {
    let target = out_src.join(&file.relative);
    let result = target
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| fs::copy(&file.path, &target));

    let item = match result {
        Ok(_) => ReportItem::new(Kind::Asset, file.relative.as_str(), Status::Copied),
        Err(err) => {
            error!(path = %file.relative, error = %err, "asset copy failed");
            ReportItem::failed(Kind::Asset, file.relative.as_str(), "COPY_FAILED", err.to_string())
        }
    };
    Processed {
        item,
        chapter: None,
    }
}

fn write_summary(out_src: &Path, chapters: &[Chapter]) -> ReportItem {
    let summary = synthesize_summary(chapters);
    match write_file(&out_src.join(SUMMARY_NAME), summary.as_bytes()) {
        Ok(()) => {
            info!(chapters = chapters.len(), "generated SUMMARY.md");
            ReportItem::new(Kind::Summary, SUMMARY_NAME, Status::Generated)
                .with_hash(hash_bytes(summary.as_bytes()))
        }
        Err(err) => {
            ReportItem::failed(Kind::Summary, SUMMARY_NAME, "WRITE_FAILED", err.to_string())
        }
    }
}

fn write_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// Assemble several books, sharing one pool and one source cache.
///
/// A book that fails at the top level is logged and the remaining books
/// still run; the command fails afterwards.
pub fn run_books(specs: &[BookSpec], jobs: usize, config: RenderConfig) -> Result<()> {
    let pool = WorkerPool::new(jobs)?;
    let cache = Arc::new(SourceCache::new());
    debug!(workers = pool.workers(), books = specs.len(), "starting");

    let mut report = Report::new();
    let mut failed = Vec::new();
    for spec in specs {
        match assemble(spec, &pool, Arc::clone(&cache)) {
            Ok(book) => report.extend(book.items),
            Err(err) => {
                error!(book = %spec.name, error = %err, "book failed");
                failed.push(format!("{}: {}", spec.name, err));
            }
        }
    }

    let stats = cache.stats();
    debug!(hits = stats.hits, misses = stats.misses, "source cache");

    report.sort();
    let renderer = Renderer::with_config(config);
    renderer.render_to(&report, std::io::stdout().lock())?;

    if !failed.is_empty() {
        anyhow::bail!("{} of {} books failed: {}", failed.len(), specs.len(), failed.join("; "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    fn fixture() -> TempDir {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("book/src/guide")).unwrap();
        fs::create_dir_all(root.join("book/src/img")).unwrap();
        fs::create_dir_all(root.join("code")).unwrap();

        fs::write(
            root.join("code/main.sw"),
            "contract;\n// ANCHOR: abi\nabi Counter {}\n// ANCHOR_END: abi\n",
        )
        .unwrap();
        fs::write(root.join("book/src/README.md"), "# Welcome\n").unwrap();
        fs::write(
            root.join("book/src/guide/counter.md"),
            "# Counter\n\n{{#include ../../../code/main.sw:abi}}\n",
        )
        .unwrap();
        fs::write(
            root.join("book/src/guide/broken.md"),
            "{{#include ../../../code/missing.sw}}\n",
        )
        .unwrap();
        fs::write(root.join("book/src/img/logo.png"), [0x89, b'P', b'N', b'G', 0]).unwrap();
        temp
    }

    fn run(spec: &BookSpec) -> Result<Report, BookError> {
        let pool = WorkerPool::new(2).unwrap();
        assemble(spec, &pool, Arc::new(SourceCache::new()))
    }

    #[test]
    fn test_assemble_rewrites_and_copies() {
        let temp = fixture();
        let out = temp.path().join("out");
        let spec = BookSpec::new("counter", temp.path().join("book/src"), &out);

        let report = run(&spec).unwrap();

        assert_eq!(
            fs::read_to_string(out.join("src/guide/counter.md")).unwrap(),
            "# Counter\n\n```rust\nabi Counter {}\n```\n"
        );
        assert!(fs::read_to_string(out.join("src/guide/broken.md"))
            .unwrap()
            .starts_with("<!-- bookforge: include failed: ../../../code/missing.sw"));
        assert_eq!(
            fs::read(out.join("src/img/logo.png")).unwrap(),
            vec![0x89, b'P', b'N', b'G', 0]
        );

        let totals = report.totals();
        assert_eq!(totals.failed_files, 0);
        assert_eq!(totals.includes.resolved, 1);
        assert_eq!(totals.includes.failed, 1);
        assert!(report.items.iter().all(|i| i.book.as_deref() == Some("counter")));
    }

    #[test]
    fn test_assemble_synthesizes_summary_and_manifest() {
        let temp = fixture();
        let out = temp.path().join("out");
        let mut spec = BookSpec::new("counter", temp.path().join("book/src"), &out);
        spec.title = Some("Counter Book".to_string());

        let report = run(&spec).unwrap();

        assert_eq!(
            fs::read_to_string(out.join("src/SUMMARY.md")).unwrap(),
            "# Summary\n\n\
- [Welcome](README.md)\n\
- [Broken](guide/broken.md)\n\
- [Counter](guide/counter.md)\n"
        );
        let manifest = fs::read_to_string(out.join("book.toml")).unwrap();
        assert!(manifest.contains("title = \"Counter Book\""));

        let generated: Vec<_> = report
            .items
            .iter()
            .filter(|i| i.status == Status::Generated)
            .map(|i| i.path.as_str())
            .collect();
        assert_eq!(generated, vec!["SUMMARY.md", "book.toml"]);
    }

    #[test]
    fn test_assemble_summary_only() {
        let temp = fixture();
        fs::write(
            temp.path().join("book/src/SUMMARY.md"),
            "# Summary\n\n- [Counter](guide/counter.md)\n",
        )
        .unwrap();
        let out = temp.path().join("out");
        let mut spec = BookSpec::new("counter", temp.path().join("book/src"), &out);
        spec.summary_only = true;

        run(&spec).unwrap();

        assert!(out.join("src/guide/counter.md").exists());
        assert!(out.join("src/README.md").exists());
        assert!(!out.join("src/guide/broken.md").exists());
        assert_eq!(
            fs::read_to_string(out.join("src/SUMMARY.md")).unwrap(),
            "# Summary\n\n- [Counter](guide/counter.md)\n"
        );
    }

    #[test]
    fn test_summary_only_without_summary_fails() {
        let temp = fixture();
        let mut spec = BookSpec::new("x", temp.path().join("book/src"), temp.path().join("out"));
        spec.summary_only = true;
        assert!(matches!(run(&spec), Err(BookError::Summary { .. })));
    }

    #[test]
    fn test_output_containing_source_is_rejected() {
        let temp = fixture();
        let book = temp.path().join("book");
        let spec = BookSpec::new("counter", book.join("src"), &book);

        assert!(matches!(
            run(&spec),
            Err(BookError::OutputOverlapsSource { .. })
        ));
        assert!(book.join("src/README.md").exists());
        assert!(book.join("src/guide/counter.md").exists());

        let spec = BookSpec::new("counter", book.join("src/guide"), &book);
        assert!(matches!(
            run(&spec),
            Err(BookError::OutputOverlapsSource { .. })
        ));
        assert!(book.join("src/guide/counter.md").exists());
    }

    #[test]
    fn test_mdx_chapter_becomes_markdown() {
        let temp = fixture();
        fs::write(
            temp.path().join("book/src/guide/query.mdx"),
            "---\ntitle: Queries\ncategory: Reference\n---\n\n{{#include ../../../code/main.sw:abi}}\n",
        )
        .unwrap();
        let out = temp.path().join("out");
        let spec = BookSpec::new("counter", temp.path().join("book/src"), &out);

        let report = run(&spec).unwrap();

        assert!(!out.join("src/guide/query.mdx").exists());
        assert_eq!(
            fs::read_to_string(out.join("src/guide/query.md")).unwrap(),
            "```rust\nabi Counter {}\n```\n"
        );
        assert_eq!(
            fs::read_to_string(out.join("src/SUMMARY.md")).unwrap(),
            "# Summary\n\n\
- [Welcome](README.md)\n\
- [Broken](guide/broken.md)\n\
- [Counter](guide/counter.md)\n\
\n# Reference\n\n\
- [Queries](guide/query.md)\n"
        );

        let item = report
            .items
            .iter()
            .find(|i| i.path == "guide/query.md")
            .unwrap();
        assert_eq!(item.kind, Kind::Markdown);
        assert_eq!(item.includes.resolved, 1);
    }

    #[test]
    fn test_mdx_summary_links_are_retargeted() {
        let temp = fixture();
        fs::write(temp.path().join("book/src/guide/query.mdx"), "# Queries\n").unwrap();
        fs::write(
            temp.path().join("book/src/SUMMARY.md"),
            "# Summary\n\n- [Queries](guide/query.mdx)\n",
        )
        .unwrap();
        let out = temp.path().join("out");
        let mut spec = BookSpec::new("counter", temp.path().join("book/src"), &out);
        spec.summary_only = true;

        run(&spec).unwrap();

        assert_eq!(
            fs::read_to_string(out.join("src/SUMMARY.md")).unwrap(),
            "# Summary\n\n- [Queries](guide/query.md)\n"
        );
        assert!(out.join("src/guide/query.md").exists());
        assert!(!out.join("src/guide/counter.md").exists());
    }

    #[test]
    fn test_mdx_name_clash_is_reported() {
        let temp = fixture();
        fs::write(temp.path().join("book/src/README.mdx"), "# Other\n").unwrap();
        let out = temp.path().join("out");
        let spec = BookSpec::new("counter", temp.path().join("book/src"), &out);

        let report = run(&spec).unwrap();

        let clash = report
            .items
            .iter()
            .find(|i| i.path == "README.mdx")
            .unwrap();
        assert_eq!(clash.status, Status::Failed);
        assert_eq!(clash.issues[0].code, "OUTPUT_CONFLICT");
        assert_eq!(
            fs::read_to_string(out.join("src/README.md")).unwrap(),
            "# Welcome\n"
        );
    }

    #[test]
    fn test_missing_source_fails() {
        let temp = tempdir().unwrap();
        let spec = BookSpec::new("x", temp.path().join("nope"), temp.path().join("out"));
        assert!(matches!(run(&spec), Err(BookError::MissingSource(_))));
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let temp = fixture();
        let out = temp.path().join("out");
        fs::create_dir_all(out.join("src")).unwrap();
        fs::write(out.join("src/stale.md"), "old").unwrap();

        let mut spec = BookSpec::new("counter", temp.path().join("book/src"), &out);
        spec.clean = false;
        run(&spec).unwrap();
        assert!(out.join("src/stale.md").exists());

        spec.clean = true;
        run(&spec).unwrap();
        assert!(!out.join("src/stale.md").exists());
    }

    #[test]
    fn test_output_nested_in_source_is_not_rescanned() {
        let temp = fixture();
        let src = temp.path().join("book/src");
        let spec = BookSpec::new("counter", &src, src.join("_out"));

        run(&spec).unwrap();
        let report = run(&spec).unwrap();
        assert!(report.items.iter().all(|i| !i.path.starts_with("_out")));
    }
}
