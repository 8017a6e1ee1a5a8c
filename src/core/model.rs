//! Run report model
//!
//! Every command maps what it did to a `Report` of `ReportItem`s before
//! rendering output.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A markdown document read from disk. Immutable once read.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub text: String,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// The kind of file a report item describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Markdown,
    Asset,
    Manifest,
    Summary,
    Combined,
    Lint,
}

/// What happened to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Rewritten output was written
    Written,
    /// Content unchanged, nothing written
    Unchanged,
    /// Dry run: content would change
    Pending,
    /// Copied verbatim
    Copied,
    /// Synthesized because the source had none
    Generated,
    /// Processing failed for this file
    Failed,
    /// Lint finding
    Reported,
}

/// Include counters for one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeStats {
    /// Directives replaced with content
    pub resolved: u32,
    /// Directives replaced with a failure placeholder
    pub failed: u32,
    /// Anchors that were missing and fell back to the whole file
    pub fallbacks: u32,
}

impl IncludeStats {
    pub fn add(&mut self, other: IncludeStats) {
        self.resolved += other.resolved;
        self.failed += other.failed;
        self.fallbacks += other.fallbacks;
    }

    pub fn is_empty(&self) -> bool {
        self.resolved == 0 && self.failed == 0 && self.fallbacks == 0
    }
}

/// Issue information for a report item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub code: String,
    pub message: String,
}

impl Issue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// One processed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportItem {
    pub kind: Kind,

    /// Path relative to the tree root, using '/' as separator
    pub path: String,

    /// Book the file belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<String>,

    pub status: Status,

    /// 1-indexed line, for lint findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    #[serde(default, skip_serializing_if = "IncludeStats::is_empty")]
    pub includes: IncludeStats,

    /// XXH3 hash of the written content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

impl ReportItem {
    pub fn new(kind: Kind, path: impl Into<String>, status: Status) -> Self {
        Self {
            kind,
            path: path.into(),
            book: None,
            status,
            line: None,
            includes: IncludeStats::default(),
            hash: None,
            issues: Vec::new(),
        }
    }

    /// Create a failed item with a single issue
    pub fn failed(
        kind: Kind,
        path: impl Into<String>,
        code: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::new(kind, path, Status::Failed).with_issue(Issue::new(code, message))
    }

    pub fn with_book(mut self, book: impl Into<String>) -> Self {
        self.book = Some(book.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_includes(mut self, includes: IncludeStats) -> Self {
        self.includes = includes;
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_issue(mut self, issue: Issue) -> Self {
        self.issues.push(issue);
        self
    }

    pub fn with_issues(mut self, issues: impl IntoIterator<Item = Issue>) -> Self {
        self.issues.extend(issues);
        self
    }
}

/// Aggregate counters over a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub files: usize,
    pub failed_files: usize,
    pub includes: IncludeStats,
}

/// Report containing multiple items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub items: Vec<ReportItem>,
}

impl Report {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ReportItem) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ReportItem>) {
        self.items.extend(items);
    }

    /// Sort items by book, path and line for stable output
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| {
            a.book
                .cmp(&b.book)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.line.cmp(&b.line))
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> Totals {
        let mut totals = Totals::default();
        for item in &self.items {
            totals.files += 1;
            if item.status == Status::Failed {
                totals.failed_files += 1;
            }
            totals.includes.add(item.includes);
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_item_serialization_skips_empty_fields() {
        let item = ReportItem::new(Kind::Asset, "img/logo.png", Status::Copied);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["kind"], "asset");
        assert_eq!(json["status"], "copied");
        assert!(json.get("includes").is_none());
        assert!(json.get("issues").is_none());
        assert!(json.get("book").is_none());
    }

    #[test]
    fn test_report_sort_is_stable_by_book_then_path() {
        let mut report = Report::new();
        report.push(ReportItem::new(Kind::Markdown, "b.md", Status::Written).with_book("z"));
        report.push(ReportItem::new(Kind::Markdown, "c.md", Status::Written).with_book("a"));
        report.push(ReportItem::new(Kind::Markdown, "a.md", Status::Written).with_book("z"));
        report.sort();

        let order: Vec<_> = report.items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(order, vec!["c.md", "a.md", "b.md"]);
    }

    #[test]
    fn test_report_totals() {
        let mut report = Report::new();
        report.push(
            ReportItem::new(Kind::Markdown, "a.md", Status::Written).with_includes(IncludeStats {
                resolved: 2,
                failed: 1,
                fallbacks: 1,
            }),
        );
        report.push(ReportItem::failed(
            Kind::Markdown,
            "b.md",
            "WRITE_FAILED",
            "disk full",
        ));

        let totals = report.totals();
        assert_eq!(totals.files, 2);
        assert_eq!(totals.failed_files, 1);
        assert_eq!(totals.includes.resolved, 2);
        assert_eq!(totals.includes.failed, 1);
        assert_eq!(totals.includes.fallbacks, 1);
    }
}
