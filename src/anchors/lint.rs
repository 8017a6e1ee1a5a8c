//! Anchor linting module
//!
//! Checks for:
//! - ANCHOR_END markers with no open ANCHOR
//! - ANCHOR markers that are never closed
//! - Anchor names reopened after being closed (only the first region is reachable)
//! - Empty regions

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::anchors::parse::{scan_markers, MarkerKind};
use crate::core::file_reader::read_text;
use crate::core::model::{Issue, Kind, Report, ReportItem, Status};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::scan::{scan_files, ScanOptions};

/// Lint issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    Error,
    Warning,
}

/// A lint issue
#[derive(Debug, Clone)]
pub struct LintIssue {
    pub severity: LintSeverity,
    pub code: &'static str,
    pub message: String,
    pub path: String,
    /// 1-indexed
    pub line: u32,
}

impl LintIssue {
    pub fn error(code: &'static str, message: String, path: &str, line: usize) -> Self {
        Self {
            severity: LintSeverity::Error,
            code,
            message,
            path: path.to_string(),
            line: line as u32 + 1,
        }
    }

    pub fn warning(code: &'static str, message: String, path: &str, line: usize) -> Self {
        Self {
            severity: LintSeverity::Warning,
            ..Self::error(code, message, path, line)
        }
    }

    pub fn to_report_item(&self) -> ReportItem {
        let severity = match self.severity {
            LintSeverity::Error => "error",
            LintSeverity::Warning => "warning",
        };
        ReportItem::new(Kind::Lint, self.path.clone(), Status::Reported)
            .with_line(self.line)
            .with_issue(Issue::new(
                self.code,
                format!("{}: {}", severity, self.message),
            ))
    }
}

/// Lint the anchor markers of one file
pub fn check_content(content: &str, path: &str) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    let mut open: HashMap<&str, usize> = HashMap::new();
    let mut closed: HashSet<&str> = HashSet::new();

    for marker in scan_markers(content) {
        let name = marker.name;

        if let Some(start) = open.get(name).copied() {
            // Either ANCHOR_END or a second ANCHOR closes the region
            open.remove(name);
            closed.insert(name);
            if marker.line == start + 1 {
                issues.push(LintIssue::warning(
                    "EMPTY_ANCHOR",
                    format!("Anchor '{}' has empty content", name),
                    path,
                    start,
                ));
            }
            continue;
        }

        match marker.kind {
            MarkerKind::Start if closed.contains(name) => {
                issues.push(LintIssue::warning(
                    "DUPLICATE_ANCHOR",
                    format!(
                        "Anchor '{}' is opened again; includes only see the first region",
                        name
                    ),
                    path,
                    marker.line,
                ));
                open.insert(name, marker.line);
            }
            MarkerKind::Start => {
                open.insert(name, marker.line);
            }
            MarkerKind::End => {
                issues.push(LintIssue::error(
                    "ORPHAN_END",
                    format!("ANCHOR_END for '{}' has no matching ANCHOR", name),
                    path,
                    marker.line,
                ));
            }
        }
    }

    let mut unterminated: Vec<_> = open.into_iter().collect();
    unterminated.sort_by_key(|(_, line)| *line);
    for (name, line) in unterminated {
        issues.push(LintIssue::warning(
            "UNTERMINATED",
            format!(
                "Anchor '{}' is never closed; includes fall back to the whole file",
                name
            ),
            path,
            line,
        ));
    }

    issues
}

/// Lint every text-like file under `root`
pub fn lint_tree(root: &Path) -> Vec<LintIssue> {
    let mut issues = Vec::new();

    for file in scan_files(root, &ScanOptions::default()) {
        if !is_text_file(&file.path) {
            continue;
        }

        let content = match read_text(&file.path) {
            Ok(c) => c,
            Err(err) => {
                debug!(path = %file.relative, error = %err, "skipping unreadable file");
                continue;
            }
        };

        issues.extend(check_content(&content, &file.relative));
    }

    issues
}

/// Check if a file is likely a text file that may carry anchors
pub fn is_text_file(path: &Path) -> bool {
    let text_extensions = [
        "md", "txt", "rs", "sw", "py", "js", "mjs", "cjs", "ts", "tsx", "jsx", "html", "css",
        "json", "yaml", "yml", "toml", "graphql", "gql", "sh", "bash", "zsh", "sol", "c", "cpp",
        "h", "hpp", "go",
    ];

    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| text_extensions.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Run the lint command
pub fn run_lint(root: &Path, config: RenderConfig) -> Result<()> {
    let issues = lint_tree(root);

    let mut report = Report::new();
    for issue in &issues {
        report.push(issue.to_report_item());
    }
    report.sort();

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render(&report));

    if issues.iter().any(|i| i.severity == LintSeverity::Error) {
        anyhow::bail!("anchor lint found errors");
    }

    Ok(())
}
