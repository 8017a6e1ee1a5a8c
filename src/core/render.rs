//! Renderer module
//!
//! Renders a Report to different output formats: text, json, jsonl, md

use colored::Colorize;
use std::io::Write;

use crate::core::model::{IncludeStats, Report, ReportItem, Status};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Jsonl,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    /// Create a new render config with default options
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    /// Create a new render config with pretty option
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for reports
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    /// Create a new renderer with render config
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a report to a string
    pub fn render(&self, report: &Report) -> String {
        match self.config.format {
            OutputFormat::Text => self.render_text(report),
            OutputFormat::Json => self.render_json(report),
            OutputFormat::Jsonl => self.render_jsonl(report),
            OutputFormat::Markdown => self.render_markdown(report),
        }
    }

    /// Render to a writer
    pub fn render_to<W: Write>(&self, report: &Report, mut writer: W) -> std::io::Result<()> {
        let output = self.render(report);
        writer.write_all(output.as_bytes())?;
        if !output.is_empty() && !output.ends_with('\n') {
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, report: &Report) -> String {
        report
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, report: &Report) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&report.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&report.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as human-readable lines plus a totals footer
    fn render_text(&self, report: &Report) -> String {
        let mut output = String::new();

        for item in &report.items {
            let status = format!("{:<9}", status_label(item.status));
            let status = match item.status {
                Status::Failed => status.red().bold(),
                Status::Pending | Status::Reported => status.yellow(),
                Status::Unchanged => status.dimmed(),
                _ => status.green(),
            };

            output.push_str(&format!("{} {}", status, display_path(item)));
            if let Some(stats) = stats_suffix(&item.includes) {
                output.push_str(&format!(" [{}]", stats));
            }
            output.push('\n');

            for issue in &item.issues {
                output.push_str(&format!("    {}: {}\n", issue.code.yellow(), issue.message));
            }
        }

        let totals = report.totals();
        output.push_str(&format!(
            "{} files, {} failed; includes: {} resolved, {} failed, {} fallbacks\n",
            totals.files,
            totals.failed_files,
            totals.includes.resolved,
            totals.includes.failed,
            totals.includes.fallbacks
        ));

        output
    }

    /// Render as Markdown
    fn render_markdown(&self, report: &Report) -> String {
        let mut output = String::new();

        let (failed, ok): (Vec<&ReportItem>, Vec<&ReportItem>) = report
            .items
            .iter()
            .partition(|item| item.status == Status::Failed);

        if !failed.is_empty() {
            output.push_str("## Failures\n\n");
            for item in failed {
                output.push_str(&format!("- `{}`\n", display_path(item)));
                for issue in &item.issues {
                    output.push_str(&format!("  - **{}**: {}\n", issue.code, issue.message));
                }
            }
            output.push('\n');
        }

        if !ok.is_empty() {
            output.push_str("## Files\n\n");
            for item in ok {
                output.push_str(&format!(
                    "- `{}` ({})",
                    display_path(item),
                    status_label(item.status)
                ));
                if let Some(stats) = stats_suffix(&item.includes) {
                    output.push_str(&format!(", {}", stats));
                }
                output.push('\n');
                for issue in &item.issues {
                    output.push_str(&format!("  - **{}**: {}\n", issue.code, issue.message));
                }
            }
            output.push('\n');
        }

        output
    }
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Written => "written",
        Status::Unchanged => "unchanged",
        Status::Pending => "pending",
        Status::Copied => "copied",
        Status::Generated => "generated",
        Status::Failed => "failed",
        Status::Reported => "lint",
    }
}

fn display_path(item: &ReportItem) -> String {
    let mut path = match &item.book {
        Some(book) => format!("{}/{}", book, item.path),
        None => item.path.clone(),
    };
    if let Some(line) = item.line {
        path.push_str(&format!(":{}", line));
    }
    path
}

fn stats_suffix(stats: &IncludeStats) -> Option<String> {
    if stats.is_empty() {
        return None;
    }
    let mut parts = vec![format!("{} included", stats.resolved)];
    if stats.failed > 0 {
        parts.push(format!("{} failed", stats.failed));
    }
    if stats.fallbacks > 0 {
        parts.push(format!("{} fallback", stats.fallbacks));
    }
    Some(parts.join(", "))
}
