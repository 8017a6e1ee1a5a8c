//! Anchor API - get operation

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::anchors::parse::{extract, AnchorRegion};
use crate::core::file_reader::read_text;
use crate::core::render::{OutputFormat, RenderConfig};
use crate::include::format::RenderedSnippet;

/// An anchor looked up in a single file
#[derive(Debug, Clone, Serialize)]
pub struct AnchorSnippet {
    pub path: String,
    pub anchor: String,
    /// 1-indexed line of the ANCHOR marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub fallback: bool,
    #[serde(flatten)]
    pub snippet: RenderedSnippet,
}

impl AnchorSnippet {
    fn region_line(region: Option<AnchorRegion>) -> Option<usize> {
        region.map(|r| r.start_line + 1)
    }
}

/// Extract and format one anchor the way an include directive would
pub fn get_anchor(file: &Path, name: &str) -> Result<AnchorSnippet> {
    let content =
        read_text(file).with_context(|| format!("cannot read {}", file.display()))?;
    let extracted = extract(&content, Some(name));

    Ok(AnchorSnippet {
        path: file.display().to_string(),
        anchor: name.to_string(),
        line: AnchorSnippet::region_line(extracted.region),
        fallback: extracted.fallback,
        snippet: RenderedSnippet::new(file, &extracted.text),
    })
}

/// Run anchor get command
pub fn run_get(file: &Path, name: &str, config: RenderConfig) -> Result<()> {
    let found = get_anchor(file, name)?;
    if found.fallback {
        tracing::warn!(
            path = %found.path,
            anchor = name,
            "anchor not found, showing whole file"
        );
    }

    let output = match config.format {
        OutputFormat::Json | OutputFormat::Jsonl if config.pretty => {
            serde_json::to_string_pretty(&found)?
        }
        OutputFormat::Json | OutputFormat::Jsonl => serde_json::to_string(&found)?,
        OutputFormat::Text | OutputFormat::Markdown => found.snippet.render(false),
    };
    println!("{}", output);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_get_anchor() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("main.sw");
        std::fs::write(&file, "contract;\n// ANCHOR: abi\nabi A {}\n// ANCHOR_END: abi\n").unwrap();

        let found = get_anchor(&file, "abi").unwrap();
        assert!(!found.fallback);
        assert_eq!(found.line, Some(2));
        assert_eq!(found.snippet.render(false), "```rust\nabi A {}\n```");
    }

    #[test]
    fn test_get_anchor_missing_falls_back() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("run.sh");
        std::fs::write(&file, "# ANCHOR: a\necho hi\n# ANCHOR_END: a\n").unwrap();

        let found = get_anchor(&file, "b").unwrap();
        assert!(found.fallback);
        assert_eq!(found.line, None);
        assert_eq!(found.snippet.text, "echo hi");
    }

    #[test]
    fn test_get_anchor_missing_file() {
        let temp = tempdir().unwrap();
        assert!(get_anchor(&temp.path().join("nope.rs"), "a").is_err());
    }
}
