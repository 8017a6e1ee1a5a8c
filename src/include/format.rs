//! Snippet formatting
//!
//! Turns extracted source text into the markdown that replaces a directive:
//! marker lines are dropped and code is wrapped in a fenced block tagged with
//! a language inferred from the file extension.

use serde::Serialize;
use std::path::Path;

use crate::anchors::parse::is_marker_line;

/// Fence language used for unknown extensions
pub const FALLBACK_LANGUAGE: &str = "text";

/// Map a file extension to a fence language.
///
/// Returns `None` for markdown, which is spliced unwrapped.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext.to_ascii_lowercase().as_str() {
        "md" | "mdx" => return None,
        "rs" | "sw" | "sway" => "rust",
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" => "python",
        "sh" | "bash" | "zsh" => "bash",
        "toml" => "toml",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "graphql" | "gql" => "graphql",
        "sol" => "solidity",
        "go" => "go",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" => "cpp",
        "html" => "html",
        "css" => "css",
        _ => FALLBACK_LANGUAGE,
    };
    Some(lang)
}

/// Fence language for a path, `None` for markdown
pub fn language_for(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => language_for_extension(ext),
        None => Some(FALLBACK_LANGUAGE),
    }
}

/// Snippet ready to be spliced into a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedSnippet {
    /// `None` means markdown
    pub language: Option<String>,
    pub text: String,
}

impl RenderedSnippet {
    /// Build a snippet for `path`, dropping every anchor marker line
    pub fn new(path: &Path, text: &str) -> Self {
        Self {
            language: language_for(path).map(str::to_string),
            text: strip_markers(text),
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.language.is_none()
    }

    /// Render for splicing. Code is fenced unless `in_fence` is set, i.e. the
    /// directive already sits inside a fenced block.
    pub fn render(&self, in_fence: bool) -> String {
        match &self.language {
            Some(lang) if !in_fence => format!("```{}\n{}\n```", lang, self.text),
            _ => self.text.clone(),
        }
    }
}

/// Remove anchor marker lines of any name. Lines are joined with `\n`
/// and no trailing newline is kept.
pub fn strip_markers(text: &str) -> String {
    text.lines()
        .filter(|line| !is_marker_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_table() {
        assert_eq!(language_for(Path::new("main.rs")), Some("rust"));
        assert_eq!(language_for(Path::new("contract.sw")), Some("rust"));
        assert_eq!(language_for(Path::new("index.TSX")), Some("typescript"));
        assert_eq!(language_for(Path::new("run.sh")), Some("bash"));
        assert_eq!(language_for(Path::new("Forc.toml")), Some("toml"));
        assert_eq!(language_for(Path::new("schema.gql")), Some("graphql"));
        assert_eq!(language_for(Path::new("c.yml")), Some("yaml"));
    }

    #[test]
    fn test_language_unknown_and_markdown() {
        assert_eq!(language_for(Path::new("data.xyz")), Some("text"));
        assert_eq!(language_for(Path::new("Makefile")), Some("text"));
        assert_eq!(language_for(Path::new("chapter.md")), None);
    }

    #[test]
    fn test_strip_markers() {
        let text = "// ANCHOR: a\nfn a() {}\n// ANCHOR: b\nfn b() {}\n// ANCHOR_END: b\n// ANCHOR_END: a\n";
        assert_eq!(strip_markers(text), "fn a() {}\nfn b() {}");
    }

    #[test]
    fn test_render_fenced() {
        let snippet = RenderedSnippet::new(Path::new("foo.rs"), "fn main() {}");
        assert_eq!(snippet.render(false), "```rust\nfn main() {}\n```");
        assert_eq!(snippet.render(true), "fn main() {}");
    }

    #[test]
    fn test_render_markdown_unwrapped() {
        let snippet = RenderedSnippet::new(Path::new("part.md"), "# Part\n\ntext\n");
        assert!(snippet.is_markdown());
        assert_eq!(snippet.render(false), "# Part\n\ntext");
    }
}
