//! Include directive parsing
//!
//! Recognizes `{{#include path}}`, `{{#include path:anchor}}` and the
//! line-range forms `path:10`, `path:10:20`, `path:10:` and `path::20`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use crate::anchors::parse::{extract, extract_lines, Extracted};

/// Static regex for include directives
pub static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*#include\s+([^}:\s]+)(?::([^}]*?))?\s*\}\}")
        .expect("Invalid DIRECTIVE_RE regex")
});

/// Which part of the target file to include
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Whole,
    Anchor(String),
    /// 1-indexed, inclusive
    Lines {
        start: Option<usize>,
        end: Option<usize>,
    },
}

impl Selector {
    /// Interpret the text after the first `:`
    pub fn parse(suffix: &str) -> Self {
        let suffix = suffix.trim();
        if suffix.is_empty() {
            return Selector::Whole;
        }

        let parts: Vec<&str> = suffix.split(':').map(str::trim).collect();
        let numeric = parts.len() <= 2
            && parts
                .iter()
                .all(|p| p.is_empty() || p.bytes().all(|b| b.is_ascii_digit()));
        if !numeric {
            return Selector::Anchor(suffix.to_string());
        }

        let start = line_bound(parts[0]);
        let end = match parts.get(1) {
            Some(p) => line_bound(p),
            // `path:7` is the single line 7
            None => start,
        };
        Selector::Lines { start, end }
    }

    /// True for a line range that selects nothing from `content`
    pub fn out_of_range(&self, content: &str) -> bool {
        match *self {
            Selector::Lines { start, end } => {
                let first = start.unwrap_or(1).max(1);
                first > content.lines().count() || end.is_some_and(|end| end < first)
            }
            _ => false,
        }
    }

    /// Apply the selector to file content
    pub fn select(&self, content: &str) -> Extracted {
        match self {
            Selector::Whole => extract(content, None),
            Selector::Anchor(name) => extract(content, Some(name)),
            Selector::Lines { start, end } => Extracted {
                text: extract_lines(content, *start, *end),
                region: None,
                fallback: false,
            },
        }
    }

    pub fn anchor(&self) -> Option<&str> {
        match self {
            Selector::Anchor(name) => Some(name),
            _ => None,
        }
    }
}

/// Numbers too large for `usize` saturate, so they land past the last line
fn line_bound(part: &str) -> Option<usize> {
    if part.is_empty() {
        return None;
    }
    Some(part.parse().unwrap_or(usize::MAX))
}

/// One directive found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    pub path: String,
    pub selector: Selector,
    /// The matched token text
    pub raw: String,
    /// Byte range of the token in the document
    pub span: Range<usize>,
}

/// Find every directive in `text`, left to right
pub fn parse_directives(text: &str) -> Vec<IncludeDirective> {
    DIRECTIVE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let path = caps.get(1)?.as_str().to_string();
            let selector = caps
                .get(2)
                .map(|m| Selector::parse(m.as_str()))
                .unwrap_or(Selector::Whole);
            Some(IncludeDirective {
                path,
                selector,
                raw: whole.as_str().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}
