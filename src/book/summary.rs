//! SUMMARY.md handling
//!
//! Reads chapter links out of an existing summary and synthesizes one when
//! the source tree has none.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use crate::core::paths::{book_relative, is_mdx};

/// Markdown link to a local `.md`/`.mdx` file, optional `#fragment`
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[[^\]]*\]\(\s*([^)#\s]+\.mdx?)(?:#[^)]*)?\s*\)").expect("Invalid LINK_RE regex")
});

/// A chapter of an assembled book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Path relative to the book's `src/`
    pub path: String,
    pub title: String,
    pub category: Option<String>,
}

impl Chapter {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

/// Files kept in summary-only mode even when unlisted
pub const ALWAYS_INCLUDED: [&str; 2] = ["README.md", "index.md"];

/// Chapter paths linked from a summary, in order of first appearance
pub fn summary_links(summary: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    LINK_RE
        .captures_iter(summary)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|link| !link.contains("://"))
        .map(|link| link.trim_start_matches("./").to_string())
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Point links at `.mdx` chapters to the `.md` files they are written as
pub fn retarget_mdx_links(summary: &str) -> Cow<'_, str> {
    LINK_RE.replace_all(summary, |caps: &Captures| {
        let whole = &caps[0];
        match caps.get(1) {
            Some(link) if is_mdx(Path::new(link.as_str())) && !link.as_str().contains("://") => {
                let start = link.start() - caps.get(0).map_or(0, |m| m.start());
                format!(
                    "{}{}{}",
                    &whole[..start],
                    book_relative(link.as_str()),
                    &whole[start + link.len()..]
                )
            }
            _ => whole.to_string(),
        }
    })
}

/// Text of the first level-one heading
pub fn first_heading(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Chapter title derived from a file name: `getting-started.md` -> `Getting Started`
pub fn title_from_path(relative: &str) -> String {
    let stem = Path::new(relative)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(relative);

    stem.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_front_page(relative: &str) -> bool {
    ALWAYS_INCLUDED
        .iter()
        .any(|name| relative.eq_ignore_ascii_case(name))
}

/// Build a summary from the assembled chapters.
///
/// Front pages (`README.md`, `index.md`) come first, the rest in path order.
/// Chapters with a front matter category are grouped under a part title per
/// category, in order of first appearance.
pub fn synthesize_summary(chapters: &[Chapter]) -> String {
    let mut sorted: Vec<&Chapter> = chapters.iter().collect();
    sorted.sort_by(|a, b| {
        is_front_page(&b.path)
            .cmp(&is_front_page(&a.path))
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut parts: Vec<(&str, Vec<&Chapter>)> = Vec::new();
    let mut output = String::from("# Summary\n\n");
    for chapter in sorted {
        let Some(category) = chapter.category.as_deref() else {
            push_entry(&mut output, chapter);
            continue;
        };
        match parts.iter_mut().find(|(name, _)| *name == category) {
            Some((_, members)) => members.push(chapter),
            None => parts.push((category, vec![chapter])),
        }
    }

    for (category, members) in parts {
        output.push_str(&format!("\n# {}\n\n", category));
        for chapter in members {
            push_entry(&mut output, chapter);
        }
    }
    output
}

fn push_entry(output: &mut String, chapter: &Chapter) {
    output.push_str(&format!("- [{}]({})\n", chapter.title, chapter.path));
}
