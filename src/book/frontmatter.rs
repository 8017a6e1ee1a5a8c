//! YAML front matter of source chapters
//!
//! mdBook renders front matter as text, so assembled chapters drop it. The
//! `title` and `category` fields feed the synthesized SUMMARY.md.

use serde::Deserialize;
use tracing::warn;

const FENCE: &str = "---";

/// Fields read from a chapter's front matter
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub category: Option<String>,
}

/// Split a document into its front matter and body.
///
/// Front matter is a leading `---` line, YAML, then a closing `---` line.
/// Without one the whole text is the body.
pub fn split_front_matter(text: &str) -> (Option<FrontMatter>, &str) {
    let Some(rest) = after_opening_fence(text) else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let body = rest[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return (Some(parse_fields(&rest[..offset])), body);
        }
        offset += line.len();
    }
    (None, text)
}

fn after_opening_fence(text: &str) -> Option<&str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let first = text.find('\n').map_or(text.len(), |i| i + 1);
    (text[..first].trim_end() == FENCE).then(|| &text[first..])
}

fn parse_fields(yaml: &str) -> FrontMatter {
    let trimmed = yaml.trim();
    if trimmed.is_empty() {
        return FrontMatter::default();
    }
    serde_yaml::from_str(trimmed).unwrap_or_else(|err| {
        warn!(error = %err, "invalid front matter ignored");
        FrontMatter::default()
    })
}
