//! Anchor parsing module
//!
//! Parses anchor markers from source files:
//! // ANCHOR: name
//! ...content...
//! // ANCHOR_END: name
//!
//! `#` comments are accepted as well. A second `ANCHOR: name` also closes the
//! region opened by the first one.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Static regex for parsing anchor markers
/// Format: // ANCHOR: name, # ANCHOR_END: name
pub static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?://|#)\s*(ANCHOR|ANCHOR_END)\s*:\s*(\S+)").expect("Invalid MARKER_RE regex")
});

/// Marker kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Start,
    End,
}

/// A marker found on a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
    pub kind: MarkerKind,
    pub name: &'a str,
    /// 0-indexed line number
    pub line: usize,
}

/// Line range delimited by a marker pair.
///
/// Both indices point at the marker lines themselves (0-indexed); the
/// anchored content is strictly between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnchorRegion {
    pub start_line: usize,
    pub end_line: usize,
}

impl AnchorRegion {
    pub fn is_valid(&self) -> bool {
        self.start_line < self.end_line
    }

    /// Number of content lines between the markers
    pub fn len(&self) -> usize {
        self.end_line.saturating_sub(self.start_line + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of extracting an anchor from a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub region: Option<AnchorRegion>,
    /// The requested anchor was missing and the whole file was used
    pub fallback: bool,
}

/// Parse a single line as an anchor marker
pub fn parse_marker(line: &str) -> Option<(MarkerKind, &str)> {
    let caps = MARKER_RE.captures(line)?;
    let kind = match caps.get(1)?.as_str() {
        "ANCHOR" => MarkerKind::Start,
        _ => MarkerKind::End,
    };
    Some((kind, caps.get(2)?.as_str()))
}

/// Check whether a line is any anchor marker
pub fn is_marker_line(line: &str) -> bool {
    MARKER_RE.is_match(line)
}

/// Collect every marker in a file, in line order
pub fn scan_markers(content: &str) -> Vec<Marker<'_>> {
    content
        .lines()
        .enumerate()
        .filter_map(|(line, text)| {
            parse_marker(text).map(|(kind, name)| Marker { kind, name, line })
        })
        .collect()
}

/// Locate the region of the first `ANCHOR: name` up to its terminator.
///
/// Returns `None` when the anchor never starts or is never terminated.
pub fn find_region(content: &str, name: &str) -> Option<AnchorRegion> {
    let mut start = None;

    for (line, text) in content.lines().enumerate() {
        let Some((kind, marker_name)) = parse_marker(text) else {
            continue;
        };
        if marker_name != name {
            continue;
        }

        match (start, kind) {
            (None, MarkerKind::Start) => start = Some(line),
            (Some(start_line), _) => {
                let region = AnchorRegion {
                    start_line,
                    end_line: line,
                };
                return region.is_valid().then_some(region);
            }
            // ANCHOR_END before any ANCHOR is ignored
            (None, MarkerKind::End) => {}
        }
    }

    None
}

/// Extract an anchored region, or the whole file when no anchor is given.
///
/// A missing anchor falls back to the whole content with `fallback` set.
/// Marker lines are left in place; the snippet formatter strips them.
pub fn extract(content: &str, anchor: Option<&str>) -> Extracted {
    let Some(name) = anchor else {
        return Extracted {
            text: content.to_string(),
            region: None,
            fallback: false,
        };
    };

    match find_region(content, name) {
        Some(region) => {
            let text = content
                .lines()
                .skip(region.start_line + 1)
                .take(region.len())
                .collect::<Vec<_>>()
                .join("\n");
            Extracted {
                text,
                region: Some(region),
                fallback: false,
            }
        }
        None => Extracted {
            text: content.to_string(),
            region: None,
            fallback: true,
        },
    }
}

/// Extract a 1-indexed inclusive line range. Bounds are clamped to the file.
pub fn extract_lines(content: &str, start: Option<usize>, end: Option<usize>) -> String {
    let first = start.unwrap_or(1).max(1) - 1;
    let lines = content.lines().skip(first);
    match end {
        Some(end) => lines
            .take(end.saturating_sub(first))
            .collect::<Vec<_>>()
            .join("\n"),
        None => lines.collect::<Vec<_>>().join("\n"),
    }
}
