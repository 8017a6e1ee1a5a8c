//! Include directive rewriter
//!
//! Replaces every `{{#include ...}}` token of a document with the snippet it
//! names. Markdown targets are spliced raw and rewritten recursively; other
//! files become fenced code blocks. A directive that cannot be resolved is
//! replaced by a placeholder comment and the rest of the document proceeds.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::cache::source::SourceCache;
use crate::core::error::IncludeError;
use crate::core::model::{IncludeStats, Issue, SourceDocument};
use crate::core::paths::clean_path;
use crate::include::directive::{parse_directives, IncludeDirective};
use crate::include::format::RenderedSnippet;

/// Maximum nesting of markdown includes
pub const MAX_DEPTH: usize = 10;

/// Constant prefix of every failure placeholder
pub const PLACEHOLDER_PREFIX: &str = "<!-- bookforge: include failed";

/// Directory that relative include paths resolve against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IncludeBase {
    /// The directory of the file containing the directive
    #[default]
    DocumentDir,
    /// A fixed root
    Root(PathBuf),
}

/// Result of rewriting one document
#[derive(Debug, Clone, Default)]
pub struct RewriteOutcome {
    pub text: String,
    pub stats: IncludeStats,
    pub issues: Vec<Issue>,
}

/// Rewrites documents against a shared source cache
#[derive(Debug, Clone)]
pub struct Rewriter {
    base: IncludeBase,
    cache: Arc<SourceCache>,
}

impl Rewriter {
    pub fn new(base: IncludeBase, cache: Arc<SourceCache>) -> Self {
        Self { base, cache }
    }

    /// Rewrite all directives in `doc`.
    ///
    /// A document without directives comes back byte-identical.
    pub fn rewrite(&self, doc: &SourceDocument) -> RewriteOutcome {
        let mut outcome = RewriteOutcome::default();
        let mut stack = vec![clean_path(&doc.path)];
        let text = self.rewrite_text(&doc.text, &doc.path, &mut stack, &mut outcome);
        outcome.text = text;
        outcome
    }

    fn rewrite_text(
        &self,
        text: &str,
        doc_path: &Path,
        stack: &mut Vec<PathBuf>,
        outcome: &mut RewriteOutcome,
    ) -> String {
        let directives = parse_directives(text);
        if directives.is_empty() {
            return text.to_string();
        }

        let fences = fenced_ranges(text);
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for directive in &directives {
            output.push_str(&text[last..directive.span.start]);
            last = directive.span.end;

            let in_fence = fences.iter().any(|r| r.contains(&directive.span.start));
            match self.resolve(directive, doc_path, in_fence, stack, outcome) {
                Ok(rendered) => {
                    outcome.stats.resolved += 1;
                    output.push_str(&rendered);
                }
                Err(err) => {
                    error!(
                        document = %doc_path.display(),
                        include = %directive.path,
                        error = %err,
                        "include failed"
                    );
                    outcome.stats.failed += 1;
                    outcome
                        .issues
                        .push(Issue::new(err.code(), format!("{}: {}", directive.path, err)));
                    output.push_str(&placeholder(&directive.path, &err));
                }
            }
        }

        output.push_str(&text[last..]);
        output
    }

    fn resolve(
        &self,
        directive: &IncludeDirective,
        doc_path: &Path,
        in_fence: bool,
        stack: &mut Vec<PathBuf>,
        outcome: &mut RewriteOutcome,
    ) -> Result<String, IncludeError> {
        let target = self.resolve_path(doc_path, &directive.path);
        debug!(include = %target.display(), "resolving include");

        let source = self.cache.get(&target).map_err(|source| IncludeError::Read {
            path: target.clone(),
            source,
        })?;

        let extracted = directive.selector.select(&source);
        if extracted.fallback {
            let anchor = directive.selector.anchor().unwrap_or_default();
            warn!(
                document = %doc_path.display(),
                include = %directive.path,
                anchor,
                "anchor not found, including whole file"
            );
            outcome.stats.fallbacks += 1;
            outcome.issues.push(Issue::new(
                "ANCHOR_FALLBACK",
                format!(
                    "{}: anchor '{}' not found, included whole file",
                    directive.path, anchor
                ),
            ));
        }

        if directive.selector.out_of_range(&source) {
            warn!(
                document = %doc_path.display(),
                include = %directive.path,
                "line range selects nothing"
            );
            outcome.issues.push(Issue::new(
                "LINES_OUT_OF_RANGE",
                format!("{}: line range is outside the file", directive.path),
            ));
        }

        let snippet = RenderedSnippet::new(&target, &extracted.text);
        if !snippet.is_markdown() {
            return Ok(snippet.render(in_fence));
        }

        if stack.contains(&target) {
            return Err(IncludeError::Cycle(target));
        }
        if stack.len() > MAX_DEPTH {
            return Err(IncludeError::DepthExceeded(MAX_DEPTH));
        }

        stack.push(target.clone());
        let nested = self.rewrite_text(&snippet.text, &target, stack, outcome);
        stack.pop();
        Ok(nested)
    }

    fn resolve_path(&self, doc_path: &Path, include: &str) -> PathBuf {
        let include = Path::new(include);
        if include.is_absolute() {
            return clean_path(include);
        }
        let base = match &self.base {
            IncludeBase::DocumentDir => doc_path.parent().unwrap_or_else(|| Path::new("")),
            IncludeBase::Root(root) => root.as_path(),
        };
        clean_path(&base.join(include))
    }
}

/// Placeholder comment left where a directive failed
pub fn placeholder(path: &str, err: &IncludeError) -> String {
    let reason = err.to_string().replace("-->", "->");
    format!("{}: {}: {} -->", PLACEHOLDER_PREFIX, path, reason)
}

/// Byte ranges covered by fenced code blocks (``` or ~~~).
///
/// Each range spans from the end of the opening fence line to the start of
/// the closing one. An unclosed fence runs to the end of the text.
pub fn fenced_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut open: Option<(char, usize, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        let trimmed = line.trim();
        let Some(fence_char) = trimmed.chars().next().filter(|c| *c == '`' || *c == '~') else {
            continue;
        };
        let run = trimmed.chars().take_while(|c| *c == fence_char).count();
        if run < 3 {
            continue;
        }

        match open {
            None => open = Some((fence_char, run, offset)),
            Some((ch, len, body_start)) => {
                let only_fence = trimmed.len() == run * ch.len_utf8();
                if fence_char == ch && run >= len && only_fence {
                    ranges.push(body_start..line_start);
                    open = None;
                }
            }
        }
    }

    if let Some((_, _, body_start)) = open {
        ranges.push(body_start..text.len());
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn rewriter(base: IncludeBase) -> Rewriter {
        Rewriter::new(base, Arc::new(SourceCache::new()))
    }

    fn rewrite_in(dir: &Path, name: &str, text: &str) -> RewriteOutcome {
        rewriter(IncludeBase::DocumentDir).rewrite(&SourceDocument::new(dir.join(name), text))
    }

    #[test]
    fn test_anchor_include_is_fenced() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("foo.rs"),
            "// ANCHOR: example\nfn main() {}\n// ANCHOR_END: example\n",
        )
        .unwrap();

        let outcome = rewrite_in(temp.path(), "doc.md", "{{#include foo.rs:example}}");
        assert_eq!(outcome.text, "```rust\nfn main() {}\n```");
        assert_eq!(outcome.stats.resolved, 1);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_no_directives_is_identity() {
        let temp = tempdir().unwrap();
        let text = "# Title\r\n\r\nSome {{ text }} and `code`.\n\n\n";
        let outcome = rewrite_in(temp.path(), "doc.md", text);
        assert_eq!(outcome.text, text);
        assert!(outcome.stats.is_empty());
    }

    #[test]
    fn test_missing_file_placeholder() {
        let temp = tempdir().unwrap();
        let outcome = rewrite_in(
            temp.path(),
            "doc.md",
            "before\n{{#include missing.rs}}\nafter\n",
        );

        assert_eq!(
            outcome.text,
            "before\n<!-- bookforge: include failed: missing.rs: file not found -->\nafter\n"
        );
        assert_eq!(outcome.stats.failed, 1);
        assert_eq!(outcome.issues[0].code, "INCLUDE_NOT_FOUND");
    }

    #[test]
    fn test_missing_anchor_falls_back_without_markers() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("lib.rs"),
            "// ANCHOR: a\nfn a() {}\n// ANCHOR_END: a\nfn b() {}\n",
        )
        .unwrap();

        let outcome = rewrite_in(temp.path(), "doc.md", "{{#include lib.rs:nope}}");
        assert_eq!(outcome.text, "```rust\nfn a() {}\nfn b() {}\n```");
        assert_eq!(outcome.stats.fallbacks, 1);
        assert_eq!(outcome.stats.resolved, 1);
        assert_eq!(outcome.issues[0].code, "ANCHOR_FALLBACK");
    }

    #[test]
    fn test_line_range_past_end_is_reported() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("f.rs"), "fn a() {}\nfn b() {}\n").unwrap();

        let outcome = rewrite_in(
            temp.path(),
            "doc.md",
            "{{#include f.rs:99999999999999999999}}",
        );
        assert_eq!(outcome.text, "```rust\n\n```");
        assert_eq!(outcome.stats.resolved, 1);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].code, "LINES_OUT_OF_RANGE");

        let outcome = rewrite_in(temp.path(), "doc.md", "{{#include f.rs:2}}");
        assert_eq!(outcome.text, "```rust\nfn b() {}\n```");
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_nested_markdown_flattens() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("parts")).unwrap();
        fs::write(temp.path().join("parts/b.md"), "B start\n{{#include c.md}}\n").unwrap();
        fs::write(temp.path().join("parts/c.md"), "C {{#include code.sw:x}}").unwrap();
        fs::write(
            temp.path().join("parts/code.sw"),
            "# ANCHOR: x\nlet y = 1;\n# ANCHOR_END: x\n",
        )
        .unwrap();

        let outcome = rewrite_in(temp.path(), "a.md", "A\n{{#include parts/b.md}}\nend\n");
        assert!(!outcome.text.contains("{{#include"));
        assert_eq!(outcome.text, "A\nB start\nC ```rust\nlet y = 1;\n```\nend\n");
        assert_eq!(outcome.stats.resolved, 3);
    }

    #[test]
    fn test_cycle_yields_placeholder() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.md"), "A {{#include b.md}}").unwrap();
        fs::write(temp.path().join("b.md"), "B {{#include a.md}}").unwrap();

        let outcome = rewrite_in(temp.path(), "a.md", "A {{#include b.md}}");
        assert!(outcome
            .text
            .starts_with("A B <!-- bookforge: include failed: a.md: include cycle"));
        assert_eq!(outcome.stats.failed, 1);
        assert_eq!(outcome.issues[0].code, "INCLUDE_CYCLE");
    }

    #[test]
    fn test_self_include_is_cycle() {
        let temp = tempdir().unwrap();
        let outcome = rewrite_in(temp.path(), "self.md", "{{#include self.md}}");
        // self.md does not exist on disk; the read fails before recursion
        assert_eq!(outcome.issues[0].code, "INCLUDE_NOT_FOUND");

        fs::write(temp.path().join("self.md"), "{{#include self.md}}").unwrap();
        let outcome = rewrite_in(temp.path(), "self.md", "{{#include self.md}}");
        assert_eq!(outcome.issues[0].code, "INCLUDE_CYCLE");
    }

    #[test]
    fn test_depth_limit() {
        let temp = tempdir().unwrap();
        for i in 0..=MAX_DEPTH + 1 {
            fs::write(
                temp.path().join(format!("d{}.md", i)),
                format!("{{{{#include d{}.md}}}}", i + 1),
            )
            .unwrap();
        }

        let outcome = rewrite_in(temp.path(), "root.md", "{{#include d0.md}}");
        assert!(outcome.text.starts_with(PLACEHOLDER_PREFIX));
        assert_eq!(outcome.issues[0].code, "INCLUDE_DEPTH");
        assert_eq!(outcome.stats.resolved as usize, MAX_DEPTH);
    }

    #[test]
    fn test_directive_inside_fence_is_raw() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("main.rs"), "fn main() {}\n").unwrap();

        let outcome = rewrite_in(
            temp.path(),
            "doc.md",
            "```rust,ignore\n{{#include main.rs}}\n```\n\n{{#include main.rs}}\n",
        );
        assert_eq!(
            outcome.text,
            "```rust,ignore\nfn main() {}\n```\n\n```rust\nfn main() {}\n```\n"
        );
    }

    #[test]
    fn test_root_base() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("code")).unwrap();
        fs::create_dir_all(temp.path().join("book/deep")).unwrap();
        fs::write(temp.path().join("code/x.toml"), "a = 1\n").unwrap();

        let rw = rewriter(IncludeBase::Root(temp.path().to_path_buf()));
        let doc = SourceDocument::new(
            temp.path().join("book/deep/ch.md"),
            "{{#include code/x.toml}}",
        );
        assert_eq!(rw.rewrite(&doc).text, "```toml\na = 1\n```");
    }

    #[test]
    fn test_line_range_include() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("s.py"), "one\ntwo\nthree\n").unwrap();
        let outcome = rewrite_in(temp.path(), "doc.md", "{{#include s.py:2:3}}");
        assert_eq!(outcome.text, "```python\ntwo\nthree\n```");
    }

    #[test]
    fn test_fenced_ranges() {
        let text = "a\n```rust\ncode\n```\nb\n~~~~\n```\nstill\n~~~~\n";
        let ranges = fenced_ranges(text);
        assert_eq!(ranges.len(), 2);
        assert_eq!(&text[ranges[0].clone()], "code\n");
        assert_eq!(&text[ranges[1].clone()], "```\nstill\n");
    }

    #[test]
    fn test_fenced_ranges_unclosed() {
        let text = "```\nopen";
        assert_eq!(fenced_ranges(text), vec![4..8]);
    }
}
