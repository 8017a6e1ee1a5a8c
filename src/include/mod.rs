//! Include module - Resolve `{{#include}}` directives in markdown
//!
//! - `directive`: token parsing and selectors (whole file, anchor, line range)
//! - `format`: language inference and fencing
//! - `rewriter`: substitution, recursion into markdown, failure placeholders
//! - `apply`: in-place processing of files and directories

pub mod apply;
pub mod directive;
pub mod format;
pub mod rewriter;
