//! Anchors module - Named regions in source files
//!
//! Anchors delimit the part of a file that an include directive pulls in.
//! Format: `// ANCHOR: name` ... `// ANCHOR_END: name` (`#` comments too)

pub mod api;
pub mod lint;
pub mod parse;
