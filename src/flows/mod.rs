//! Flows module - Operations over a set of generated books
//!
//! - combine: concatenate every book into one markdown document

pub mod combine;
