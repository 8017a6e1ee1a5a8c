//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Typed errors for the library layers
//! - Run report model (Report, ReportItem)
//! - Rendering functions for different output formats
//! - Path normalization utilities
//! - File reading strategies
//! - Tree scanning
//! - Common utilities

pub mod error;
pub mod file_reader;
pub mod model;
pub mod paths;
pub mod render;
pub mod scan;
pub mod util;
