//! Cache module - Shared source cache for include resolution

pub mod source;
