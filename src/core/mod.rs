//! Shared primitives for the validator.
//!
//! Errors, configuration, logging setup, output helpers and run identifiers
//! live here; nothing in this module knows about roadmaps or source code.

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod time;
