//! Command implementations for the Codex CLI
//!
//! Each command lives in its own module.

pub mod analyze;
pub mod cleanup;
pub mod config;
pub mod history;
pub mod interactive;
