// ABOUTME: Library root for strata - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod artifacts;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod layers;
pub mod output;
pub mod poll;
pub mod remote;
pub mod status;
pub mod types;
