//! PagePilot library
//!
//! Exposes the CLI building blocks for the binary and integration tests.

pub mod cli;
pub mod config;
pub mod loader;

#[cfg(feature = "chromium")]
pub mod chromium;

pub use config::{Config, ConfigError};
pub use loader::load_actions;
