//! Runtime configuration loaded from YAML.

use std::env;
use std::time::Duration;

use action_flow::RunnerConfig;
use action_primitives::{BoxFallback, InterpreterConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const PACING_ENV: &str = "PAGEPILOT_PACING_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("invalid viewport '{0}', expected WIDTHxHEIGHT")]
    Viewport(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pacing_ms: u64,
    pub click_revert_ms: u64,
    pub pulse_ms: u64,
    pub scroll_px_per_line: i64,
    pub default_scroll_lines: u32,
    pub default_wait_ms: u64,
    pub toast_ms: u64,
    pub toast_fade_ms: u64,
    pub box_fallback: BoxFallback,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pacing_ms: 500,
            click_revert_ms: 200,
            pulse_ms: 200,
            scroll_px_per_line: 20,
            default_scroll_lines: 10,
            default_wait_ms: 1000,
            toast_ms: 3000,
            toast_fade_ms: 500,
            box_fallback: BoxFallback::ViewportCenter,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scroll_px_per_line <= 0 {
            return Err(ConfigError::Invalid {
                key: "scroll_px_per_line",
                message: "must be positive".to_string(),
            });
        }
        if self.default_scroll_lines == 0 {
            return Err(ConfigError::Invalid {
                key: "default_scroll_lines",
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Apply `PAGEPILOT_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = env::var(PACING_ENV) {
            self.pacing_ms = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: PACING_ENV,
                message: format!("'{}' is not a number of milliseconds", raw),
            })?;
            info!(pacing_ms = self.pacing_ms, "pacing overridden from environment");
        }
        Ok(())
    }

    pub fn interpreter(&self) -> InterpreterConfig {
        InterpreterConfig {
            click_revert: Duration::from_millis(self.click_revert_ms),
            pulse: Duration::from_millis(self.pulse_ms),
            scroll_px_per_line: self.scroll_px_per_line,
            default_scroll_lines: self.default_scroll_lines,
            default_wait: Duration::from_millis(self.default_wait_ms),
            toast_lifetime: Duration::from_millis(self.toast_ms),
            toast_fade: Duration::from_millis(self.toast_fade_ms),
            box_fallback: self.box_fallback,
            ..InterpreterConfig::default()
        }
    }

    pub fn runner(&self) -> RunnerConfig {
        RunnerConfig {
            pacing: Duration::from_millis(self.pacing_ms),
        }
    }
}

/// Parse a `WIDTHxHEIGHT` viewport such as `1280x720`
pub fn parse_viewport(raw: &str) -> Result<pagepilot_core_types::Viewport, ConfigError> {
    let invalid = || ConfigError::Viewport(raw.to_string());
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: f64 = width.trim().parse().map_err(|_| invalid())?;
    let height: f64 = height.trim().parse().map_err(|_| invalid())?;
    if width <= 0.0 || height <= 0.0 {
        return Err(invalid());
    }
    Ok(pagepilot_core_types::Viewport::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("pacing_ms: 50\nbox_fallback: ignore\n").unwrap();
        assert_eq!(config.pacing_ms, 50);
        assert_eq!(config.box_fallback, BoxFallback::Ignore);
        assert_eq!(config.default_scroll_lines, 10);
        assert_eq!(config.runner().pacing, Duration::from_millis(50));
        assert_eq!(config.interpreter().box_fallback, BoxFallback::Ignore);
    }

    #[test]
    fn rejects_non_positive_scroll_step() {
        let config = Config {
            scroll_px_per_line: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: "scroll_px_per_line",
                ..
            })
        ));
    }

    #[test]
    fn parses_viewport() {
        let viewport = parse_viewport("800x600").unwrap();
        assert_eq!(viewport.width, 800.0);
        assert_eq!(viewport.height, 600.0);
        assert!(parse_viewport("800").is_err());
        assert!(parse_viewport("0x600").is_err());
        assert!(parse_viewport("wide x tall").is_err());
    }
}
