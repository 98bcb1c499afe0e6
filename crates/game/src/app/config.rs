use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub(crate) const CONFIG_ENV_VAR: &str = "POPS_CONFIG";
pub(crate) const TIER_PACK_ENV_VAR: &str = "POPS_TIERS";

type ConfigResult<T> = Result<T, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SessionConfig {
    #[serde(default = "default_grid_width")]
    pub(crate) grid_width: u32,
    #[serde(default = "default_grid_height")]
    pub(crate) grid_height: u32,
    /// Tier pack on disk; `None` uses the pack embedded in the binary.
    #[serde(default)]
    pub(crate) tier_defs_path: Option<PathBuf>,
    #[serde(default = "default_rng_seed")]
    pub(crate) rng_seed: u64,
    #[serde(default = "default_tick_seconds")]
    pub(crate) tick_seconds: f32,
    /// The auto-player gives up after this many gestures even if the board
    /// still has moves.
    #[serde(default = "default_max_gestures")]
    pub(crate) max_gestures: u32,
}

fn default_grid_width() -> u32 {
    5
}

fn default_grid_height() -> u32 {
    5
}

fn default_rng_seed() -> u64 {
    2024
}

fn default_tick_seconds() -> f32 {
    0.05
}

fn default_max_gestures() -> u32 {
    256
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
            tier_defs_path: None,
            rng_seed: default_rng_seed(),
            tick_seconds: default_tick_seconds(),
            max_gestures: default_max_gestures(),
        }
    }
}

impl SessionConfig {
    pub(crate) fn validate(&self) -> ConfigResult<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid_width, self.grid_height
            ));
        }
        if !self.tick_seconds.is_finite() || self.tick_seconds <= 0.0 {
            return Err(format!(
                "tick_seconds must be a positive number, got {}",
                self.tick_seconds
            ));
        }
        Ok(())
    }
}

/// Resolves the session config: `POPS_CONFIG` points at a JSON file,
/// otherwise the defaults apply. Parse failures report the JSON path that
/// failed, not just the line.
pub(crate) fn load_session_config() -> ConfigResult<SessionConfig> {
    let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
        return Ok(SessionConfig::default());
    };
    let path = PathBuf::from(path);
    let raw = fs::read_to_string(&path)
        .map_err(|source| format!("failed to read config {}: {source}", path.display()))?;
    let config = parse_session_config(&raw)
        .map_err(|message| format!("invalid config {}: {message}", path.display()))?;
    config.validate()?;
    Ok(config)
}

pub(crate) fn parse_session_config(raw: &str) -> ConfigResult<SessionConfig> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|error| format!("{} at {}", error.inner(), error.path()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_the_defaults() {
        let config = parse_session_config("{}").expect("config");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let config = parse_session_config(
            r#"{"grid_width": 4, "grid_height": 6, "rng_seed": 7, "max_gestures": 3}"#,
        )
        .expect("config");
        assert_eq!(config.grid_width, 4);
        assert_eq!(config.grid_height, 6);
        assert_eq!(config.rng_seed, 7);
        assert_eq!(config.max_gestures, 3);
        assert_eq!(config.tick_seconds, default_tick_seconds());
    }

    #[test]
    fn type_errors_name_the_failing_path() {
        let error = parse_session_config(r#"{"grid_width": "five"}"#).expect_err("error");
        assert!(error.contains("grid_width"), "{error}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(parse_session_config(r#"{"grid_widht": 4}"#).is_err());
    }

    #[test]
    fn zero_sized_grids_fail_validation() {
        let config = parse_session_config(r#"{"grid_width": 0}"#).expect("parse");
        assert!(config.validate().is_err());
    }
}
