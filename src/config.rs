//! Controller configuration.
//!
//! Loaded from a TOML file layered over stock defaults: the file only needs
//! the keys it wants to change, and unknown keys are rejected to catch typos.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! enable_exclusive_groups = false   # accordion mode for [data-accordion-group]
//!
//! [motion]
//! prefers_reduced_motion = false    # stands in for the media query
//! duration = "200ms"                # fallback for --motion-duration-collapse
//! reduced_duration = "0ms"          # fallback for --motion-duration-collapse-reduced
//!
//! [debug]
//! logging = false                   # debug-level controller logs
//! print_events = false              # print lifecycle logs
//! ```
//!
//! Theme tokens set on the page's root element win over the `[motion]`
//! fallbacks; see [`crate::motion`].

use crate::motion::{MAX_DURATION_MS, parse_duration_ms};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Force-close open siblings in the same `[data-accordion-group]` when a
    /// card expands.
    pub enable_exclusive_groups: bool,
    pub motion: MotionConfig,
    pub debug: DebugConfig,
}

impl ControllerConfig {
    /// Validate values that serde alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("motion.duration", &self.motion.duration),
            ("motion.reduced_duration", &self.motion.reduced_duration),
        ] {
            if parse_duration_ms(value).is_none() {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a CSS time like \"200ms\" or \"0.2s\" \
                     of at most {MAX_DURATION_MS}ms, got {value:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Motion inputs the page environment would otherwise provide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionConfig {
    /// Equivalent of `(prefers-reduced-motion: reduce)` matching.
    pub prefers_reduced_motion: bool,
    /// Used when the root element has no `--motion-duration-collapse`.
    pub duration: String,
    /// Used when the root element has no `--motion-duration-collapse-reduced`.
    pub reduced_duration: String,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            prefers_reduced_motion: false,
            duration: "200ms".to_string(),
            reduced_duration: "0ms".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebugConfig {
    pub logging: bool,
    pub print_events: bool,
}

impl DebugConfig {
    /// `tracing` filter directives for these flags.
    pub fn filter_directives(&self) -> String {
        let mut directives = vec!["warn".to_string()];
        if self.logging {
            directives.push("card_expandable=debug".to_string());
        }
        if self.print_events {
            directives.push("card_expandable::print=debug".to_string());
        }
        directives.join(",")
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ControllerConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. A missing file is an
/// [`ConfigError::Io`] error.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ControllerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ControllerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, or stock defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ControllerConfig, ConfigError> {
    let overlay = match path {
        Some(p) => Some(load_raw_config(p)?),
        None => None,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Fully-commented stock config, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# card-expandable configuration
# =============================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Accordion mode: expanding a card inside a [data-accordion-group] container
# closes every other open card in that container first (without animation).
enable_exclusive_groups = false

# ---------------------------------------------------------------------------
# Motion
# ---------------------------------------------------------------------------
[motion]
# Stand-in for the (prefers-reduced-motion: reduce) media query. When true,
# collapses never animate and expands settle after `reduced_duration`.
prefers_reduced_motion = false

# Transition length when the page root does not set
# --motion-duration-collapse. Accepts "ms" and "s" units.
duration = "200ms"

# Transition length under reduced motion when the page root does not set
# --motion-duration-collapse-reduced.
reduced_duration = "0ms"

# ---------------------------------------------------------------------------
# Diagnostics (the CARD_EXPANDABLE_LOG variable overrides both)
# ---------------------------------------------------------------------------
[debug]
# Debug-level logs for registration, transitions and accordion closes.
logging = false

# Logs for the beforeprint/afterprint snapshot and restore.
print_events = false
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ControllerConfig::default();
        assert!(!config.enable_exclusive_groups);
        assert!(!config.motion.prefers_reduced_motion);
        assert_eq!(config.motion.duration, "200ms");
        assert_eq!(config.motion.reduced_duration, "0ms");
        assert!(!config.debug.logging);
    }

    #[test]
    fn parse_partial_config() {
        let config: ControllerConfig = toml::from_str(
            r#"
[motion]
duration = "350ms"
"#,
        )
        .unwrap();
        assert_eq!(config.motion.duration, "350ms");
        assert_eq!(config.motion.reduced_duration, "0ms");
        assert!(!config.enable_exclusive_groups);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<ControllerConfig, _> = toml::from_str("enable_exclusive = true");
        assert!(result.is_err());
    }

    #[test]
    fn stock_config_toml_round_trips_to_defaults() {
        let config: ControllerConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn merge_keeps_base_keys_missing_from_overlay() {
        let overlay: toml::Value =
            toml::from_str("[motion]\nprefers_reduced_motion = true").unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert!(config.motion.prefers_reduced_motion);
        assert_eq!(config.motion.duration, "200ms");
    }

    #[test]
    fn validation_rejects_bad_durations() {
        let overlay: toml::Value = toml::from_str("[motion]\nduration = \"quick\"").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_overlong_durations() {
        let overlay: toml::Value = toml::from_str("[motion]\nduration = \"1e300s\"").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        let Err(ConfigError::Validation(message)) = result else {
            panic!("expected validation error, got {result:?}");
        };
        assert!(message.contains("motion.duration"));
    }

    #[test]
    fn load_config_without_path_is_default() {
        assert_eq!(load_config(None).unwrap(), ControllerConfig::default());
    }

    #[test]
    fn load_config_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(tmp.path().join("cards.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cards.toml");
        fs::write(
            &path,
            r#"
enable_exclusive_groups = true

[debug]
print_events = true
"#,
        )
        .unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert!(config.enable_exclusive_groups);
        assert!(config.debug.print_events);
        assert!(!config.debug.logging);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cards.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(Some(path.as_path())), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn filter_directives_follow_debug_flags() {
        assert_eq!(DebugConfig::default().filter_directives(), "warn");
        let both = DebugConfig {
            logging: true,
            print_events: true,
        };
        assert_eq!(
            both.filter_directives(),
            "warn,card_expandable=debug,card_expandable::print=debug"
        );
    }
}
