//! Editor configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::num::NonZeroUsize;

use crate::consts::{EXPORT_MULTIPLIER, MAX_CANVAS_HEIGHT, MAX_CANVAS_WIDTH};
use crate::object::Color;

pub const ENV_MAX_WIDTH: &str = "CERTBOARD_MAX_WIDTH";
pub const ENV_MAX_HEIGHT: &str = "CERTBOARD_MAX_HEIGHT";
pub const ENV_BACKGROUND: &str = "CERTBOARD_BACKGROUND";
pub const ENV_HISTORY_CAPACITY: &str = "CERTBOARD_HISTORY_CAPACITY";
pub const ENV_EXPORT_MULTIPLIER: &str = "CERTBOARD_EXPORT_MULTIPLIER";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Upper bound on the canvas width in pixels.
    pub max_width: f64,
    /// Upper bound on the canvas height in pixels.
    pub max_height: f64,
    /// Background for new and cleared scenes.
    pub background: Color,
    /// Snapshot limit; `None` keeps every snapshot.
    pub history_capacity: Option<NonZeroUsize>,
    /// Scale factor for exported bitmaps.
    pub export_multiplier: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_width: MAX_CANVAS_WIDTH,
            max_height: MAX_CANVAS_HEIGHT,
            background: Color::WHITE,
            history_capacity: None,
            export_multiplier: EXPORT_MULTIPLIER,
        }
    }
}

impl EditorConfig {
    /// Build typed editor config from environment variables.
    ///
    /// Optional:
    /// - `CERTBOARD_MAX_WIDTH`: default 1200
    /// - `CERTBOARD_MAX_HEIGHT`: default 800
    /// - `CERTBOARD_BACKGROUND`: hex color, default `#ffffff`
    /// - `CERTBOARD_HISTORY_CAPACITY`: snapshot limit, `0` or absent for unbounded
    /// - `CERTBOARD_EXPORT_MULTIPLIER`: default 2
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a variable that is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Build config from any key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a key that is present but unparsable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let max_width = parse_with(&lookup, ENV_MAX_WIDTH, parse_dimension)?.unwrap_or(defaults.max_width);
        let max_height = parse_with(&lookup, ENV_MAX_HEIGHT, parse_dimension)?.unwrap_or(defaults.max_height);
        let background =
            parse_with(&lookup, ENV_BACKGROUND, |raw| Color::parse_hex(raw).map_err(drop))?.unwrap_or(defaults.background);
        let history_capacity = parse_with(&lookup, ENV_HISTORY_CAPACITY, |raw| {
            raw.parse::<usize>().map(NonZeroUsize::new).map_err(drop)
        })?
        .flatten();
        let export_multiplier =
            parse_with(&lookup, ENV_EXPORT_MULTIPLIER, parse_dimension)?.unwrap_or(defaults.export_multiplier);

        Ok(Self { max_width, max_height, background, history_capacity, export_multiplier })
    }
}

/// Parse `var` if present. Blank values count as absent.
fn parse_with<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    parse: impl Fn(&str) -> Result<T, ()>,
) -> Result<Option<T>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse(trimmed).map(Some).map_err(|()| ConfigError::Invalid { var, value: raw.clone() })
}

/// A finite, strictly positive number.
fn parse_dimension(raw: &str) -> Result<f64, ()> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(()),
    }
}
