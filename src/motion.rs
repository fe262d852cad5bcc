//! Motion-token resolution.
//!
//! The transition length comes from two theme tokens on the document root's
//! inline style and the user's reduced-motion preference:
//!
//! | Preference | Token | Fallback |
//! |------------|-------|----------|
//! | no preference | `--motion-duration-collapse` | `[motion] duration` (200ms) |
//! | reduce | `--motion-duration-collapse-reduced` | `[motion] reduced_duration` (0ms) |
//!
//! Resolution happens once, on first use, and is cached until
//! [`MotionTokens::reset`]. Later edits to the tokens are not picked up.

use crate::config::MotionConfig;
use crate::dom::Document;

pub const DURATION_TOKEN: &str = "--motion-duration-collapse";
pub const REDUCED_DURATION_TOKEN: &str = "--motion-duration-collapse-reduced";

/// Used when neither the token nor the configured fallback parses.
pub const DEFAULT_DURATION_MS: u64 = 200;

/// Longest accepted transition. Longer values are treated as unparseable.
pub const MAX_DURATION_MS: u64 = 60_000;

/// Parse a CSS `<time>`: `"200ms"`, `"0.2s"`, or a bare millisecond count
/// no longer than [`MAX_DURATION_MS`].
pub fn parse_duration_ms(value: &str) -> Option<u64> {
    let value = value.trim();
    let (number, scale) = if let Some(ms) = value.strip_suffix("ms") {
        (ms, 1.0)
    } else if let Some(s) = value.strip_suffix('s') {
        (s, 1000.0)
    } else {
        (value, 1.0)
    };
    let parsed: f64 = number.trim().parse().ok()?;
    let ms = (parsed * scale).round();
    (ms.is_finite() && (0.0..=MAX_DURATION_MS as f64).contains(&ms)).then_some(ms as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMotion {
    pub reduced: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct MotionTokens {
    config: MotionConfig,
    cached: Option<ResolvedMotion>,
}

impl MotionTokens {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            cached: None,
        }
    }

    pub fn resolve(&mut self, doc: &Document) -> ResolvedMotion {
        if let Some(resolved) = self.cached {
            return resolved;
        }
        let reduced = self.config.prefers_reduced_motion;
        let (token, fallback) = if reduced {
            (REDUCED_DURATION_TOKEN, &self.config.reduced_duration)
        } else {
            (DURATION_TOKEN, &self.config.duration)
        };

        let from_theme = root_token(doc, token).and_then(parse_duration_ms);
        let duration_ms = from_theme
            .or_else(|| parse_duration_ms(fallback))
            .unwrap_or(DEFAULT_DURATION_MS);

        let resolved = ResolvedMotion {
            reduced,
            duration_ms,
        };
        tracing::debug!(reduced, duration_ms, "resolved motion tokens");
        self.cached = Some(resolved);
        resolved
    }

    pub fn prefers_reduced_motion(&self) -> bool {
        self.config.prefers_reduced_motion
    }

    pub fn reset(&mut self) {
        self.cached = None;
    }
}

/// Theme tokens are read from the first element under the document root
/// (the `<html>` element of a page), falling back to the root itself.
fn root_token<'a>(doc: &'a Document, token: &str) -> Option<&'a str> {
    let root = doc.root();
    let html = doc.children(root).first().copied().unwrap_or(root);
    let value = doc.style(html, token);
    (!value.is_empty()).then_some(value)
}
