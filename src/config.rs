// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "NOVELTY_CONFIG_PATH";
pub const ENV_WINDOW_SECS: &str = "NOVELTY_DUPLICATE_WINDOW_SECS";

/// One day. Title matches further apart than this are treated as new stories.
pub const DEFAULT_DUPLICATE_WINDOW_SECS: i64 = 86_400;

/// Title matches two days apart must never be duplicates.
const MAX_DUPLICATE_WINDOW_SECS: i64 = 2 * 86_400;

fn default_window_secs() -> i64 {
    DEFAULT_DUPLICATE_WINDOW_SECS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoveltyConfig {
    /// Publish dates of two same-titled stories must differ by strictly less
    /// than this for the later one to count as a duplicate.
    #[serde(default = "default_window_secs")]
    pub duplicate_window_secs: i64,
}

impl Default for NoveltyConfig {
    fn default() -> Self {
        Self {
            duplicate_window_secs: DEFAULT_DUPLICATE_WINDOW_SECS,
        }
    }
}

impl NoveltyConfig {
    pub fn with_window_secs(secs: i64) -> Result<Self> {
        let cfg = Self {
            duplicate_window_secs: secs,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn duplicate_window(&self) -> Duration {
        Duration::seconds(self.duplicate_window_secs)
    }

    pub fn validate(&self) -> Result<()> {
        let w = self.duplicate_window_secs;
        if !(0..MAX_DUPLICATE_WINDOW_SECS).contains(&w) {
            bail!("duplicate_window_secs must be in [0, {MAX_DUPLICATE_WINDOW_SECS}), got {w}");
        }
        Ok(())
    }

    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading novelty config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing novelty config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks, then apply the window override:
    /// 1) $NOVELTY_CONFIG_PATH
    /// 2) config/novelty.toml
    /// 3) config/novelty.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = Self::load_file_default()?;

        if let Ok(raw) = std::env::var(ENV_WINDOW_SECS) {
            cfg.duplicate_window_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_WINDOW_SECS}='{raw}' is not an integer"))?;
        }

        cfg.validate()?;
        tracing::debug!(
            target: "novelty::config",
            window_secs = cfg.duplicate_window_secs,
            "novelty config loaded"
        );
        Ok(cfg)
    }

    fn load_file_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from("config/novelty.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/novelty.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::default())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<NoveltyConfig> {
    if hint_ext == "json" || s.trim_start().starts_with('{') {
        return serde_json::from_str(s).map_err(Into::into);
    }
    toml::from_str(s).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_formats_and_defaults_missing_keys() {
        let t = parse_config("duplicate_window_secs = 3600", "toml").unwrap();
        assert_eq!(t.duplicate_window_secs, 3600);
        let j = parse_config(r#"{"duplicate_window_secs": 60}"#, "").unwrap();
        assert_eq!(j.duplicate_window_secs, 60);
        let empty = parse_config("", "toml").unwrap();
        assert_eq!(empty, NoveltyConfig::default());
    }

    #[test]
    fn window_must_stay_below_two_days() {
        assert!(NoveltyConfig::with_window_secs(0).is_ok());
        assert!(NoveltyConfig::with_window_secs(2 * 86_400 - 1).is_ok());
        assert!(NoveltyConfig::with_window_secs(2 * 86_400).is_err());
        assert!(NoveltyConfig::with_window_secs(-1).is_err());
        assert_eq!(NoveltyConfig::default().duplicate_window(), Duration::days(1));
    }
}
