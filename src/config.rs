//! File-backed settings for the player binary.
//!
//! ```toml
//! seed = 42
//! max_moves = 500
//!
//! [search]
//! depth = 4
//! sample_cells = 8
//! cache = "exact-only"
//!
//! [search.weights]
//! empty = 2.5
//! ```
//!
//! Missing keys fall back to their defaults; unknown keys are rejected.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::search::SearchConfig;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("toml serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("search depth {0} is outside 1..=8")]
    Depth(u32),
    #[error("sample_cells must be at least 1")]
    SampleCells,
    #[error("heuristic weight `{0}` is not finite")]
    Weight(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Seed for both tile spawns and search sampling; random when absent.
    pub seed: Option<u64>,
    /// Stop the game after this many moves.
    pub max_moves: Option<u64>,
    pub search: SearchConfig,
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.search.validate()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::CachePolicy;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let text = r#"
            seed = 42

            [search]
            depth = 4
            cache = "exact-only"

            [search.weights]
            empty = 2.5
        "#;
        let cfg = AppConfig::from_toml_str(text).unwrap();
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.max_moves, None);
        assert_eq!(cfg.search.depth, 4);
        assert_eq!(cfg.search.sample_cells, 6);
        assert_eq!(cfg.search.cache, CachePolicy::ExactOnly);
        assert_eq!(cfg.search.weights.empty, 2.5);
        assert_eq!(cfg.search.weights.monotonicity, 1.5);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(AppConfig::from_toml_str("[search]\ndepth = 9\n"), Err(ConfigError::Depth(9))));
        assert!(matches!(
            AppConfig::from_toml_str("[search]\nsample_cells = 0\n"),
            Err(ConfigError::SampleCells)
        ));
        assert!(matches!(AppConfig::from_toml_str("[search]\nbreadth = 2\n"), Err(ConfigError::Parse(_))));
        assert!(matches!(AppConfig::from_toml_str("[search]\ncache = \"lru\"\n"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn serialized_config_parses_back() {
        let cfg = AppConfig {
            seed: Some(7),
            max_moves: Some(100),
            search: SearchConfig { depth: 5, pruning: false, cache: CachePolicy::Disabled, ..Default::default() },
        };
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::load("/nonexistent/hybrid-2048.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
