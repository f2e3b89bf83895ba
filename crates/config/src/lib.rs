//! Read-only configuration snapshot consumed by the wisp engine.
//!
//! The host loads or constructs a [`Config`] once and hands it to the engine;
//! the engine never mutates it. All fields have conservative defaults so an
//! empty configuration yields a working engine.

use serde::Deserialize;

mod error;

pub use error::{ConfigError, Result};

/// Preselect policy for the first ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preselect {
    /// Preselect only when the first candidate asks for it.
    #[default]
    Enable,
    /// Always preselect the first candidate.
    Always,
    /// Never preselect.
    Disable,
}

/// Engine configuration snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source names allowed to produce candidates. `None` enables all
    /// registered sources.
    pub enabled_sources: Option<Vec<String>>,
    /// Whether completion starts automatically while typing.
    pub autocomplete: bool,
    /// Whether documentation is requested for selected candidates.
    pub documentation: bool,
    /// Upper bound on how long a single source may stay in `Processing`
    /// before rendering proceeds without it, in milliseconds.
    pub source_timeout_ms: u64,
    /// Minimum interval between successive merge/render passes while a
    /// completion is already showing, in milliseconds.
    pub throttle_ms: u64,
    /// Preselect policy for the first ranked candidate.
    pub preselect: Preselect,
    /// Maximum rendered label width, in characters.
    pub max_label_width: usize,
    /// Maximum rendered kind width, in characters.
    pub max_kind_width: usize,
    /// Maximum rendered menu width, in characters.
    pub max_menu_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled_sources: None,
            autocomplete: true,
            documentation: true,
            source_timeout_ms: 500,
            throttle_ms: 80,
            preselect: Preselect::Enable,
            max_label_width: 60,
            max_kind_width: 12,
            max_menu_width: 40,
        }
    }
}

impl Config {
    /// Parse a configuration from a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(ConfigError::from)
    }

    /// Return true if the named source is enabled by this snapshot.
    pub fn is_source_enabled(&self, name: &str) -> bool {
        match &self.enabled_sources {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let cfg = Config::default();
        assert!(cfg.autocomplete);
        assert!(cfg.is_source_enabled("anything"));
        assert_eq!(cfg.preselect, Preselect::Enable);
    }

    #[test]
    fn enabled_sources_filters_by_name() {
        let cfg = Config {
            enabled_sources: Some(vec!["buffer".into(), "lsp".into()]),
            ..Config::default()
        };
        assert!(cfg.is_source_enabled("buffer"));
        assert!(!cfg.is_source_enabled("snippets"));
    }

    #[test]
    fn parses_partial_json() {
        let cfg = Config::from_json_str(r#"{"throttle_ms": 120, "preselect": "always"}"#)
            .expect("valid config");
        assert_eq!(cfg.throttle_ms, 120);
        assert_eq!(cfg.preselect, Preselect::Always);
        assert_eq!(cfg.source_timeout_ms, 500);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(Config::from_json_str("{nope").is_err());
    }
}
