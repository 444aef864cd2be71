//! Engine configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file is
//! a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default limit on active frames
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pushing a frame past this depth is a RuntimeError
    pub max_call_depth: usize,
    /// Bytecode of the compiler module, needed to run source files
    pub bootstrap: Option<PathBuf>,
    /// Script arguments exposed as `sys.argv`
    #[serde(skip)]
    pub argv: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            bootstrap: None,
            argv: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Parse from TOML text
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load from a file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
    }

    #[test]
    fn test_fields() {
        let config = EngineConfig::from_toml(
            r#"
            max_call_depth = 64
            bootstrap = "build/compiler.pyc"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_call_depth, 64);
        assert_eq!(config.bootstrap, Some(PathBuf::from("build/compiler.pyc")));
        assert!(config.argv.is_empty());
    }

    #[test]
    fn test_rejects_bad_types() {
        assert!(EngineConfig::from_toml("max_call_depth = \"deep\"").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig {
            max_call_depth: 10,
            bootstrap: Some(PathBuf::from("boot.pyc")),
            argv: vec!["ignored".to_string()],
        };
        let text = config.to_toml().unwrap();
        let back = EngineConfig::from_toml(&text).unwrap();
        assert_eq!(back.max_call_depth, 10);
        assert_eq!(back.bootstrap, config.bootstrap);
        assert!(back.argv.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(EngineConfig::load(Path::new("/nonexistent/minipy.toml")).is_err());
    }
}
