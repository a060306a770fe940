//! CLI configuration file support
//!
//! Loads configuration from ~/.config/replayflow/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Code generation settings
    #[serde(default)]
    pub generate: GenerateConfig,
    /// Replay settings
    #[serde(default)]
    pub run: RunConfig,
}

/// Code generation configuration values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Default recorded workflow document
    pub workflow_path: Option<String>,
    /// Generated Playwright test spec target
    pub test_path: Option<String>,
    /// Generated standalone runner target
    pub runner_path: Option<String>,
}

/// Replay configuration values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Slow-motion delay between Playwright operations, in milliseconds
    pub slow_mo_ms: Option<u64>,
    /// Directory for screenshot artifacts
    pub artifacts_dir: Option<String>,
}

impl CliConfig {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("replayflow").join("config.toml"))
    }

    pub fn workflow_path(&self) -> PathBuf {
        self.generate
            .workflow_path
            .as_deref()
            .unwrap_or("recorded_workflow.json")
            .into()
    }

    pub fn test_path(&self) -> PathBuf {
        self.generate
            .test_path
            .as_deref()
            .unwrap_or("tests/workflow-automation.spec.js")
            .into()
    }

    pub fn runner_path(&self) -> PathBuf {
        self.generate
            .runner_path
            .as_deref()
            .unwrap_or("generated/workflow-runner.mjs")
            .into()
    }

    pub fn artifacts_dir(&self) -> String {
        self.run
            .artifacts_dir
            .clone()
            .unwrap_or_else(|| "test-results".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = CliConfig::load_from_path(Some(PathBuf::from("/nonexistent/config.toml")));
        assert_eq!(config.workflow_path(), PathBuf::from("recorded_workflow.json"));
        assert_eq!(
            config.test_path(),
            PathBuf::from("tests/workflow-automation.spec.js")
        );
        assert_eq!(config.artifacts_dir(), "test-results");
    }

    #[test]
    fn values_come_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[generate]
workflow_path = "recordings/session.json"
test_path = "out/spec.js"

[run]
slow_mo_ms = 500
artifacts_dir = "shots"
"#,
        )
        .unwrap();

        let config = CliConfig::load_from_path(Some(path));
        assert_eq!(
            config.workflow_path(),
            PathBuf::from("recordings/session.json")
        );
        assert_eq!(config.test_path(), PathBuf::from("out/spec.js"));
        assert_eq!(config.runner_path(), PathBuf::from("generated/workflow-runner.mjs"));
        assert_eq!(config.run.slow_mo_ms, Some(500));
        assert_eq!(config.artifacts_dir(), "shots");
    }
}
