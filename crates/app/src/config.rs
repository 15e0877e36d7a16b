//! Application configuration
//!
//! Loaded from `config.toml` in the platform config directory. Every field is
//! optional; missing fields take their defaults.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use quizduel_core::QUESTION_SECONDS;
use quizduel_net::{TransferPolicy, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How the guest treats a question line it cannot parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicySetting {
    #[default]
    Lenient,
    Strict,
}

impl From<PolicySetting> for TransferPolicy {
    fn from(setting: PolicySetting) -> Self {
        match setting {
            PolicySetting::Lenient => TransferPolicy::Lenient,
            PolicySetting::Strict => TransferPolicy::Strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Asked for at startup when absent
    pub player_name: Option<String>,
    /// Port to host on and the default port to join
    pub port: u16,
    /// Question bank used for solo and hosted matches
    pub question_file: PathBuf,
    pub question_seconds: u32,
    pub transfer_policy: PolicySetting,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            player_name: None,
            port: DEFAULT_PORT,
            question_file: PathBuf::from("questions.txt"),
            question_seconds: QUESTION_SECONDS,
            transfer_policy: PolicySetting::Lenient,
        }
    }
}

impl AppConfig {
    /// Load from the platform config directory, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            debug!("No config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        Ok(config.sanitized())
    }

    fn config_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("dev", "quizduel", "quizduel")?;
        Some(dirs.config_dir().join(CONFIG_FILE))
    }

    /// Replace values that cannot work with their defaults
    fn sanitized(mut self) -> Self {
        if self.question_seconds == 0 {
            warn!("question_seconds must be at least 1, using default");
            self.question_seconds = QUESTION_SECONDS;
        }
        if let Some(name) = &self.player_name {
            if name.trim().is_empty() || name.contains(['\n', '\r']) {
                self.player_name = None;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(AppConfig::parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::parse(
            r#"
            player_name = "ann"
            port = 6000
            transfer_policy = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.player_name.as_deref(), Some("ann"));
        assert_eq!(config.port, 6000);
        assert_eq!(config.question_seconds, QUESTION_SECONDS);
        assert_eq!(
            TransferPolicy::from(config.transfer_policy),
            TransferPolicy::Strict
        );
    }

    #[test]
    fn test_zero_seconds_replaced() {
        let config = AppConfig::parse("question_seconds = 0").unwrap();
        assert_eq!(config.question_seconds, QUESTION_SECONDS);
    }

    #[test]
    fn test_blank_name_dropped() {
        let config = AppConfig::parse("player_name = \"  \"").unwrap();
        assert!(config.player_name.is_none());
    }

    #[test]
    fn test_bad_config_is_error() {
        assert!(matches!(
            AppConfig::parse("port = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "question_file = \"bank.txt\"\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.question_file, PathBuf::from("bank.txt"));
    }
}
