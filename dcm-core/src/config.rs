//! Configuration management.
//!
//! The configuration is a small JSON file read once at process start and
//! passed explicitly to the components that need it.

use crate::error::{DcmError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Runtime configuration for the daemon and CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    /// Location of the managed docker-compose.yml.
    pub docker_path: PathBuf,
    /// HTTP listen port.
    pub port: u16,
    /// Environment key copied from an inserted service into every service.
    /// `null` disables the broadcast.
    pub shared_secret_key: Option<String>,
    /// Compose CLI invocation, program first.
    pub compose_command: Vec<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docker_path: PathBuf::new(),
            port: 3000,
            shared_secret_key: Some("AUTH_KEY".to_string()),
            compose_command: vec!["docker".to_string(), "compose".to_string()],
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`DcmError::Io`] if the file cannot be read,
    /// [`DcmError::Format`] if it is not valid JSON, and
    /// [`DcmError::InvalidConfig`] if `DOCKER_PATH` is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DcmError::Io { path: path.to_path_buf(), source: e })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content).map_err(|e| DcmError::Format {
            reason: format!("Failed to parse config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.docker_path.as_os_str().is_empty() {
            return Err(DcmError::InvalidConfig { reason: "DOCKER_PATH is required".to_string() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = Config::parse(r#"{"DOCKER_PATH": "/srv/app/docker-compose.yml"}"#).unwrap();
        assert_eq!(config.docker_path, PathBuf::from("/srv/app/docker-compose.yml"));
        assert_eq!(config.port, 3000);
        assert_eq!(config.shared_secret_key.as_deref(), Some("AUTH_KEY"));
        assert_eq!(config.compose_command, vec!["docker", "compose"]);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"{
                "DOCKER_PATH": "stack.yml",
                "PORT": 8080,
                "SHARED_SECRET_KEY": null,
                "COMPOSE_COMMAND": ["docker-compose"],
                "LOG_LEVEL": "debug"
            }"#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.shared_secret_key, None);
        assert_eq!(config.compose_command, vec!["docker-compose"]);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_parse_requires_docker_path() {
        let err = Config::parse(r#"{"PORT": 8080}"#).unwrap_err();
        assert!(matches!(err, DcmError::InvalidConfig { .. }));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = Config::parse("{ DOCKER_PATH: ").unwrap_err();
        assert!(matches!(err, DcmError::Format { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"DOCKER_PATH": "docker-compose.yml", "PORT": 4000}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 4000);

        let missing = Config::load(temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, DcmError::Io { .. }));
    }
}
