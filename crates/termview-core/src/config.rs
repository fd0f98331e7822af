//! Configuration types for termview.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Title shown while the remote session has not reported one.
pub const DEFAULT_TITLE: &str = "Fluent Terminal";

/// Controller configuration loaded from YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ControllerConfig {
    /// Per-session settings
    pub session: SessionSettings,
    /// Host process settings
    pub host: HostSettings,
}

impl ControllerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ControllerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        self.session.validate()
    }
}

/// Per-session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Title used when none is reported or a blank one is
    pub default_title: String,
    /// How long the resize overlay stays visible after the last resize
    pub overlay_duration_ms: u64,
    /// Bound on the session creation round trip
    pub handshake_timeout_ms: u64,
    /// Capacity of the controller's command queue
    pub command_queue_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
            overlay_duration_ms: 2000,
            handshake_timeout_ms: 30000,
            command_queue_capacity: 64,
        }
    }
}

impl SessionSettings {
    /// Validate session settings.
    pub fn validate(&self) -> Result<()> {
        if self.default_title.trim().is_empty() {
            return Err(Error::Config(
                "session.default_title cannot be blank".to_string(),
            ));
        }

        if self.overlay_duration_ms == 0 {
            return Err(Error::Config(
                "session.overlay_duration_ms must be > 0".to_string(),
            ));
        }

        if self.handshake_timeout_ms == 0 {
            return Err(Error::Config(
                "session.handshake_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.command_queue_capacity == 0 {
            return Err(Error::Config(
                "session.command_queue_capacity must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Resize overlay duration.
    pub fn overlay_duration(&self) -> Duration {
        Duration::from_millis(self.overlay_duration_ms)
    }

    /// Session creation timeout.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

/// Host process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Startup directory handed to the first session
    pub startup_directory: Option<String>,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            startup_directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert_eq!(config.session.default_title, DEFAULT_TITLE);
        assert_eq!(config.session.overlay_duration(), Duration::from_secs(2));
        assert_eq!(config.session.handshake_timeout(), Duration::from_secs(30));
        assert_eq!(config.host.log_level, "info");
    }

    #[test]
    fn test_config_validation() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_default_title() {
        let mut config = ControllerConfig::default();
        config.session.default_title = "  ".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_overlay_duration() {
        let mut config = ControllerConfig::default();
        config.session.overlay_duration_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_handshake_timeout() {
        let mut config = ControllerConfig::default();
        config.session.handshake_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut config = ControllerConfig::default();
        config.session.command_queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
session:
  default_title: "Shell"
  overlay_duration_ms: 1500
  handshake_timeout_ms: 5000
  command_queue_capacity: 16

host:
  log_level: debug
  startup_directory: /tmp/work
"#;

        let config = ControllerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.session.default_title, "Shell");
        assert_eq!(config.session.overlay_duration_ms, 1500);
        assert_eq!(config.session.handshake_timeout_ms, 5000);
        assert_eq!(config.session.command_queue_capacity, 16);
        assert_eq!(config.host.log_level, "debug");
        assert_eq!(config.host.startup_directory.as_deref(), Some("/tmp/work"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ControllerConfig::from_yaml("session:\n  overlay_duration_ms: 500\n").unwrap();
        assert_eq!(config.session.overlay_duration_ms, 500);
        assert_eq!(config.session.default_title, DEFAULT_TITLE);
        assert_eq!(config.host.log_level, "info");
    }

    #[test]
    fn test_invalid_yaml_value_rejected() {
        let result = ControllerConfig::from_yaml("session:\n  overlay_duration_ms: 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_yaml() {
        let result = ControllerConfig::from_yaml("session: [unclosed");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }
}
