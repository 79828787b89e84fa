//! Configuration loading and validation

use anyhow::Result;
use armlink_bridge::{DEFAULT_COMMAND_TOPIC, DEFAULT_POSE_TOPIC, DEFAULT_PUBLISH_RATE_HZ};
use armlink_core::{default_profiles, JointProfile};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default, rename = "joint")]
    pub joint_overrides: Vec<JointOverrideConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon: DaemonConfig::default(),
            bridge: BridgeConfig::default(),
            storage: StorageConfig::default(),
            ui: UiConfig::default(),
            joint_overrides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Bind address for the web server
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Frame rate of the control tick loop (scene events, animation,
    /// publishing) in Hz
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f64,
    /// TLS configuration (optional - enables HTTPS when present)
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            tick_rate_hz: default_tick_rate(),
            tls: None,
        }
    }
}

/// TLS/HTTPS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM format)
    pub cert: String,
    /// Path to private key file (PEM format)
    pub key: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_tick_rate() -> f64 {
    60.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Publish pose reports periodically without being asked
    #[serde(default = "default_true")]
    pub auto_publish: bool,
    /// Auto-publish rate in Hz
    #[serde(default = "default_publish_rate")]
    pub publish_rate_hz: f64,
    /// Topic commands arrive on
    #[serde(default = "default_command_topic")]
    pub command_topic: String,
    /// Topic pose reports go out on
    #[serde(default = "default_pose_topic")]
    pub pose_topic: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            auto_publish: true,
            publish_rate_hz: default_publish_rate(),
            command_topic: default_command_topic(),
            pose_topic: default_pose_topic(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_publish_rate() -> f64 {
    DEFAULT_PUBLISH_RATE_HZ
}

fn default_command_topic() -> String {
    DEFAULT_COMMAND_TOPIC.to_string()
}

fn default_pose_topic() -> String {
    DEFAULT_POSE_TOPIC.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the pose storage file
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Active-pose autosave interval in seconds (0 to disable)
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            autosave_interval_secs: default_autosave_interval(),
        }
    }
}

fn default_storage_path() -> String {
    "./armlink-poses.json".to_string()
}

fn default_autosave_interval() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Path to the static control-surface files
    #[serde(default = "default_ui_path")]
    pub path: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            path: default_ui_path(),
        }
    }
}

fn default_ui_path() -> String {
    "./web".to_string()
}

/// Per-joint override of the built-in table. Axis vectors are fixed by the
/// model geometry and cannot be overridden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointOverrideConfig {
    /// Joint name to match, e.g. "A2"
    pub name: String,
    pub home_offset_deg: Option<f64>,
    pub min_display_deg: Option<f64>,
    pub max_display_deg: Option<f64>,
}

impl Config {
    /// The built-in joint table with configuration overrides applied
    pub fn joint_profiles(&self) -> Vec<JointProfile> {
        let mut profiles = default_profiles();
        for override_cfg in &self.joint_overrides {
            match profiles
                .iter_mut()
                .find(|p| p.name.as_str() == override_cfg.name)
            {
                Some(profile) => {
                    if let Some(offset) = override_cfg.home_offset_deg {
                        profile.home_offset_deg = offset;
                    }
                    if let Some(min) = override_cfg.min_display_deg {
                        profile.min_display_deg = min;
                    }
                    if let Some(max) = override_cfg.max_display_deg {
                        profile.max_display_deg = max;
                    }
                }
                None => {
                    warn!(joint = %override_cfg.name, "Ignoring override for unknown joint")
                }
            }
        }
        profiles
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        joint_overrides: vec![JointOverrideConfig {
            name: "A2".to_string(),
            home_offset_deg: Some(-90.0),
            min_display_deg: None,
            max_display_deg: None,
        }],
        ..Config::default()
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.daemon.bind, "0.0.0.0:8080");
        assert_eq!(config.daemon.tick_rate_hz, 60.0);
        assert!(config.bridge.auto_publish);
        assert_eq!(config.bridge.pose_topic, "robot/pose");
        assert_eq!(config.joint_profiles().len(), 6);
    }

    #[test]
    fn test_joint_overrides_applied() {
        let config: Config = toml::from_str(
            r#"
            [[joint]]
            name = "A2"
            home_offset_deg = -45.0

            [[joint]]
            name = "A9"
            home_offset_deg = 1.0
            "#,
        )
        .unwrap();

        let profiles = config.joint_profiles();
        let a2 = profiles.iter().find(|p| p.name.as_str() == "A2").unwrap();
        assert_eq!(a2.home_offset_deg, -45.0);
        // Unmatched override changes nothing else
        assert_eq!(profiles.len(), 6);
    }

    #[test]
    fn test_partial_sections_parse() {
        let config: Config = toml::from_str(
            r#"
            [daemon]
            bind = "127.0.0.1:9000"

            [bridge]
            publish_rate_hz = 10.0
            "#,
        )
        .unwrap();
        assert_eq!(config.daemon.bind, "127.0.0.1:9000");
        assert_eq!(config.bridge.publish_rate_hz, 10.0);
        assert_eq!(config.bridge.command_topic, "robot/command");
        assert_eq!(config.storage.autosave_interval_secs, 5);
    }
}
