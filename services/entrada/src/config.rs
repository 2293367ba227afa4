//! Configuration types for the entrada service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Reject values the service cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.hub.group.trim().is_empty() {
            return Err(crate::EntradaError::Config(
                "hub.group must not be empty".to_string(),
            ));
        }
        if self.hub.event.trim().is_empty() {
            return Err(crate::EntradaError::Config(
                "hub.event must not be empty".to_string(),
            ));
        }
        if self.hub.keepalive_interval.is_zero() {
            return Err(crate::EntradaError::Config(
                "hub.keepalive_interval must be greater than zero".to_string(),
            ));
        }
        if self.hub.connect_timeout.is_zero() {
            return Err(crate::EntradaError::Config(
                "hub.connect_timeout must be greater than zero".to_string(),
            ));
        }
        if self.api.request_timeout.is_zero() {
            return Err(crate::EntradaError::Config(
                "api.request_timeout must be greater than zero".to_string(),
            ));
        }
        if let Err(e) = reqwest::Url::parse(&self.api.base_url) {
            return Err(crate::EntradaError::Config(format!(
                "api.base_url {:?} is not a valid URL: {}",
                self.api.base_url, e
            )));
        }
        if self.dashboard.history_size == 0 {
            return Err(crate::EntradaError::Config(
                "dashboard.history_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Real-time hub connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_hub_url")]
    pub url: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default = "default_event")]
    pub event: String,
    #[serde(default = "default_join_method")]
    pub join_method: String,
    #[serde(default = "default_leave_method")]
    pub leave_method: String,
    #[serde(default)]
    pub skip_negotiation: bool,
    #[serde(default = "default_keepalive_interval", with = "humantime_serde")]
    pub keepalive_interval: Duration,
    /// Bound on negotiation, websocket upgrade and handshake together
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: default_hub_url(),
            group: default_group(),
            event: default_event(),
            join_method: default_join_method(),
            leave_method: default_leave_method(),
            skip_negotiation: false,
            keepalive_interval: default_keepalive_interval(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Product and image lookup API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_placeholder_image_url")]
    pub placeholder_image_url: String,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            placeholder_image_url: default_placeholder_image_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            history_size: default_history_size(),
        }
    }
}

fn default_hub_url() -> String {
    "http://localhost:5239/message".to_string()
}

fn default_group() -> String {
    "EntradaPT".to_string()
}

fn default_event() -> String {
    "sendEpc".to_string()
}

fn default_join_method() -> String {
    "JoinGroup".to_string()
}

fn default_leave_method() -> String {
    "LeaveGroup".to_string()
}

fn default_keepalive_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_api_base_url() -> String {
    "http://172.16.10.31".to_string()
}

fn default_placeholder_image_url() -> String {
    "https://www.jnfac.or.kr/img/noimage.jpg".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_history_size() -> usize {
    100
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::EntradaError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
