use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: i64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_tick_rate")]
    pub tick_rate_fps: f64,
    /// Appended to the terminal title as `/u/{name} - {site_name}`.
    #[serde(default)]
    pub site_name: Option<String>,
    /// Profile path opened when `tui` is started without one.
    #[serde(default)]
    pub default_path: Option<String>,
}

fn default_server_url() -> String {
    "ws://localhost:8536/api/v1/ws".to_string()
}

fn default_fetch_limit() -> i64 {
    20
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_max_retries() -> u32 {
    10
}

fn default_tick_rate() -> f64 {
    30.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            fetch_limit: default_fetch_limit(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retries: default_max_retries(),
            tick_rate_fps: default_tick_rate(),
            site_name: None,
            default_path: None,
        }
    }
}

impl AppConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Root of the web UI served by the same instance as `server_url`.
    pub fn web_base(&self) -> Option<Url> {
        let mut url = Url::parse(&self.server_url).ok()?;
        let scheme = match url.scheme() {
            "ws" => "http",
            "wss" => "https",
            other => other,
        }
        .to_owned();
        url.set_scheme(&scheme).ok()?;
        url.set_path("/");
        url.set_query(None);
        Some(url)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/profiletui/config.toml"))
}

pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        return AppConfig::default();
    };

    let Ok(contents) = fs::read_to_string(&path) else {
        return AppConfig::default();
    };

    parse_config(&contents)
}

fn parse_config(contents: &str) -> AppConfig {
    toml::from_str(contents).unwrap_or_else(|e| {
        tracing::warn!("ignoring malformed config: {e}");
        AppConfig::default()
    })
}
