use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Outbound feed fetch timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default)]
    pub date_format: DateFormatConfig,
    /// Feeds inserted into the store on startup when their URL is not stored yet
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

fn default_bind_address() -> String {
    "0.0.0.0:4004".to_string()
}

fn default_database_url() -> String {
    "sqlite:rss_reader.db?mode=rwc".to_string()
}

fn default_user_agent() -> String {
    "RssReader/1.0 (Feed Proxy)".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

/// How published dates are rendered for the reader.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DateFormatConfig {
    #[serde(default = "default_date_pattern")]
    pub date: String,
    #[serde(default = "default_time_pattern")]
    pub time: String,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_date_pattern() -> String {
    "%-m/%-d/%Y".to_string()
}

fn default_time_pattern() -> String {
    "%I:%M %p".to_string()
}

impl Default for DateFormatConfig {
    fn default() -> Self {
        Self {
            date: default_date_pattern(),
            time: default_time_pattern(),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_url: default_database_url(),
            user_agent: default_user_agent(),
            fetch_timeout_secs: None,
            static_dir: default_static_dir(),
            date_format: DateFormatConfig::default(),
            feeds: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `DATABASE_URL` and `PORT` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.bind_address = with_port(&self.bind_address, &port);
        }
        self
    }
}

fn with_port(bind_address: &str, port: &str) -> String {
    let host = bind_address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(bind_address);
    format!("{}:{}", host, port)
}
