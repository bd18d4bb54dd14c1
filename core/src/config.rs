//! Client configuration: service host, request logging and the scoped host
//! override used by `SheldonClient::with_host`.

use serde::{Deserialize, Deserializer};

pub const DEFAULT_HOST: &str = "http://sheldon.staging.moviepilot.com:2311";

/// Settings held by a `SheldonClient`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_host", deserialize_with = "deserialize_host")]
    host: String,
    #[serde(default)]
    log: bool,
    #[serde(skip)]
    temp_host: Option<String>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn deserialize_host<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let host = String::deserialize(deserializer)?;
    Ok(normalize_host(&host))
}

fn normalize_host(host: &str) -> String {
    host.trim_end_matches('/').to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            log: false,
            temp_host: None,
        }
    }
}

impl Config {
    pub fn new(host: &str) -> Self {
        Self {
            host: normalize_host(host),
            ..Self::default()
        }
    }

    /// Defaults overridden by `SHELDON_HOST` and `SHELDON_LOG`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("SHELDON_HOST") {
            config.set_host(&host);
        }
        if let Ok(log) = std::env::var("SHELDON_LOG") {
            config.log = parse_flag(&log);
        }
        config
    }

    /// The host requests go to: the temporary host if one is installed,
    /// otherwise the configured one.
    pub fn host(&self) -> &str {
        self.temp_host.as_deref().unwrap_or(&self.host)
    }

    /// The configured host, ignoring any temporary override.
    pub fn configured_host(&self) -> &str {
        &self.host
    }

    pub fn set_host(&mut self, host: &str) {
        self.host = normalize_host(host);
    }

    pub fn log(&self) -> bool {
        self.log
    }

    pub fn set_log(&mut self, log: bool) {
        self.log = log;
    }

    pub fn temp_host(&self) -> Option<&str> {
        self.temp_host.as_deref()
    }

    pub(crate) fn set_temp_host(&mut self, host: Option<&str>) {
        self.temp_host = host.map(normalize_host);
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
