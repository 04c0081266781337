//! Proxy configuration
//!
//! Defaults are overlaid by an optional YAML file (`CORS_PROXY_CONFIG`) and
//! finally by the `LISTEN` environment variable.

use anyhow::Context;
use serde::Deserialize;

/// Top-level configuration passed into the listener
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub proxy: ProxyConfig,
    pub cors: CorsConfig,
    pub version: VersionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the proxy listens on
    pub listen_addr: String,

    /// Upper bound on a buffered inbound request (headers + body)
    pub max_request_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            max_request_bytes: 10 * 1024 * 1024,
        }
    }
}

/// A header name/value pair, kept as a list so YAML order is preserved
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Copies an inbound header's value into an outbound header
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PassthroughHeader {
    /// Header name read from the inbound request
    pub from: String,
    /// Header name written on the outbound request
    pub to: String,
}

impl PassthroughHeader {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Header names the caller may override individually
    pub allowed_headers: Vec<String>,

    /// Browser-like defaults for the allow-listed headers
    pub default_headers: Vec<HeaderEntry>,

    /// Designated passthrough headers (e.g. `Authorization`, or `X-Cookie` -> `Cookie`)
    pub passthrough: Vec<PassthroughHeader>,

    /// Baseline User-Agent identifying the proxy
    pub user_agent: String,

    /// Outbound call timeout in seconds; `None` leaves the transport default
    pub timeout_secs: Option<u64>,
}

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.5 Safari/605.1.15";

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            allowed_headers: ["Accept", "Accept-Language", "Origin", "Referer", "User-Agent"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_headers: vec![
                HeaderEntry::new("Accept", "application/json"),
                HeaderEntry::new("Accept-Language", "en-US,en;q=0.9"),
                HeaderEntry::new("User-Agent", BROWSER_USER_AGENT),
            ],
            passthrough: vec![
                PassthroughHeader::new("Authorization", "Authorization"),
                PassthroughHeader::new("Bearer", "Bearer"),
            ],
            user_agent: concat!("cors-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: Some(60),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    /// Preflight cache lifetime in seconds
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_headers: [
                "Content-Type",
                "Authorization",
                "Bearer",
                "X-Requested-With",
                "Accept",
                "Accept-Language",
                "Origin",
                "Referer",
                "User-Agent",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_age: 86400,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    /// File holding the running version tag
    pub version_file: String,

    /// Releases endpoint returning `{"tag_name": ...}`
    pub releases_url: String,

    pub timeout_secs: u64,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            version_file: "VERSION".to_string(),
            releases_url: "https://api.github.com/repos/matej-podzemny/hotdesk-helper/releases/latest"
                .to_string(),
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from defaults, `CORS_PROXY_CONFIG` and `LISTEN`.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("CORS_PROXY_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_yaml(&raw).with_context(|| format!("Invalid config file {}", path))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
