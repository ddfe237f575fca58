use std::io::ErrorKind;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    #[default]
    Elasticsearch,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub backend: SearchBackend,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_index")]
    pub index: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_refresh")]
    pub refresh: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: SearchBackend::default(),
            url: String::new(),
            index: default_index(),
            username: None,
            password: None,
            timeout_secs: default_timeout(),
            refresh: default_refresh(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_count")]
    pub count: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { count: default_seed_count() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogConfig {
    /// Emit JSON lines instead of the compact formatter.
    #[serde(default)]
    pub json: bool,
}

pub const DEFAULT_SEARCH_URL: &str = "http://localhost:9200";
const REFRESH_POLICIES: &[&str] = &["false", "true", "wait_for"];

fn default_index() -> String { "products".into() }
fn default_timeout() -> u64 { 30 }
fn default_refresh() -> String { "wait_for".into() }
fn default_seed_count() -> usize { 100 }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load `CONFIG_PATH` (default `config.toml`), then apply environment overrides.
    pub fn load_and_validate() -> Result<Self> {
        Self::load_and_validate_from(&config_path())
    }

    /// A missing file means defaults; an unreadable or malformed one is an error.
    pub fn load_and_validate_from(path: &str) -> Result<Self> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(content) => load_from_str(&content).with_context(|| format!("invalid config file {path}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e).with_context(|| format!("cannot read config file {path}")),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.apply_overrides(env_var)?;
        self.server.normalize()?;
        self.search.normalize_from_env();
        self.search.validate()?;
        self.seed.validate()?;
        Ok(())
    }

    /// `SERVER_HOST`, `SERVER_PORT` and `ELASTICSEARCH_INDEX` win over the file.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| anyhow!("SERVER_PORT `{port}` is not a valid port"))?;
        }
        if let Some(index) = lookup("ELASTICSEARCH_INDEX") {
            self.search.index = index;
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        Ok(())
    }
}

impl SearchConfig {
    /// Fill url and credentials from the environment when the file leaves them empty.
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            self.url = env_var("ELASTICSEARCH_URL").unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string());
        }
        if self.username.is_none() {
            self.username = env_var("ELASTICSEARCH_USERNAME");
        }
        if self.password.is_none() {
            self.password = env_var("ELASTICSEARCH_PASSWORD");
        }
        self.refresh = self.refresh.trim().to_lowercase();
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == SearchBackend::Elasticsearch {
            let lower = self.url.to_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(anyhow!("search.url must start with http:// or https://"));
            }
        }
        let index = self.index.as_str();
        if index.is_empty()
            || index.starts_with(['-', '_', '+'])
            || index.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace() || "\\/*?\"<>|,#:".contains(c))
        {
            return Err(anyhow!("search.index `{}` is not a valid index name", self.index));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("search.timeout_secs must be a positive number of seconds"));
        }
        if !REFRESH_POLICIES.contains(&self.refresh.as_str()) {
            return Err(anyhow!("search.refresh must be one of {:?}", REFRESH_POLICIES));
        }
        Ok(())
    }
}

impl SeedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(anyhow!("seed.count must be positive"));
        }
        Ok(())
    }
}
