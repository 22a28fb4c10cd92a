use anyhow::{Context, Result};
use api::{AuthConfig, AuthMethod, ContentSettings, PlatformSettings};
use posts::{BannerMode, MappingLayers};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Complete bridge configuration, loaded once at startup.
///
/// Sources, later wins: built-in defaults, the YAML config file, then
/// ARTICLAI_* environment variables (the names the original integration
/// used, so existing deployments carry over).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub content: ContentSettings,
    #[serde(default)]
    pub platform: PlatformSettings,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests per minute. Accepted for config compatibility; enforcement
    /// is left to the fronting proxy.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
}

fn default_prefix() -> String {
    "api/articlai".to_string()
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3030
}

fn default_rate_limit() -> u32 {
    60
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            bind: default_bind(),
            port: default_port(),
            rate_limit: default_rate_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_banner")]
    pub banner: BannerMode,
    #[serde(default)]
    pub field_mapping: MappingLayers,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/bridge.db")
}

fn default_table() -> String {
    "blogs".to_string()
}

fn default_banner() -> BannerMode {
    BannerMode::UrlOnly
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            table: default_table(),
            banner: default_banner(),
            field_mapping: MappingLayers::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("data/logs")
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from an optional YAML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => BridgeConfig::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(method) = env_var("ARTICLAI_AUTH_METHOD") {
            match method.as_str() {
                "api_key" => self.auth.method = AuthMethod::ApiKey,
                "bearer_token" => self.auth.method = AuthMethod::BearerToken,
                "basic_auth" => self.auth.method = AuthMethod::BasicAuth,
                other => tracing::warn!("Ignoring unknown ARTICLAI_AUTH_METHOD '{}'", other),
            }
        }
        if let Some(key) = env_var("ARTICLAI_API_KEY") {
            self.auth.api_key = Some(key);
        }
        if let Some(token) = env_var("ARTICLAI_BEARER_TOKEN") {
            self.auth.bearer_token = Some(token);
        }
        if let Some(username) = env_var("ARTICLAI_BASIC_USERNAME") {
            self.auth.username = Some(username);
        }
        if let Some(password) = env_var("ARTICLAI_BASIC_PASSWORD") {
            self.auth.password = Some(password);
        }

        if let Some(port) = env_var("ARTICLAI_PORT").and_then(|v| v.parse().ok()) {
            self.api.port = port;
        }
        if let Some(limit) = env_var("ARTICLAI_RATE_LIMIT").and_then(|v| v.parse().ok()) {
            self.api.rate_limit = limit;
        }

        if let Some(status) = env_var("ARTICLAI_DEFAULT_STATUS") {
            match posts::PostStatus::from_str(&status) {
                Ok(parsed) => self.content.default_status = parsed,
                Err(_) => tracing::warn!("Ignoring unknown ARTICLAI_DEFAULT_STATUS '{}'", status),
            }
        }
        if let Some(flag) = env_var("ARTICLAI_AUTO_GENERATE_SLUG").and_then(parse_bool) {
            self.content.auto_generate_slug = flag;
        }
        if let Some(flag) = env_var("ARTICLAI_SANITIZE_HTML").and_then(parse_bool) {
            self.content.sanitize_html = flag;
        }

        if let Some(name) = env_var("ARTICLAI_PLATFORM_NAME") {
            self.platform.name = name;
        }
        if let Some(version) = env_var("ARTICLAI_PLATFORM_VERSION") {
            self.platform.version = version;
        }
        if let Some(base_url) = env_var("ARTICLAI_BASE_URL") {
            self.platform.base_url = base_url;
        }

        if let Some(path) = env_var("ARTICLAI_DATABASE_PATH") {
            self.storage.database_path = PathBuf::from(path);
        }
        if let Some(table) = env_var("ARTICLAI_TABLE_NAME") {
            self.storage.table = table;
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_bool(value: String) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
