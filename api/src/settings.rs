use posts::PostStatus;
use serde::{Deserialize, Serialize};

/// Content behavior settings applied during validation and persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSettings {
    /// Status applied when a request carries none
    #[serde(default = "default_status")]
    pub default_status: PostStatus,
    /// Statuses a request is allowed to set
    #[serde(default = "default_allowed_statuses")]
    pub allowed_statuses: Vec<PostStatus>,
    /// Generate a slug from the title when none is supplied
    #[serde(default = "default_true")]
    pub auto_generate_slug: bool,
    /// Run incoming HTML content through the sanitizer
    #[serde(default = "default_true")]
    pub sanitize_html: bool,
    /// Tag allowlist used when sanitize_html is on
    #[serde(default = "default_allowed_html_tags")]
    pub allowed_html_tags: Vec<String>,
}

fn default_status() -> PostStatus {
    PostStatus::Published
}

fn default_allowed_statuses() -> Vec<PostStatus> {
    PostStatus::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

fn default_allowed_html_tags() -> Vec<String> {
    [
        "p", "br", "strong", "em", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li",
        "a", "img", "blockquote", "code", "pre",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            default_status: default_status(),
            allowed_statuses: default_allowed_statuses(),
            auto_generate_slug: default_true(),
            sanitize_html: default_true(),
            allowed_html_tags: default_allowed_html_tags(),
        }
    }
}

/// Identity reported by the connection validation endpoint and used to
/// build public post URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSettings {
    #[serde(default = "default_platform_name")]
    pub name: String,
    #[serde(default = "default_platform_version")]
    pub version: String,
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
    /// Site root, e.g. https://blog.example.com
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path segment prepended to slugs in public URLs, e.g. "blog"
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

fn default_platform_name() -> String {
    "ArticlAI Bridge".to_string()
}

fn default_platform_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_capabilities() -> Vec<String> {
    ["create", "update", "delete"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_base_url() -> String {
    "http://localhost".to_string()
}

fn default_url_prefix() -> String {
    "blog".to_string()
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            name: default_platform_name(),
            version: default_platform_version(),
            capabilities: default_capabilities(),
            base_url: default_base_url(),
            url_prefix: default_url_prefix(),
        }
    }
}
