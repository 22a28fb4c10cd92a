use crate::settings::PlatformSettings;
use posts::Post;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// Full canonical shape of a post, returned by GET /posts/{id}
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    /// Record id, rendered as a string
    pub id: String,
    /// Public URL built from base_url, url_prefix and the slug
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub focus_keyword: Option<String>,
    pub canonical_url: Option<String>,
    pub status: Option<String>,
    pub published_at: Option<String>,
    /// Always an object, never null
    #[schema(value_type = Object)]
    pub custom_fields: JsonValue,
    pub banner_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PostResponse {
    pub fn from_post(post: &Post, platform: &PlatformSettings) -> Self {
        Self {
            id: post.id.to_string(),
            url: post.url(&platform.base_url, &platform.url_prefix),
            title: owned(post, "title"),
            content: owned(post, "content"),
            excerpt: owned(post, "excerpt"),
            slug: owned(post, "slug"),
            meta_title: owned(post, "meta_title"),
            meta_description: owned(post, "meta_description"),
            focus_keyword: owned(post, "focus_keyword"),
            canonical_url: owned(post, "canonical_url"),
            status: owned(post, "status"),
            published_at: post.published_at().map(|dt| dt.to_rfc3339()),
            custom_fields: post.custom_fields(),
            banner_image: owned(post, "banner_url"),
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

fn owned(post: &Post, field: &str) -> Option<String> {
    post.str_field(field).map(|s| s.to_string())
}

/// Minimal shape returned after a create (201)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub status: Option<String>,
    pub created_at: String,
}

impl CreatedResponse {
    pub fn from_post(post: &Post, platform: &PlatformSettings) -> Self {
        Self {
            id: post.id.to_string(),
            url: post.url(&platform.base_url, &platform.url_prefix),
            title: owned(post, "title"),
            status: owned(post, "status"),
            created_at: post.created_at.to_rfc3339(),
        }
    }
}

/// Minimal shape returned after an update (200)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatedResponse {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub status: Option<String>,
    pub updated_at: String,
}

impl UpdatedResponse {
    pub fn from_post(post: &Post, platform: &PlatformSettings) -> Self {
        Self {
            id: post.id.to_string(),
            url: post.url(&platform.base_url, &platform.url_prefix),
            title: owned(post, "title"),
            status: owned(post, "status"),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

/// Paginated list envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResponse {
    pub data: Vec<PostResponse>,
    pub meta: ListMeta,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Response for GET /validate
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub success: bool,
    pub message: String,
    pub platform_info: PlatformInfo,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlatformInfo {
    pub name: String,
    pub version: String,
    pub capabilities: Vec<String>,
}

/// Query parameters for GET /posts
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub published: Option<bool>,
}
