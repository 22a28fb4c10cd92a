use crate::PostStatus;
use chrono::{DateTime, NaiveDateTime, Utc};
use mapping::FieldMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A post as seen through the canonical field vocabulary.
///
/// `fields` is keyed by canonical field names; the storage column names
/// never leak past the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub fields: FieldMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Fetch a canonical field as a non-empty string
    pub fn str_field(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(JsonValue::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn slug(&self) -> Option<&str> {
        self.str_field("slug")
    }

    pub fn status(&self) -> Option<PostStatus> {
        self.str_field("status").and_then(|s| s.parse().ok())
    }

    /// Parse the published_at field, accepting RFC 3339 or the bare
    /// `YYYY-MM-DD HH:MM:SS` form SQLite timestamps use
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.str_field("published_at")?)
    }

    /// Custom fields as a JSON object; absent or malformed values collapse
    /// to an empty object
    pub fn custom_fields(&self) -> JsonValue {
        match self.fields.get("custom_fields") {
            Some(JsonValue::Object(map)) => JsonValue::Object(map.clone()),
            Some(JsonValue::String(raw)) => serde_json::from_str(raw)
                .ok()
                .filter(JsonValue::is_object)
                .unwrap_or_else(|| JsonValue::Object(Default::default())),
            _ => JsonValue::Object(Default::default()),
        }
    }

    /// The published predicate: status is `published` and the publish date,
    /// when set, is not in the future
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        if self.status() != Some(PostStatus::Published) {
            return false;
        }
        match self.str_field("published_at") {
            None => true,
            Some(raw) => match parse_timestamp(raw) {
                Some(published_at) => published_at <= now,
                None => false,
            },
        }
    }

    /// Public URL for this post under the host site's blog prefix
    pub fn url(&self, base_url: &str, url_prefix: &str) -> String {
        format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            url_prefix.trim_matches('/'),
            self.slug().unwrap_or("")
        )
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
