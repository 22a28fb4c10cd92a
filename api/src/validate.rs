use crate::{
    error::{ApiError, FieldErrors},
    settings::ContentSettings,
};
use ammonia::Builder;
use chrono::Utc;
use mapping::{is_valid_slug, FieldMap};
use posts::PostStatus;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::str::FromStr;

/// A payload that passed validation, ready for the store
#[derive(Debug)]
pub struct ValidatedPost {
    /// Canonical fields to persist
    pub fields: FieldMap,
    /// Banner image URL, handled separately from the row write
    pub banner_image: Option<String>,
}

/// Validate a create payload. Applies defaults first (status, published_at),
/// then checks every rule, collecting failures per field instead of stopping
/// at the first one.
pub fn validate_create(
    payload: &JsonValue,
    settings: &ContentSettings,
) -> Result<ValidatedPost, ApiError> {
    let mut payload = as_object(payload)?;
    apply_defaults(&mut payload, settings);
    validate_fields(payload, settings, true)
}

/// Validate an update payload. Same rules as create with every field
/// optional; no defaults are applied.
pub fn validate_update(
    payload: &JsonValue,
    settings: &ContentSettings,
) -> Result<ValidatedPost, ApiError> {
    let payload = as_object(payload)?;
    validate_fields(payload, settings, false)
}

fn as_object(payload: &JsonValue) -> Result<serde_json::Map<String, JsonValue>, ApiError> {
    match payload {
        JsonValue::Object(map) => Ok(map.clone()),
        _ => {
            let mut errors = FieldErrors::new();
            errors.insert(
                "body".to_string(),
                vec!["Request body must be a JSON object".to_string()],
            );
            Err(ApiError::Validation(errors))
        }
    }
}

fn apply_defaults(payload: &mut serde_json::Map<String, JsonValue>, settings: &ContentSettings) {
    if !payload.contains_key("status") {
        payload.insert(
            "status".to_string(),
            JsonValue::String(settings.default_status.as_str().to_string()),
        );
    }

    let is_published = payload
        .get("status")
        .and_then(|v| v.as_str())
        .map(|s| s == PostStatus::Published.as_str())
        .unwrap_or(false);

    if is_published && !payload.contains_key("published_at") {
        payload.insert(
            "published_at".to_string(),
            JsonValue::String(Utc::now().to_rfc3339()),
        );
    }
}

fn validate_fields(
    payload: serde_json::Map<String, JsonValue>,
    settings: &ContentSettings,
    require_core: bool,
) -> Result<ValidatedPost, ApiError> {
    let mut errors = FieldErrors::new();
    let mut fields = FieldMap::new();

    check_string(&payload, "title", 255, &mut fields, &mut errors);
    if require_core && !payload.contains_key("title") {
        push_error(&mut errors, "title", "Title is required");
    }

    check_string(&payload, "content", usize::MAX, &mut fields, &mut errors);
    if require_core && !payload.contains_key("content") {
        push_error(&mut errors, "content", "Content is required");
    }

    check_string(&payload, "excerpt", 1000, &mut fields, &mut errors);
    check_string(&payload, "meta_title", 255, &mut fields, &mut errors);
    check_string(&payload, "meta_description", 500, &mut fields, &mut errors);
    check_string(&payload, "focus_keyword", 100, &mut fields, &mut errors);

    if let Some(value) = payload.get("slug") {
        match value.as_str() {
            Some(slug) if slug.chars().count() <= 255 && is_valid_slug(slug) => {
                fields.insert("slug".to_string(), value.clone());
            }
            Some(slug) if slug.chars().count() > 255 => {
                push_error(&mut errors, "slug", "Slug must not exceed 255 characters");
            }
            _ => push_error(
                &mut errors,
                "slug",
                "Slug must contain only lowercase letters, numbers, and hyphens",
            ),
        }
    }

    if let Some(value) = payload.get("canonical_url") {
        match value.as_str() {
            Some(url) if url.chars().count() > 500 => {
                push_error(
                    &mut errors,
                    "canonical_url",
                    "Canonical URL must not exceed 500 characters",
                );
            }
            Some(url) if is_url(url) => {
                fields.insert("canonical_url".to_string(), value.clone());
            }
            _ => push_error(
                &mut errors,
                "canonical_url",
                "Canonical URL must be a valid URL",
            ),
        }
    }

    if let Some(value) = payload.get("published_at") {
        match value.as_str().and_then(parse_date) {
            Some(normalized) => {
                fields.insert("published_at".to_string(), JsonValue::String(normalized));
            }
            None => push_error(
                &mut errors,
                "published_at",
                "Published date must be a valid date",
            ),
        }
    }

    if let Some(value) = payload.get("custom_fields") {
        if value.is_object() {
            fields.insert("custom_fields".to_string(), value.clone());
        } else {
            push_error(&mut errors, "custom_fields", "Custom fields must be an array");
        }
    }

    if let Some(value) = payload.get("status") {
        match value.as_str().and_then(|s| PostStatus::from_str(s).ok()) {
            Some(status) if settings.allowed_statuses.contains(&status) => {
                fields.insert(
                    "status".to_string(),
                    JsonValue::String(status.as_str().to_string()),
                );
            }
            _ => {
                let allowed: Vec<&str> = settings
                    .allowed_statuses
                    .iter()
                    .map(|s| s.as_str())
                    .collect();
                push_error(
                    &mut errors,
                    "status",
                    &format!("Status must be one of: {}", allowed.join(", ")),
                );
            }
        }
    }

    let mut banner_image = None;
    if let Some(value) = payload.get("banner_image") {
        match value.as_str() {
            Some(url) if is_url(url) => banner_image = Some(url.to_string()),
            _ => push_error(
                &mut errors,
                "banner_image",
                "Banner image must be a valid URL",
            ),
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if settings.sanitize_html {
        if let Some(JsonValue::String(content)) = fields.get("content") {
            let clean = sanitize_content(content, &settings.allowed_html_tags);
            fields.insert("content".to_string(), JsonValue::String(clean));
        }
    }

    Ok(ValidatedPost {
        fields,
        banner_image,
    })
}

fn check_string(
    payload: &serde_json::Map<String, JsonValue>,
    field: &str,
    max: usize,
    fields: &mut FieldMap,
    errors: &mut FieldErrors,
) {
    let Some(value) = payload.get(field) else {
        return;
    };

    match value.as_str() {
        // Character counts, not byte lengths: multibyte text within the
        // limit must pass
        Some(s) if s.chars().count() <= max => {
            fields.insert(field.to_string(), value.clone());
        }
        Some(_) => {
            let label = field_label(field);
            push_error(
                errors,
                field,
                &format!("{} must not exceed {} characters", label, max),
            );
        }
        None => {
            let label = field_label(field);
            push_error(errors, field, &format!("{} must be a string", label));
        }
    }
}

fn field_label(field: &str) -> String {
    let mut label = field.replace('_', " ");
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    label
}

fn push_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

fn is_url(value: &str) -> bool {
    (value.starts_with("http://") || value.starts_with("https://"))
        && value.len() > 8
        && !value.contains(char::is_whitespace)
}

/// Accept RFC 3339 or a bare date, normalized to RFC 3339
fn parse_date(value: &str) -> Option<String> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).to_rfc3339());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().to_rfc3339());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().to_rfc3339());
    }
    None
}

fn sanitize_content(content: &str, allowed_tags: &[String]) -> String {
    let tags: HashSet<&str> = allowed_tags.iter().map(|t| t.as_str()).collect();
    Builder::default()
        .tags(tags)
        .clean(content)
        .to_string()
}
