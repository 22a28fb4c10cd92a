use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::ListFilter;
use serde_json::Value as JsonValue;
use std::str::FromStr;
use tracing::{debug, info};

use crate::{
    error::{ApiError, ApiResult, ErrorEnvelope},
    models::{
        CreatedResponse, DeleteResponse, ListMeta, ListParams, ListResponse, PostResponse,
        UpdatedResponse,
    },
    validate::{validate_create, validate_update},
    AppState,
};

/// List posts, newest first
///
/// GET /posts
#[utoipa::path(
    get,
    path = "/posts",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<u32>, Query, description = "Items per page (default: 15, max: 100)"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("published" = Option<bool>, Query, description = "Only posts passing the published predicate")
    ),
    responses(
        (status = 200, description = "Posts listed", body = ListResponse),
        (status = 401, description = "Authentication failed", body = ErrorEnvelope)
    ),
    tag = "posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse>> {
    debug!("Listing posts: {:?}", params);

    let status = match params.status.as_deref() {
        Some(raw) => Some(posts::PostStatus::from_str(raw).map_err(|_| {
            let mut errors = crate::error::FieldErrors::new();
            errors.insert(
                "status".to_string(),
                vec![format!("Unknown status filter: {}", raw)],
            );
            ApiError::Validation(errors)
        })?),
        None => None,
    };

    let filter = ListFilter {
        status,
        published: params.published.unwrap_or(false),
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(0),
    };

    let page = state.store.list(&filter).await?;

    let data = page
        .posts
        .iter()
        .map(|post| PostResponse::from_post(post, &state.platform))
        .collect();

    Ok(Json(ListResponse {
        data,
        meta: ListMeta {
            current_page: page.page,
            last_page: page.last_page() as u32,
            per_page: page.per_page,
            total: page.total,
        },
    }))
}

/// Create a post, or update the existing one when the payload slug already
/// exists. 201 on create, 200 on slug-collision update.
///
/// POST /posts
#[utoipa::path(
    post,
    path = "/posts",
    responses(
        (status = 201, description = "Post created", body = CreatedResponse),
        (status = 200, description = "Existing post updated by slug", body = UpdatedResponse),
        (status = 422, description = "Validation failed", body = ErrorEnvelope),
        (status = 401, description = "Authentication failed", body = ErrorEnvelope)
    ),
    tag = "posts"
)]
pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<JsonValue>,
) -> ApiResult<Response> {
    let validated = validate_create(&payload, &state.content)?;

    let (post, was_updated) = state.store.upsert(validated.fields).await?;

    if let Some(url) = validated.banner_image {
        state.store.attach_banner(post.id, &url).await;
    }

    if was_updated {
        info!("Post {} updated via slug reconciliation", post.id);
        Ok((
            StatusCode::OK,
            Json(UpdatedResponse::from_post(&post, &state.platform)),
        )
            .into_response())
    } else {
        info!("Post {} created", post.id);
        Ok((
            StatusCode::CREATED,
            Json(CreatedResponse::from_post(&post, &state.platform)),
        )
            .into_response())
    }
}

/// Fetch a single post
///
/// GET /posts/{id}
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Post retrieved", body = PostResponse),
        (status = 404, description = "Post not found", body = ErrorEnvelope),
        (status = 401, description = "Authentication failed", body = ErrorEnvelope)
    ),
    tag = "posts"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PostResponse>> {
    let post = state.store.find_or_fail(parse_id(&id)?).await?;
    Ok(Json(PostResponse::from_post(&post, &state.platform)))
}

/// Update an existing post
///
/// PUT /posts/{id}
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Post updated", body = UpdatedResponse),
        (status = 404, description = "Post not found", body = ErrorEnvelope),
        (status = 422, description = "Validation failed", body = ErrorEnvelope),
        (status = 401, description = "Authentication failed", body = ErrorEnvelope)
    ),
    tag = "posts"
)]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<JsonValue>,
) -> ApiResult<Json<UpdatedResponse>> {
    let id = parse_id(&id)?;
    let validated = validate_update(&payload, &state.content)?;

    let post = state.store.update(id, validated.fields).await?;

    if let Some(url) = validated.banner_image {
        state.store.attach_banner(post.id, &url).await;
    }

    info!("Post {} updated", post.id);
    Ok(Json(UpdatedResponse::from_post(&post, &state.platform)))
}

/// Delete a post
///
/// DELETE /posts/{id}
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Post deleted", body = DeleteResponse),
        (status = 404, description = "Post not found", body = ErrorEnvelope),
        (status = 401, description = "Authentication failed", body = ErrorEnvelope)
    ),
    tag = "posts"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_id(&id)?;

    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound("Post".to_string()));
    }

    info!("Post {} deleted", id);
    Ok(Json(DeleteResponse {
        success: true,
        message: "Post deleted successfully".to_string(),
    }))
}

// A non-numeric id cannot name a row, so it reads as absent
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound("Post".to_string()))
}
