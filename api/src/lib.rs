use axum::{middleware, routing::get, Router};
use database::PostStore;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod models;
pub mod server;
pub mod settings;
pub mod validate;

pub use auth::{AuthConfig, AuthMethod};
pub use error::{ApiError, ApiResult};
pub use server::{spawn_server, start_server, ServerConfig};
pub use settings::{ContentSettings, PlatformSettings};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PostStore>,
    pub auth: Arc<AuthConfig>,
    pub content: Arc<ContentSettings>,
    pub platform: Arc<PlatformSettings>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::connection::validate_connection,
        handlers::posts::list_posts,
        handlers::posts::create_post,
        handlers::posts::get_post,
        handlers::posts::update_post,
        handlers::posts::delete_post,
    ),
    components(
        schemas(
            models::PostResponse,
            models::CreatedResponse,
            models::UpdatedResponse,
            models::ListResponse,
            models::ListMeta,
            models::DeleteResponse,
            models::ValidateResponse,
            models::PlatformInfo,
            error::ErrorEnvelope,
        )
    ),
    tags(
        (name = "connection", description = "Connection validation"),
        (name = "posts", description = "Post CRUD and upsert operations"),
    ),
    info(
        title = "ArticlAI Bridge API",
        version = "1.0.0",
        description = "REST bridge exposing a configurable post table to ArticlAI",
    ),
)]
pub struct ApiDoc;

/// Create the API router, mounted under the configured prefix.
///
/// Every route under the prefix sits behind the auth gate; the Swagger UI
/// does not.
pub fn create_router(state: AppState, prefix: &str) -> Router {
    let routes = Router::new()
        .route("/validate", get(handlers::connection::validate_connection))
        .route(
            "/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        .route(
            "/posts/:id",
            get(handlers::posts::get_post)
                .put(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let mount = format!("/{}", prefix.trim_matches('/'));

    Router::new()
        .nest(&mount, routes)
        .merge(SwaggerUi::new("/swagger").url("/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod router_tests;
