use crate::{create_router, AppState, AuthConfig, ContentSettings, PlatformSettings};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use database::{Database, PostStore};
use posts::{BannerMode, MappingLayers, StorageProfile};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tower::ServiceExt;

const TEST_KEY: &str = "test-secret";

async fn test_router(dir: &tempfile::TempDir) -> Router {
    let db_path = dir.path().join("bridge.db");
    let db = Arc::new(Database::new(db_path.to_str().unwrap()).await.unwrap());

    let profile =
        StorageProfile::resolve("blogs", BannerMode::UrlOnly, &MappingLayers::default()).unwrap();
    db.execute_raw(&profile.create_table_sql()).await.unwrap();
    for sql in profile.index_sql() {
        db.execute_raw(&sql).await.unwrap();
    }

    let store = PostStore::open(db, profile).await.unwrap();

    let state = AppState {
        store: Arc::new(store),
        auth: Arc::new(AuthConfig::api_key(TEST_KEY)),
        content: Arc::new(ContentSettings::default()),
        platform: Arc::new(PlatformSettings {
            base_url: "https://example.com".to_string(),
            url_prefix: "blog".to_string(),
            ..Default::default()
        }),
    };

    create_router(state, "api/articlai")
}

fn authed(method: Method, uri: &str, body: Option<JsonValue>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", TEST_KEY);

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> JsonValue {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_key_is_401() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    let request = Request::builder()
        .uri("/api/articlai/validate")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "AUTHENTICATION_ERROR");
    assert_eq!(body["error"], "X-API-Key header is required");
}

#[tokio::test]
async fn test_wrong_key_is_401() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    let request = Request::builder()
        .uri("/api/articlai/validate")
        .header("X-API-Key", "wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validate_reports_platform_info() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    let response = app
        .oneshot(authed(Method::GET, "/api/articlai/validate", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Connection validated successfully");
    assert!(body["platform_info"]["capabilities"].is_array());
}

#[tokio::test]
async fn test_create_then_fetch_post() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    let payload = json!({
        "title": "First Post",
        "content": "<p>Hello</p>",
    });
    let response = app
        .clone()
        .oneshot(authed(Method::POST, "/api/articlai/posts", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["title"], "First Post");
    assert_eq!(created["status"], "published");
    assert_eq!(created["url"], "https://example.com/blog/first-post");

    let id = created["id"].as_str().unwrap();
    let response = app
        .oneshot(authed(
            Method::GET,
            &format!("/api/articlai/posts/{}", id),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let post = body_json(response).await;
    assert_eq!(post["id"], *id);
    assert_eq!(post["slug"], "first-post");
    assert_eq!(post["content"], "<p>Hello</p>");
    assert!(post["custom_fields"].is_object());
}

#[tokio::test]
async fn test_repeated_create_with_slug_returns_200_update() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    let first = json!({"title": "Sync", "content": "v1", "slug": "sync"});
    let response = app
        .clone()
        .oneshot(authed(Method::POST, "/api/articlai/posts", Some(first)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;

    let second = json!({"title": "Sync v2", "content": "v2", "slug": "sync"});
    let response = app
        .clone()
        .oneshot(authed(Method::POST, "/api/articlai/posts", Some(second)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;

    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["title"], "Sync v2");

    let response = app
        .oneshot(authed(Method::GET, "/api/articlai/posts", None))
        .await
        .unwrap();
    let list = body_json(response).await;
    assert_eq!(list["meta"]["total"], 1);
}

#[tokio::test]
async fn test_validation_errors_collected_in_details() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    let payload = json!({"slug": "Bad Slug!"});
    let response = app
        .oneshot(authed(Method::POST, "/api/articlai/posts", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["title"].is_array());
    assert!(body["details"]["content"].is_array());
    assert!(body["details"]["slug"].is_array());
}

#[tokio::test]
async fn test_update_to_taken_slug_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    for title in ["First", "Second"] {
        let payload = json!({"title": title, "content": "x"});
        let response = app
            .clone()
            .oneshot(authed(Method::POST, "/api/articlai/posts", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let list = body_json(
        app.clone()
            .oneshot(authed(Method::GET, "/api/articlai/posts", None))
            .await
            .unwrap(),
    )
    .await;
    let second_id = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["title"] == "Second")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let payload = json!({"slug": "first"});
    let response = app
        .oneshot(authed(
            Method::PUT,
            &format!("/api/articlai/posts/{}", second_id),
            Some(payload),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["slug"][0], "This slug is already in use");
}

#[tokio::test]
async fn test_update_missing_post_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    let payload = json!({"title": "New Title"});
    let response = app
        .oneshot(authed(
            Method::PUT,
            "/api/articlai/posts/9999",
            Some(payload),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["error"], "Post not found");
}

#[tokio::test]
async fn test_delete_then_get_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    let payload = json!({"title": "Doomed", "content": "x"});
    let response = app
        .clone()
        .oneshot(authed(Method::POST, "/api/articlai/posts", Some(payload)))
        .await
        .unwrap();
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(authed(
            Method::DELETE,
            &format!("/api/articlai/posts/{}", id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Post deleted successfully");

    let response = app
        .clone()
        .oneshot(authed(
            Method::GET,
            &format!("/api/articlai/posts/{}", id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Deleting again reports absence, not success
    let response = app
        .oneshot(authed(
            Method::DELETE,
            &format!("/api/articlai/posts/{}", id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_published_filter() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    for (title, status) in [("Live", "published"), ("Hidden", "draft")] {
        let payload = json!({"title": title, "content": "x", "status": status});
        let response = app
            .clone()
            .oneshot(authed(Method::POST, "/api/articlai/posts", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(authed(
            Method::GET,
            "/api/articlai/posts?published=true",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list["meta"]["total"], 1);
    assert_eq!(list["data"][0]["title"], "Live");
}

#[tokio::test]
async fn test_banner_url_stored_on_create() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir).await;

    let payload = json!({
        "title": "With Banner",
        "content": "x",
        "banner_image": "https://cdn.test/banner.png",
    });
    let response = app
        .clone()
        .oneshot(authed(Method::POST, "/api/articlai/posts", Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;

    let response = app
        .oneshot(authed(
            Method::GET,
            &format!("/api/articlai/posts/{}", created["id"].as_str().unwrap()),
            None,
        ))
        .await
        .unwrap();
    let post = body_json(response).await;
    assert_eq!(post["banner_image"], "https://cdn.test/banner.png");
}
