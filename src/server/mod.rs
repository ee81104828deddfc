//! HTTP API for the inkdraft server.

pub mod ai;
pub mod auth;
pub mod error;
pub mod posts;
pub mod tokens;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::{PostRepository, UserRepository};
use ai::AiClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostRepository>,
    pub users: Arc<UserRepository>,
    pub ai: Arc<AiClient>,
    pub token_ttl: chrono::Duration,
}

impl AppState {
    pub fn new(pool: SqlitePool, ai: AiClient, token_ttl: chrono::Duration) -> Self {
        Self {
            posts: Arc::new(PostRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool)),
            ai: Arc::new(ai),
            token_ttl,
        }
    }
}

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "inkdraft API",
    })
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Builds the full application router.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/auth/me",
            get(auth::me).route_layer(middleware::from_fn(auth::require_user)),
        )
        .route(
            "/api/posts",
            post(posts::create_post).get(posts::list_posts),
        )
        .route(
            "/api/posts/",
            post(posts::create_post).get(posts::list_posts),
        )
        .route(
            "/api/posts/{id}",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/api/posts/{id}/publish", post(posts::publish_post))
        .route("/api/ai/generate", post(ai::generate))
        .layer(middleware::from_fn_with_state(state.clone(), auth::identify))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestContext {
        app: Router,
        _temp_dir: TempDir,
    }

    async fn setup_app() -> TestContext {
        setup_app_with_ttl(chrono::Duration::minutes(60)).await
    }

    async fn setup_app_with_ttl(ttl: chrono::Duration) -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        let state = AppState::new(pool, AiClient::new(None, "unused"), ttl);
        TestContext {
            app: router(state, &["http://localhost:5173".to_string()]),
            _temp_dir: temp_dir,
        }
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn signup(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": email, "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        body["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let ctx = setup_app().await;

        let (status, body) = send(&ctx.app, "GET", "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "inkdraft API");

        let (status, body) = send(&ctx.app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_signup_login_me() {
        let ctx = setup_app().await;
        let token = signup(&ctx.app, "ada@example.com").await;

        let (status, body) = send(&ctx.app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");

        let (status, body) = send(
            &ctx.app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(body["access_token"].as_str().unwrap(), token);
    }

    #[tokio::test]
    async fn test_duplicate_signup_rejected() {
        let ctx = setup_app().await;
        signup(&ctx.app, "ada@example.com").await;

        let (status, body) = send(
            &ctx.app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": "ada@example.com", "password": "other"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Email already registered");
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let ctx = setup_app().await;
        let (status, _) = send(
            &ctx.app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": "not-an-email", "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_login() {
        let ctx = setup_app().await;
        signup(&ctx.app, "ada@example.com").await;

        for (email, password) in [("ada@example.com", "wrong"), ("bob@example.com", "hunter22")] {
            let (status, body) = send(
                &ctx.app,
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["detail"], "Invalid email or password");
        }
    }

    #[tokio::test]
    async fn test_me_requires_valid_token() {
        let ctx = setup_app().await;

        let (status, body) = send(&ctx.app, "GET", "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid or expired token");

        let (status, _) = send(&ctx.app, "GET", "/api/auth/me", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_is_anonymous() {
        let ctx = setup_app_with_ttl(chrono::Duration::zero()).await;
        let token = signup(&ctx.app, "ada@example.com").await;

        let (status, _) = send(&ctx.app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Optional-auth routes still work.
        let (status, _) = send(
            &ctx.app,
            "POST",
            "/api/posts/",
            Some(&token),
            Some(json!({"title": "Anon"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_post_lifecycle() {
        let ctx = setup_app().await;
        let app = &ctx.app;

        let (status, created) = send(app, "POST", "/api/posts/", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["title"], "Untitled");
        assert_eq!(created["status"], "draft");
        assert!(created["content"].is_null());
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = send(
            app,
            "PATCH",
            &format!("/api/posts/{}", id),
            None,
            Some(json!({"content": "{\"root\":{\"children\":[]}}"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Untitled");
        assert_eq!(updated["content"], "{\"root\":{\"children\":[]}}");

        let (status, published) = send(
            app,
            "POST",
            &format!("/api/posts/{}/publish", id),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(published["status"], "published");

        let (status, fetched) =
            send(app, "GET", &format!("/api/posts/{}", id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["status"], "published");

        let (status, body) =
            send(app, "DELETE", &format!("/api/posts/{}", id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (status, body) = send(app, "GET", &format!("/api/posts/{}", id), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Post not found");
    }

    #[tokio::test]
    async fn test_missing_post_operations_are_404() {
        let ctx = setup_app().await;
        let app = &ctx.app;

        for (method, uri, body) in [
            ("PATCH", "/api/posts/99", Some(json!({"title": "x"}))),
            ("POST", "/api/posts/99/publish", None),
            ("DELETE", "/api/posts/99", None),
        ] {
            let (status, response) = send(app, method, uri, None, body).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
            assert_eq!(response["detail"], "Post not found");
        }
    }

    #[tokio::test]
    async fn test_list_filter() {
        let ctx = setup_app().await;
        let app = &ctx.app;

        let (_, first) = send(app, "POST", "/api/posts/", None, Some(json!({"title": "One"}))).await;
        send(app, "POST", "/api/posts/", None, Some(json!({"title": "Two"}))).await;
        send(
            app,
            "POST",
            &format!("/api/posts/{}/publish", first["id"]),
            None,
            None,
        )
        .await;

        let (_, all) = send(app, "GET", "/api/posts/", None, None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
        // Publishing bumped "One" to the top.
        assert_eq!(all[0]["title"], "One");

        let (_, drafts) = send(app, "GET", "/api/posts/?status_filter=draft", None, None).await;
        assert_eq!(drafts.as_array().unwrap().len(), 1);
        assert_eq!(drafts[0]["title"], "Two");

        let (_, unknown) = send(app, "GET", "/api/posts/?status_filter=archived", None, None).await;
        assert_eq!(unknown.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ai_generate_without_key() {
        let ctx = setup_app().await;
        let (status, body) = send(
            &ctx.app,
            "POST",
            "/api/ai/generate",
            None,
            Some(json!({"text": "Some draft", "action": "summary"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "[Set GEMINI_API_KEY to enable AI] Some draft...");
        assert_eq!(body["streaming"], false);
    }

    #[tokio::test]
    async fn test_malformed_json_uses_detail_body() {
        let ctx = setup_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/posts/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = ctx.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["detail"].is_string());
    }
}
