//! HTTP surface: one blocking pipeline run per `POST /generate-blog`.

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod handlers;

pub use auth::{AuthUser, USER_HEADER};
pub use error::{ApiError, ErrorBody};

use crate::config::ServerConfig;
use crate::pipeline::BlogPipeline;
use crate::store::BlogStore;

/// Shared application state
pub struct AppState {
    pub pipeline: Arc<BlogPipeline>,
    pub store: Arc<dyn BlogStore>,
}

impl AppState {
    pub fn new(pipeline: Arc<BlogPipeline>, store: Arc<dyn BlogStore>) -> Self {
        Self { pipeline, store }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/generate-blog",
            post(handlers::generate_blog).fallback(handlers::method_not_allowed),
        )
        .route("/blog-posts", get(handlers::list_posts))
        .route("/blog-posts/{id}", get(handlers::get_post))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C or SIGTERM
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> crate::Result<()> {
    let app = create_router(state);
    let addr = SocketAddr::new(config.host, config.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{AudioArtifact, AudioFormat, MockMediaResolver};
    use crate::generate::MockContentGenerator;
    use crate::store::{NewBlogPost, SqliteBlogStore};
    use crate::transcribe::{MockTranscriber, Transcript};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::path::Path;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        store: Arc<SqliteBlogStore>,
    }

    fn app_with(
        resolver: MockMediaResolver,
        transcriber: MockTranscriber,
        generator: MockContentGenerator,
    ) -> TestApp {
        let store = Arc::new(SqliteBlogStore::in_memory().unwrap());
        let pipeline = BlogPipeline::new(
            Arc::new(resolver),
            Arc::new(transcriber),
            Arc::new(generator),
            store.clone(),
        );
        let state = Arc::new(AppState::new(Arc::new(pipeline), store.clone()));
        TestApp {
            router: create_router(state),
            store,
        }
    }

    /// App whose collaborators panic on any call
    fn idle_app() -> TestApp {
        app_with(
            MockMediaResolver::new(),
            MockTranscriber::new(),
            MockContentGenerator::new(),
        )
    }

    fn happy_app() -> TestApp {
        let mut resolver = MockMediaResolver::new();
        resolver
            .expect_resolve_title()
            .times(1)
            .returning(|_| Ok("Test Video".to_string()));
        resolver.expect_fetch_audio().times(1).returning(|_| {
            Ok(AudioArtifact::locate(
                Path::new("/tmp/audio_files"),
                "abc123",
                AudioFormat::Mp3,
            ))
        });

        let mut transcriber = MockTranscriber::new();
        transcriber.expect_transcribe().times(1).returning(|_| {
            Ok(Transcript {
                id: "t-1".to_string(),
                text: "Hello world.".to_string(),
                audio_duration: None,
            })
        });

        let mut generator = MockContentGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_, _| Ok("# Intro\n...\n# Conclusion".to_string()));

        app_with(resolver, transcriber, generator)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    fn post_json(user: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/generate-blog")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_as(user: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(USER_HEADER, user)
            .body(Body::empty())
            .unwrap()
    }

    fn store_post(store: &SqliteBlogStore, owner: &str, title: &str) -> i64 {
        store
            .create(NewBlogPost {
                owner: owner.to_string(),
                youtube_title: title.to_string(),
                youtube_link: "https://youtu.be/abc123".to_string(),
                generated_content: "content".to_string(),
            })
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_generate_blog_end_to_end() {
        let app = happy_app();

        let (status, body) = send(
            &app.router,
            post_json(Some("alice"), r#"{"link": "https://youtu.be/abc123"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["id"].is_i64());
        assert_eq!(body["title"], "Test Video");
        assert_eq!(body["transcript"], "Hello world.");
        assert_eq!(body["content"], "# Intro\n...\n# Conclusion");

        let posts = app.store.list_by_owner("alice").unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(json!(posts[0].id), body["id"]);
    }

    #[tokio::test]
    async fn test_non_youtube_link_is_rejected() {
        let app = idle_app();

        let (status, body) = send(
            &app.router,
            post_json(Some("alice"), r#"{"link": "https://vimeo.com/123"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"error": "Provided link is not a valid YouTube URL"}));
        assert!(app.store.list_by_owner("alice").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_link_is_rejected() {
        let app = idle_app();

        let (status, body) = send(&app.router, post_json(Some("alice"), "{}")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "YouTube link not provided");
    }

    #[tokio::test]
    async fn test_malformed_body_is_internal_error() {
        let app = idle_app();

        let (status, body) = send(&app.router, post_json(Some("alice"), "not json")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert!(body["detail"].as_str().unwrap().contains("invalid request body"));
    }

    #[tokio::test]
    async fn test_wrong_verb_is_405() {
        let app = idle_app();

        let (status, body) = send(&app.router, get_as("alice", "/generate-blog")).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"error": "Invalid request method"}));
    }

    #[tokio::test]
    async fn test_anonymous_request_is_401() {
        let app = idle_app();

        let (status, body) = send(
            &app.router,
            post_json(None, r#"{"link": "https://youtu.be/abc123"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Authentication required");
    }

    #[tokio::test]
    async fn test_health_needs_no_identity() {
        let app = idle_app();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_list_shows_only_own_posts() {
        let app = idle_app();
        store_post(&app.store, "alice", "Mine");
        store_post(&app.store, "bob", "Theirs");

        let (status, body) = send(&app.router, get_as("alice", "/blog-posts")).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["youtube_title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Mine"]);
    }

    #[tokio::test]
    async fn test_store_panic_becomes_500() {
        let mut store = crate::store::MockBlogStore::new();
        store
            .expect_list_by_owner()
            .times(1)
            .returning(|_| panic!("connection poisoned"));
        let store: Arc<dyn BlogStore> = Arc::new(store);
        let pipeline = BlogPipeline::new(
            Arc::new(MockMediaResolver::new()),
            Arc::new(MockTranscriber::new()),
            Arc::new(MockContentGenerator::new()),
            store.clone(),
        );
        let router = create_router(Arc::new(AppState::new(Arc::new(pipeline), store)));

        let (status, body) = send(&router, get_as("alice", "/blog-posts")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_post_detail_respects_ownership() {
        let app = idle_app();
        let id = store_post(&app.store, "alice", "Mine");

        let (status, body) = send(&app.router, get_as("alice", &format!("/blog-posts/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["youtube_title"], "Mine");

        let response = app
            .router
            .clone()
            .oneshot(get_as("bob", &format!("/blog-posts/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/blog-posts");

        let (status, _) = send(&app.router, get_as("alice", "/blog-posts/9999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
