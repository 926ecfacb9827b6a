use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthUser;
use super::error::ApiError;
use super::AppState;
use crate::pipeline::GeneratedPost;
use crate::store::BlogPost;
use crate::PipelineError;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub link: Option<String>,
}

pub async fn health() -> &'static str {
    "OK"
}

/// Run the whole pipeline inside the request and return the stored post
pub async fn generate_blog(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> Result<Json<GeneratedPost>, ApiError> {
    let request: GenerateRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, "Rejected unreadable request body");
        PipelineError::Internal(format!("invalid request body: {}", e))
    })?;
    let link = request.link.unwrap_or_default();

    // Own task, so a panicking collaborator becomes an internal error
    let pipeline = Arc::clone(&state.pipeline);
    let outcome = tokio::spawn(async move { pipeline.run(&user, &link).await })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Pipeline task aborted");
            PipelineError::Internal(format!("pipeline task aborted: {}", e))
        })?;

    Ok(Json(outcome?))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Invalid request method")
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    let store = Arc::clone(&state.store);
    let posts = blocking(move || store.list_by_owner(&user))
        .await?
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list blog posts");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load blog posts")
                .with_detail(e.to_string())
        })?;

    Ok(Json(posts))
}

/// A post is only shown to its owner; anyone else is sent back to their own list
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let store = Arc::clone(&state.store);
    let post = blocking(move || store.get(id)).await?.map_err(|e| {
        tracing::error!(error = %e, post_id = id, "Failed to load blog post");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load blog post")
            .with_detail(e.to_string())
    })?;

    match post {
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "Blog post not found")),
        Some(post) if post.owner == user => Ok(Json(post).into_response()),
        Some(_) => Ok(Redirect::to("/blog-posts").into_response()),
    }
}

/// Run a store call on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(error = %e, "Store task aborted");
        ApiError::from(PipelineError::Internal(format!("store task aborted: {}", e)))
    })
}
