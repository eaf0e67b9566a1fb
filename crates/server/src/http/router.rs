use super::handlers::{comments, sse};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let cors = if allowed_origins == "*" {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_origin(Any)
                .allow_headers(Any)
        } else {
            tracing::info!("CORS enabled for origins: {:?}", origins);
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_origin(origins)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route(
            "/api/discussions/:discussion_id/comments",
            get(comments::list_comments).post(comments::post_comment),
        )
        .route(
            "/api/discussions/:discussion_id/comments/sse",
            get(sse::sse_handler),
        )
        .route(
            "/api/discussions/:discussion_id/comments/:comment_id",
            delete(comments::delete_comment),
        )
        .layer(cors)
        .with_state(state)
}
