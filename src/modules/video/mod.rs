use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use crate::state::AppState;

pub mod dto;
pub mod events;
pub mod handler;
pub mod keys;
pub mod model;
pub mod pipeline;
pub mod repository;
pub mod service;
#[cfg(test)]
pub mod testing;

// Raw video uploads can be large; axum's default 2MB cap is far too small.
const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handler::upload_video).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/{id}/status", get(handler::video_status))
        .route("/{id}/metadata", get(handler::video_metadata))
}
