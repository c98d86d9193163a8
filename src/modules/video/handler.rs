use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::video::dto::*;
use crate::modules::video::service::VideoService;
use crate::state::AppState;

/// Upload Video
/// Accepts one video file and schedules asynchronous processing.
#[utoipa::path(
    post,
    path = "/api/v1/videos",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload accepted", body = ApiResponse<UploadResponse>),
        (status = 400, description = "Invalid video file format"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let filename = match field.file_name() {
                Some(f) => f.to_string(),
                None => {
                    return ApiError("Missing filename".to_string(), StatusCode::BAD_REQUEST)
                        .into_response();
                }
            };

            let data = match field.bytes().await {
                Ok(d) => d,
                Err(e) => {
                    return ApiError(
                        format!("Upload stream error: {e}"),
                        StatusCode::BAD_REQUEST,
                    )
                    .into_response();
                }
            };

            return match VideoService::ingest(
                &state.videos,
                &state.queue,
                &state.config.upload_dir,
                filename,
                data,
            )
            .await
            {
                Ok(res) => {
                    ApiSuccess(ApiResponse::success(res, "Upload accepted"), StatusCode::OK)
                        .into_response()
                }
                Err(e) => ApiError(e.to_string(), e.status_code()).into_response(),
            };
        }
    }

    ApiError(
        "No file field found in multipart request".to_string(),
        StatusCode::BAD_REQUEST,
    )
    .into_response()
}

/// Video Status
/// Polling endpoint for the processing status of one job.
#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Current status", body = ApiResponse<StatusResponse>),
        (status = 404, description = "Video not found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos"
)]
pub async fn video_status(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    match VideoService::status(&state.videos, id).await {
        Ok(res) => ApiSuccess(
            ApiResponse::success(res, "Status retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError(e.to_string(), e.status_code()).into_response(),
    }
}

/// Video Metadata
/// Full record for one job: filename, upload time, status, and whatever
/// the pipeline has produced so far.
#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/metadata",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Full metadata", body = ApiResponse<MetadataResponse>),
        (status = 404, description = "Video not found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos"
)]
pub async fn video_metadata(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match VideoService::metadata(&state.videos, id).await {
        Ok(res) => ApiSuccess(
            ApiResponse::success(res, "Metadata retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError(e.to_string(), e.status_code()).into_response(),
    }
}
