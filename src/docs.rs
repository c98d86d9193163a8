use utoipa::OpenApi;

use crate::common::response::ApiResponse;
use crate::modules::video::dto::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::video::handler::upload_video,
        crate::modules::video::handler::video_status,
        crate::modules::video::handler::video_metadata,
    ),
    components(
        schemas(
            crate::modules::video::model::VideoStatus,
            UploadResponse,
            StatusResponse,
            MetadataResponse,
            ApiResponse<UploadResponse>,
            ApiResponse<StatusResponse>,
            ApiResponse<MetadataResponse>,
        )
    ),
    tags(
        (name = "Videos", description = "Video upload and processing status")
    )
)]
pub struct ApiDoc;
