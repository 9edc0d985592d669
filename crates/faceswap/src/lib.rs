#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod akool;
mod detector;
mod error;
mod http_client;
mod landmarks;
mod poller;
mod request;
mod scenario;
mod server;
mod storage;
mod submitter;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    routing::{get, post},
};

pub use akool::AkoolClient;
pub use error::{FaceSwapError, Result};
pub use landmarks::normalize_landmarks;
pub use request::ExtractUpload;
pub use scenario::{CatalogEntry, KeySegment, ScenarioLoadError, ScenarioTable};
pub use server::{FaceSwapServerBuilder, Server};
pub use storage::{ObjectStoreGateway, StoredObject};
pub use types::{
    FaceDescriptor, Job, JobState, JobStatus, JobStatusResponse, ScenarioKey, Submission, SwapKind, SwapResponse,
    SwapTarget, SwapUpload,
};

/// Build the face-swap server from configuration
pub fn build_server(config: &mirage_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        FaceSwapServerBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize face-swap server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for face swaps
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route("/api/faceswap/image", post(swap_image))
        .route("/api/faceswap/video", post(swap_video))
        .route("/api/faceswap/jobs/{job_id}", get(job_status))
        .route("/api/faceswap/scenarios", get(list_scenarios))
        .layer(DefaultBodyLimit::max(request::BODY_LIMIT_BYTES))
}

async fn swap_image(
    State(server): State<Arc<Server>>,
    ExtractUpload(upload): ExtractUpload,
) -> Result<Json<SwapResponse>> {
    swap(&server, upload, SwapKind::Image).await
}

async fn swap_video(
    State(server): State<Arc<Server>>,
    ExtractUpload(upload): ExtractUpload,
) -> Result<Json<SwapResponse>> {
    swap(&server, upload, SwapKind::Video).await
}

async fn swap(server: &Server, upload: SwapUpload, kind: SwapKind) -> Result<Json<SwapResponse>> {
    tracing::debug!(scenario = %upload.key, %kind, size = upload.image.len(), "face-swap handler called");

    let submission = server.swap(upload, kind).await?;

    Ok(Json(SwapResponse {
        job_id: submission.job.id,
        provider_job_id: submission.job.provider_job_id,
        result_url: submission.result_url_hint,
    }))
}

async fn job_status(State(server): State<Arc<Server>>, Path(job_id): Path<String>) -> Result<Json<JobStatusResponse>> {
    let job = server.job(&job_id).await?;
    Ok(Json(job.into()))
}

async fn list_scenarios(State(server): State<Arc<Server>>) -> Json<Vec<CatalogEntry>> {
    Json(server.scenarios())
}
