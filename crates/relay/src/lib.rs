#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod hosts;
mod http_client;
mod server;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
};
use serde::Deserialize;

pub use error::{RelayError, Result};
pub use hosts::HostSet;
pub use server::{MediaKind, RelayServerBuilder, Server};

/// Build the media relay from configuration
pub fn build_server(config: &mirage_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        RelayServerBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize media relay: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for the media relay
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route("/api/relay/video", get(relay_video))
        .route("/api/relay/image", get(relay_image))
}

#[derive(Debug, Deserialize)]
struct RelayQuery {
    url: Option<String>,
}

async fn relay_video(
    State(server): State<Arc<Server>>,
    Query(query): Query<RelayQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    relay(&server, query, MediaKind::Video, &headers).await
}

async fn relay_image(
    State(server): State<Arc<Server>>,
    Query(query): Query<RelayQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    relay(&server, query, MediaKind::Image, &headers).await
}

async fn relay(server: &Server, query: RelayQuery, kind: MediaKind, headers: &HeaderMap) -> Result<Response> {
    let source = query
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| RelayError::InvalidRequest("missing 'url' query parameter".to_string()))?;

    server.relay(&source, kind, headers).await
}
