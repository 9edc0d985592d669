use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::Response,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::{
    error::{RelayError, Result},
    hosts::HostSet,
    http_client::http_client,
};

/// Longest slice of an upstream error body echoed back to the caller
const EXCERPT_LIMIT: usize = 500;

/// What the caller expects to get back
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    const fn default_accept(self) -> &'static str {
        match self {
            Self::Video => "video/mp4,video/*;q=0.9,*/*;q=0.8",
            Self::Image => "image/*,*/*;q=0.8",
        }
    }
}

/// Streams remote media back to the caller
///
/// Hides the provider credential from the browser and sidesteps CDN CORS
/// rules. The credential is only attached for explicitly trusted hosts.
pub struct Server {
    client: Client,
    api_key: Option<SecretString>,
    trusted_hosts: HostSet,
    cdn_hosts: HostSet,
    cache_control: HeaderValue,
    timeout: Duration,
}

impl Server {
    /// Fetch `source` and stream it back
    pub async fn relay(&self, source: &str, kind: MediaKind, caller: &HeaderMap) -> Result<Response> {
        let url = parse_source(source)?;
        let host = url.host_str().unwrap_or_default().to_string();
        let trusted = self.trusted_hosts.contains(&host);

        let accept = caller
            .get(header::ACCEPT)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(kind.default_accept()));

        let mut request = self.client.get(url).header(header::ACCEPT, accept);

        if let Some(range) = caller.get(header::RANGE) {
            request = request.header(header::RANGE, range.clone());
        }

        if trusted {
            let api_key = self.api_key.as_ref().ok_or_else(|| {
                RelayError::ConfigError(format!("no credential configured for trusted host '{host}'"))
            })?;
            request = request.bearer_auth(api_key.expose_secret());
        }

        tracing::debug!(%host, %kind, trusted, "relaying media");

        let deadline = tokio::time::Instant::now() + self.timeout;

        let upstream = match tokio::time::timeout_at(deadline, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(RelayError::FetchFailed {
                    status: None,
                    message: format!("request to '{host}' failed: {e}"),
                });
            }
            Err(_) => {
                return Err(RelayError::FetchFailed {
                    status: None,
                    message: format!("'{host}' did not respond within {}s", self.timeout.as_secs()),
                });
            }
        };

        let status = upstream.status();

        if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
            return Err(self.failure(upstream, &host, deadline).await);
        }

        let headers = self.response_headers(upstream.headers(), kind, status);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        Ok(response)
    }

    async fn failure(&self, upstream: reqwest::Response, host: &str, deadline: tokio::time::Instant) -> RelayError {
        let status = upstream.status();

        // The redirect chain may have ended on a different host than requested
        let final_host = upstream.url().host_str().unwrap_or(host).to_string();

        let body = read_prefix(upstream, EXCERPT_LIMIT, deadline).await;
        let excerpt = mirage_core::truncate_utf8(&body, EXCERPT_LIMIT);

        tracing::warn!(%status, host = %final_host, body = %excerpt, "upstream refused media request");

        if status == StatusCode::FORBIDDEN && self.cdn_hosts.contains(&final_host) {
            return RelayError::UpstreamLinkExpired;
        }

        RelayError::FetchFailed {
            status: Some(status),
            message: format!("'{final_host}' returned {status}: {excerpt}"),
        }
    }

    fn response_headers(&self, upstream: &HeaderMap, kind: MediaKind, status: StatusCode) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let content_type = match kind {
            MediaKind::Video => HeaderValue::from_static("video/mp4"),
            MediaKind::Image => upstream
                .get(header::CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream")),
        };
        headers.insert(header::CONTENT_TYPE, content_type);

        copy(upstream, &mut headers, &header::CONTENT_LENGTH);

        if status == StatusCode::PARTIAL_CONTENT {
            copy(upstream, &mut headers, &header::CONTENT_RANGE);
        }

        headers.insert(
            header::ACCEPT_RANGES,
            upstream
                .get(header::ACCEPT_RANGES)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static("bytes")),
        );

        headers.insert(
            header::CACHE_CONTROL,
            upstream
                .get(header::CACHE_CONTROL)
                .cloned()
                .unwrap_or_else(|| self.cache_control.clone()),
        );

        headers
    }
}

/// Read at most about `limit` bytes of a body, stopping at `deadline`
///
/// Error bodies are only quoted, so the rest is never downloaded.
async fn read_prefix(mut response: reqwest::Response, limit: usize, deadline: tokio::time::Instant) -> Vec<u8> {
    let mut body = Vec::new();

    let read = async {
        while body.len() < limit {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "failed to read upstream error body");
                    break;
                }
            }
        }
    };

    if tokio::time::timeout_at(deadline, read).await.is_err() {
        tracing::debug!("upstream error body did not arrive before the deadline");
    }

    body
}

fn copy(from: &HeaderMap, to: &mut HeaderMap, name: &HeaderName) {
    if let Some(value) = from.get(name) {
        to.insert(name.clone(), value.clone());
    }
}

fn parse_source(source: &str) -> Result<Url> {
    let url = Url::parse(source.trim()).map_err(|e| RelayError::InvalidRequest(format!("invalid url: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RelayError::InvalidRequest(format!(
            "unsupported url scheme '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(RelayError::InvalidRequest("url has no host".to_string()));
    }

    Ok(url)
}

/// Builder for constructing the relay server from configuration
pub struct RelayServerBuilder<'a> {
    config: &'a mirage_config::Config,
}

impl<'a> RelayServerBuilder<'a> {
    pub const fn new(config: &'a mirage_config::Config) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<Server> {
        let relay = &self.config.relay;

        let cache_control = HeaderValue::from_str(&relay.cache_control)
            .map_err(|e| RelayError::ConfigError(format!("invalid relay.cache_control: {e}")))?;

        let api_key = relay
            .api_key
            .clone()
            .or_else(|| self.config.faceswap.akool.api_key.clone());

        if api_key.is_none() {
            tracing::debug!("relay has no credential, trusted hosts will be refused");
        }

        Ok(Server {
            client: http_client(),
            api_key,
            trusted_hosts: HostSet::new(&relay.trusted_hosts),
            cdn_hosts: HostSet::new(&relay.cdn_hosts),
            cache_control,
            timeout: relay.timeout,
        })
    }
}
