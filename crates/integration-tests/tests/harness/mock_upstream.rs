//! Mock upstream services for integration tests
//!
//! A single server plays the Akool detector and open API, the `ElevenLabs`
//! voice API, and a media host serving finished results.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::config::{AKOOL_KEY, ELEVENLABS_KEY};

pub const JOB_ID: &str = "6650c1f2a1b2c3d4e5f60718";
pub const RESULT_URL: &str = "https://d1q70pf5vjeyhc.cloudfront.net/result/6650c1f2.png";
pub const LANDMARKS: &str = "412,301:520,298:466,360:430,410";
pub const VOICE_ID: &str = "mockVoice0001";
pub const AUDIO: &[u8] = b"ID3\x04mock-mpeg-frames";
pub const CLIP: &[u8] = b"\x00\x00\x00\x18ftypmp42mock-clip-bytes";

/// Mock upstream server that answers with canned provider responses
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    detect_count: AtomicU32,
    submit_count: AtomicU32,
    poll_count: AtomicU32,
    clone_count: AtomicU32,
    speech_count: AtomicU32,
    media_count: AtomicU32,
    /// `faceswap_status` reported by the result endpoint; 0 means no rows yet
    poll_status: AtomicI64,
    last_submit: Mutex<Option<Value>>,
    last_media_auth: Mutex<Option<String>>,
}

impl MockUpstream {
    /// Start the mock server on an ephemeral port
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/detect", routing::post(detect))
            .route("/api/open/v3/faceswap/highquality/{operation}", routing::post(submit))
            .route("/api/open/v3/faceswap/result/listbyids", routing::get(results))
            .route("/v1/voices/add", routing::post(add_voice))
            .route("/v1/text-to-speech/{voice_id}/stream", routing::post(speech))
            .route("/media/clip.mov", routing::get(clip))
            .route("/media/expired.mp4", routing::get(expired))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL of the mock, without a trailing slash
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make the result endpoint report this `faceswap_status`
    pub fn set_poll_status(&self, status: i64) {
        self.state.poll_status.store(status, Ordering::SeqCst);
    }

    pub fn detect_count(&self) -> u32 {
        self.state.detect_count.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> u32 {
        self.state.submit_count.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> u32 {
        self.state.poll_count.load(Ordering::SeqCst)
    }

    pub fn clone_count(&self) -> u32 {
        self.state.clone_count.load(Ordering::SeqCst)
    }

    pub fn speech_count(&self) -> u32 {
        self.state.speech_count.load(Ordering::SeqCst)
    }

    pub fn media_count(&self) -> u32 {
        self.state.media_count.load(Ordering::SeqCst)
    }

    /// JSON body of the most recent swap submission
    pub fn last_submit(&self) -> Option<Value> {
        self.state.last_submit.lock().unwrap().clone()
    }

    /// `Authorization` header of the most recent media request
    pub fn last_media_auth(&self) -> Option<String> {
        self.state.last_media_auth.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn bearer_matches(headers: &HeaderMap, key: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {key}"))
}

async fn detect(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.detect_count.fetch_add(1, Ordering::SeqCst);

    if !bearer_matches(&headers, AKOOL_KEY) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    if body["image_url"].as_str().is_none_or(str::is_empty) {
        return Json(json!({ "error_code": 1, "error_msg": "image_url is required" })).into_response();
    }

    Json(json!({
        "error_code": 0,
        "error_msg": "SUCCESS",
        "landmarks": [[[412, 301], [520, 298], [466, 360], [430, 410]]],
        "landmarks_str": [LANDMARKS],
        "region": [[380, 250, 190, 220]],
    }))
    .into_response()
}

async fn submit(
    State(state): State<Arc<MockState>>,
    Path(operation): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.submit_count.fetch_add(1, Ordering::SeqCst);
    *state.last_submit.lock().unwrap() = Some(body);

    if !bearer_matches(&headers, AKOOL_KEY) {
        return Json(json!({ "code": 1101, "msg": "Invalid authorization or The request token has expired" }))
            .into_response();
    }

    let url = match operation.as_str() {
        "specifyimage" => "https://d1q70pf5vjeyhc.cloudfront.net/result/6650c1f2.png",
        "specifyvideo" => "https://d1q70pf5vjeyhc.cloudfront.net/result/6650c1f2.mp4",
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    Json(json!({
        "code": 1000,
        "msg": "OK",
        "data": { "_id": JOB_ID, "job_id": 20_240_521_101_120_u64, "url": url }
    }))
    .into_response()
}

async fn results(
    State(state): State<Arc<MockState>>,
    Query(query): Query<std::collections::HashMap<String, String>>,
) -> Json<Value> {
    state.poll_count.fetch_add(1, Ordering::SeqCst);

    if query.get("_ids").map(String::as_str) != Some(JOB_ID) {
        return Json(json!({ "code": 1000, "msg": "OK", "data": { "result": [] } }));
    }

    let rows = match state.poll_status.load(Ordering::SeqCst) {
        0 => json!([]),
        3 => json!([{ "faceswap_status": 3, "url": RESULT_URL, "_id": JOB_ID }]),
        4 => json!([{ "faceswap_status": 4, "msg": "no face detected in source", "_id": JOB_ID }]),
        status => json!([{ "faceswap_status": status, "_id": JOB_ID }]),
    };

    Json(json!({ "code": 1000, "msg": "OK", "data": { "count": 1, "result": rows } }))
}

async fn add_voice(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> Response {
    state.clone_count.fetch_add(1, Ordering::SeqCst);

    let authorized = headers.get("xi-api-key").is_some_and(|value| value == ELEVENLABS_KEY);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": { "status": "invalid_api_key", "message": "Invalid API key" } })),
        )
            .into_response();
    }

    if !String::from_utf8_lossy(&body).contains("name=\"files\"") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["body", "files"], "msg": "field required" }] })),
        )
            .into_response();
    }

    Json(json!({ "voice_id": VOICE_ID, "requires_verification": false })).into_response()
}

async fn speech(State(state): State<Arc<MockState>>, Path(voice_id): Path<String>) -> Response {
    state.speech_count.fetch_add(1, Ordering::SeqCst);

    if voice_id != VOICE_ID {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": { "status": "voice_not_found", "message": "A voice with that id was not found." } })),
        )
            .into_response();
    }

    ([(header::CONTENT_TYPE, "audio/mpeg")], AUDIO).into_response()
}

async fn clip(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.media_count.fetch_add(1, Ordering::SeqCst);
    *state.last_media_auth.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);

    let total = CLIP.len();

    if let Some(range) = headers.get(header::RANGE).and_then(|value| value.to_str().ok())
        && let Some(end) = range
            .strip_prefix("bytes=0-")
            .and_then(|end| end.parse::<usize>().ok())
    {
        let end = end.min(total - 1);
        return (
            StatusCode::PARTIAL_CONTENT,
            [
                (header::CONTENT_TYPE, "video/quicktime".to_string()),
                (header::CONTENT_RANGE, format!("bytes 0-{end}/{total}")),
                (header::ACCEPT_RANGES, "bytes".to_string()),
            ],
            &CLIP[..=end],
        )
            .into_response();
    }

    ([(header::CONTENT_TYPE, "video/quicktime")], CLIP).into_response()
}

async fn expired(State(state): State<Arc<MockState>>) -> Response {
    state.media_count.fetch_add(1, Ordering::SeqCst);

    (
        StatusCode::FORBIDDEN,
        [(header::CONTENT_TYPE, "application/xml")],
        "<Error><Code>AccessDenied</Code><Message>Request has expired</Message></Error>",
    )
        .into_response()
}
