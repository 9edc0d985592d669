use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    akool::{AkoolClient, Envelope, SUCCESS_CODE, excerpt},
    error::{FaceSwapError, Result},
    types::{FaceDescriptor, Job, Submission, SwapKind, SwapTarget},
};

/// An image path with the landmarks of the face to use in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ImageRef {
    pub path: String,
    pub opts: String,
}

impl From<&FaceDescriptor> for ImageRef {
    fn from(face: &FaceDescriptor) -> Self {
        Self {
            path: face.location_url.clone(),
            opts: face.landmarks.clone(),
        }
    }
}

/// Body of the high-quality swap endpoints
///
/// `sourceImage[i]` replaces the face described by `targetImage[i]`.
#[derive(Debug, Serialize)]
pub(crate) struct SwapRequest {
    #[serde(rename = "sourceImage")]
    pub source_image: Vec<ImageRef>,
    #[serde(rename = "targetImage")]
    pub target_image: Vec<ImageRef>,
    pub face_enhance: u8,
    #[serde(rename = "modifyImage", skip_serializing_if = "Option::is_none")]
    pub modify_image: Option<String>,
    #[serde(rename = "modifyVideo", skip_serializing_if = "Option::is_none")]
    pub modify_video: Option<String>,
    #[serde(rename = "webhookUrl", skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SwapData {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(default)]
    job_id: Option<serde_json::Value>,
    #[serde(default)]
    url: Option<String>,
}

/// Build the request body for swapping `source` into `target`
///
/// Video swaps pair the one source face with every target face in order.
pub(crate) fn build_swap_request(
    source: &FaceDescriptor,
    target: &SwapTarget,
    enhance: bool,
    webhook_url: Option<&Url>,
) -> SwapRequest {
    let (target_image, modify_image, modify_video) = match target {
        SwapTarget::Image(face) => (vec![ImageRef::from(face)], Some(face.location_url.clone()), None),
        SwapTarget::Video { video_url, faces } => (
            faces.iter().map(ImageRef::from).collect::<Vec<_>>(),
            None,
            Some(video_url.clone()),
        ),
    };

    SwapRequest {
        source_image: vec![ImageRef::from(source); target_image.len()],
        target_image,
        face_enhance: u8::from(enhance),
        modify_image,
        modify_video,
        webhook_url: webhook_url.map(ToString::to_string),
    }
}

const fn swap_path(kind: SwapKind) -> &'static str {
    match kind {
        SwapKind::Image => "faceswap/highquality/specifyimage",
        SwapKind::Video => "faceswap/highquality/specifyvideo",
    }
}

impl AkoolClient {
    /// Start a swap job
    ///
    /// Returns as soon as the provider accepts the job; completion is
    /// observed through [`AkoolClient::poll`].
    pub async fn submit(&self, source: &FaceDescriptor, target: &SwapTarget, enhance: bool) -> Result<Submission> {
        let api_key = self.api_key()?;
        let kind = target.kind();

        let timeout = match kind {
            SwapKind::Image => self.timeouts.submit_image,
            SwapKind::Video => self.timeouts.submit_video,
        };

        let body = build_swap_request(source, target, enhance, self.webhook_url.as_ref());

        tracing::debug!(
            %kind,
            pairs = body.target_image.len(),
            enhance,
            "submitting face-swap job"
        );

        let response = self
            .client
            .post(self.endpoint(swap_path(kind)))
            .bearer_auth(api_key.expose_secret())
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                FaceSwapError::SubmissionUnreachable(if e.is_timeout() {
                    format!("no response within {}s", timeout.as_secs())
                } else {
                    e.to_string()
                })
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FaceSwapError::SubmissionUnreachable(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes)
                .map_or_else(|_| excerpt(&bytes), |envelope| envelope.message().to_string());

            return Err(FaceSwapError::SubmissionUnreachable(format!(
                "provider returned {status}: {detail}"
            )));
        }

        let envelope: Envelope<SwapData> = serde_json::from_slice(&bytes)
            .map_err(|e| FaceSwapError::SubmissionRejected(format!("malformed provider response: {e}")))?;

        if envelope.code != SUCCESS_CODE {
            tracing::warn!(code = envelope.code, msg = envelope.message(), "face-swap job rejected");
            return Err(FaceSwapError::SubmissionRejected(envelope.message().to_string()));
        }

        let data = envelope
            .data
            .ok_or_else(|| FaceSwapError::SubmissionRejected("response has no job data".to_string()))?;

        let id = data
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FaceSwapError::SubmissionRejected("response has no job id".to_string()))?;

        let provider_job_id = data.job_id.and_then(|value| match value {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        tracing::info!(job_id = %id, ?provider_job_id, %kind, "face-swap job submitted");

        Ok(Submission {
            job: Job::pending(id, provider_job_id),
            result_url_hint: data.url,
        })
    }
}
