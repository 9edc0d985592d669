use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::{
    akool::{AkoolClient, excerpt},
    error::{FaceSwapError, Result},
    landmarks::RawLandmarks,
    types::FaceDescriptor,
};

#[derive(Serialize)]
struct DetectRequest<'a> {
    single_face: bool,
    image_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error_msg: Option<String>,
    #[serde(default)]
    landmarks_str: Option<RawLandmarks>,
}

impl AkoolClient {
    /// Locate the single face in the image at `image_url`
    ///
    /// Every provider-side failure, including "no face found", surfaces as
    /// `DetectionFailed`.
    pub async fn detect(&self, image_url: &str) -> Result<FaceDescriptor> {
        let api_key = self.api_key()?;

        tracing::debug!(image_url, "detecting face landmarks");

        let response = self
            .client
            .post(self.detect_url.clone())
            .bearer_auth(api_key.expose_secret())
            .timeout(self.timeouts.detect)
            .json(&DetectRequest {
                single_face: true,
                image_url,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "face detection request failed");
                FaceSwapError::DetectionFailed(if e.is_timeout() {
                    "detector timed out".to_string()
                } else {
                    format!("detector unreachable: {e}")
                })
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| FaceSwapError::DetectionFailed(format!("failed to read detector response: {e}")))?;

        if !status.is_success() {
            tracing::warn!(%status, body = %excerpt(&body), "detector returned an HTTP error");
            return Err(FaceSwapError::DetectionFailed(format!("detector returned {status}")));
        }

        let parsed: DetectResponse = serde_json::from_slice(&body)
            .map_err(|e| FaceSwapError::DetectionFailed(format!("malformed detector response: {e}")))?;

        let landmarks = parse_landmarks(parsed)?;

        Ok(FaceDescriptor {
            location_url: image_url.to_string(),
            landmarks,
        })
    }
}

fn parse_landmarks(response: DetectResponse) -> Result<String> {
    if response.error_code != Some(0) {
        let message = response.error_msg.unwrap_or_else(|| "no message from provider".to_string());
        let code = response
            .error_code
            .map_or_else(|| "missing".to_string(), |code| code.to_string());

        return Err(FaceSwapError::DetectionFailed(format!("error code {code}: {message}")));
    }

    response
        .landmarks_str
        .and_then(RawLandmarks::normalize)
        .ok_or_else(|| FaceSwapError::DetectionFailed("no usable landmarks in detector response".to_string()))
}
