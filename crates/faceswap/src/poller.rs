use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::{
    akool::{AkoolClient, Envelope, SUCCESS_CODE, excerpt},
    error::{FaceSwapError, Result},
    types::JobStatus,
};

#[derive(Debug, Deserialize)]
struct ResultList {
    #[serde(default)]
    result: Vec<ResultItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultItem {
    pub faceswap_status: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

/// Translate a provider result row into a job status
pub(crate) fn status_of(item: ResultItem) -> Result<JobStatus> {
    match item.faceswap_status {
        1 => Ok(JobStatus::Pending),
        2 => Ok(JobStatus::Running),
        3 => item
            .url
            .filter(|url| !url.is_empty())
            .map(|result_url| JobStatus::Succeeded { result_url })
            .ok_or_else(|| FaceSwapError::PollFailed("job finished without a result URL".to_string())),
        4 => Ok(JobStatus::Failed { message: item.msg }),
        other => Err(FaceSwapError::PollFailed(format!("unknown job status {other}"))),
    }
}

impl AkoolClient {
    /// Query the current status of a job once
    ///
    /// Failing to get an answer is a `PollFailed` error, never a failed job.
    pub async fn poll(&self, job_id: &str) -> Result<JobStatus> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(self.endpoint("faceswap/result/listbyids"))
            .query(&[("_ids", job_id)])
            .bearer_auth(api_key.expose_secret())
            .timeout(self.timeouts.poll)
            .send()
            .await
            .map_err(|e| {
                FaceSwapError::PollFailed(if e.is_timeout() {
                    "status query timed out".to_string()
                } else {
                    format!("status query failed: {e}")
                })
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FaceSwapError::PollFailed(format!("failed to read status response: {e}")))?;

        if !status.is_success() {
            return Err(FaceSwapError::PollFailed(format!(
                "provider returned {status}: {}",
                excerpt(&bytes)
            )));
        }

        let envelope: Envelope<ResultList> = serde_json::from_slice(&bytes)
            .map_err(|e| FaceSwapError::PollFailed(format!("malformed status response: {e}")))?;

        if envelope.code != SUCCESS_CODE {
            return Err(FaceSwapError::PollFailed(envelope.message().to_string()));
        }

        let first = envelope.data.and_then(|list| list.result.into_iter().next());

        let job_status = match first {
            // Fresh jobs may not be listed yet
            None => JobStatus::Pending,
            Some(item) => status_of(item)?,
        };

        tracing::debug!(job_id, state = %job_status.state(), "polled face-swap job");

        Ok(job_status)
    }
}
