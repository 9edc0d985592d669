use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A face located in an image: the image URL plus the provider's landmark token
///
/// `landmarks` is opaque and is passed to the provider exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaceDescriptor {
    pub location_url: String,
    pub landmarks: String,
}

/// Which provider operation a swap uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SwapKind {
    Image,
    Video,
}

/// Target media for a swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapTarget {
    /// Replace one face in a still image
    Image(FaceDescriptor),
    /// Replace every listed face in a video
    Video {
        video_url: String,
        faces: Vec<FaceDescriptor>,
    },
}

impl SwapTarget {
    pub const fn kind(&self) -> SwapKind {
        match self {
            Self::Image(_) => SwapKind::Image,
            Self::Video { .. } => SwapKind::Video,
        }
    }
}

/// Composite key into the scenario table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioKey {
    pub category: String,
    pub scenario: String,
    pub subject: String,
}

impl std::fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.scenario, self.subject)
    }
}

/// A user photo submitted for swapping
#[derive(Debug)]
pub struct SwapUpload {
    pub image: Bytes,
    pub filename: Option<String>,
    pub content_type: String,
    pub key: ScenarioKey,
    /// Overrides the configured face enhancement default
    pub enhance: Option<bool>,
}

/// Normalized job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Result of a single status query
///
/// The result URL only exists on `Succeeded`, so a job can never carry a
/// URL in any other state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded { result_url: String },
    Failed { message: Option<String> },
}

impl JobStatus {
    pub const fn state(&self) -> JobState {
        match self {
            Self::Pending => JobState::Pending,
            Self::Running => JobState::Running,
            Self::Succeeded { .. } => JobState::Succeeded,
            Self::Failed { .. } => JobState::Failed,
        }
    }
}

/// A face-swap job at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Identifier used for status lookups
    pub id: String,
    /// The provider's own job number, when it reports one
    pub provider_job_id: Option<String>,
    status: JobStatus,
}

impl Job {
    /// A freshly submitted job
    pub const fn pending(id: String, provider_job_id: Option<String>) -> Self {
        Self {
            id,
            provider_job_id,
            status: JobStatus::Pending,
        }
    }

    pub const fn status(&self) -> &JobStatus {
        &self.status
    }

    pub const fn state(&self) -> JobState {
        self.status.state()
    }

    pub fn result_url(&self) -> Option<&str> {
        match &self.status {
            JobStatus::Succeeded { result_url } => Some(result_url),
            _ => None,
        }
    }

    /// Record a polled status
    ///
    /// Terminal states are final; a status observed after one is ignored and
    /// `false` is returned.
    pub fn observe(&mut self, status: JobStatus) -> bool {
        if self.state().is_terminal() {
            tracing::debug!(job_id = %self.id, state = %self.state(), "ignoring status for finished job");
            return false;
        }

        self.status = status;
        true
    }
}

/// Outcome of a successful submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub job: Job,
    /// Where the provider says the result will appear
    pub result_url_hint: Option<String>,
}

/// Response for swap submissions
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    pub job_id: String,
    pub provider_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
}

/// Response for job status queries
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message: Option<String>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        let state = job.state();
        let (result_url, provider_message) = match job.status {
            JobStatus::Succeeded { result_url } => (Some(result_url), None),
            JobStatus::Failed { message } => (None, message),
            JobStatus::Pending | JobStatus::Running => (None, None),
        };

        Self {
            job_id: job.id,
            state,
            result_url,
            provider_message,
        }
    }
}
