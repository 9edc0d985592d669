use crate::{
    akool::AkoolClient,
    error::{FaceSwapError, Result},
    scenario::{CatalogEntry, ScenarioTable},
    storage::ObjectStoreGateway,
    types::{Job, Submission, SwapKind, SwapUpload},
};

const MAX_JOB_ID_LEN: usize = 64;

/// Face-swap pipeline: upload, detect, resolve, submit and poll
pub struct Server {
    storage: ObjectStoreGateway,
    akool: AkoolClient,
    scenarios: ScenarioTable,
    enhance: bool,
}

impl Server {
    /// Run a swap submission end to end
    ///
    /// The scenario is resolved before anything is uploaded, so an unknown
    /// key never leaves an orphaned object behind.
    pub async fn swap(&self, upload: SwapUpload, kind: SwapKind) -> Result<Submission> {
        let target = self.scenarios.resolve(&upload.key, kind)?;

        let stored = self
            .storage
            .store(upload.image, &upload.content_type, upload.filename.as_deref())
            .await?;

        let source = self.akool.detect(&stored.url).await?;

        let enhance = upload.enhance.unwrap_or(self.enhance);
        let submission = self.akool.submit(&source, &target, enhance).await?;

        tracing::info!(
            scenario = %upload.key,
            %kind,
            job_id = %submission.job.id,
            upload = %stored.key,
            "face-swap started"
        );

        Ok(submission)
    }

    /// Current view of a job, from a single status query
    pub async fn job(&self, job_id: &str) -> Result<Job> {
        validate_job_id(job_id)?;

        let status = self.akool.poll(job_id).await?;

        let mut job = Job::pending(job_id.to_string(), None);
        job.observe(status);

        Ok(job)
    }

    pub fn scenarios(&self) -> Vec<CatalogEntry> {
        self.scenarios.catalog()
    }
}

fn validate_job_id(job_id: &str) -> Result<()> {
    let well_formed = !job_id.is_empty()
        && job_id.len() <= MAX_JOB_ID_LEN
        && job_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(FaceSwapError::InvalidRequest(format!("malformed job id '{job_id}'")))
    }
}

/// Builder for constructing the face-swap server from configuration
pub struct FaceSwapServerBuilder<'a> {
    config: &'a mirage_config::Config,
}

impl<'a> FaceSwapServerBuilder<'a> {
    pub const fn new(config: &'a mirage_config::Config) -> Self {
        Self { config }
    }

    pub fn build(self) -> anyhow::Result<Server> {
        let faceswap = &self.config.faceswap;

        let scenarios = match faceswap.scenarios {
            Some(ref path) => ScenarioTable::from_file(path)?,
            None => ScenarioTable::builtin()?,
        };

        tracing::debug!(entries = scenarios.len(), "scenario table loaded");

        let storage = ObjectStoreGateway::from_config(&self.config.storage, faceswap.timeouts.upload)?;

        Ok(Server {
            storage,
            akool: AkoolClient::new(faceswap),
            scenarios,
            enhance: faceswap.enhance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_are_checked() {
        assert!(validate_job_id("6593c94c0ef703e8c055e3c8").is_ok());
        assert!(validate_job_id("job_1-a").is_ok());

        let too_long = "a".repeat(65);
        for bad in ["", "../admin", "a b", "id?x=1", too_long.as_str()] {
            assert!(validate_job_id(bad).is_err(), "{bad}");
        }
    }
}
