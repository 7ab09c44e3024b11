use crate::error::TrainingResult;
use crate::job::JobId;
use std::path::{Path, PathBuf};

/// Filesystem layout for job artifacts inside an artifact library.
///
/// Layout is `<artifact_library>/<project>/<job_id>/...`
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Layout for one project of an artifact library.
    #[must_use]
    pub fn for_project(artifact_library: &Path, project: &str) -> Self {
        Self::new(artifact_library.join(project))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.root.join(job_id.0.as_str())
    }

    #[must_use]
    pub fn trainer_plan_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join("trainer_plan.json")
    }

    #[must_use]
    pub fn checkpoints_dir(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join("checkpoints")
    }

    pub async fn ensure_job_dirs(&self, job_id: &JobId) -> TrainingResult<()> {
        tokio::fs::create_dir_all(self.checkpoints_dir(job_id)).await?;
        Ok(())
    }
}
