//! Seam to the external training runtime.

use crate::error::{TrainingError, TrainingResult};
use crate::job::{AssembledJob, JobId};
use crate::layout::ArtifactLayout;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Proof that a runtime accepted a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchReceipt {
    pub job_id: JobId,
    pub runtime: String,
    pub launched_at: DateTime<Utc>,
    /// Plan written for the runtime, if any.
    pub plan_path: Option<PathBuf>,
}

#[async_trait]
pub trait TrainingRuntime: Send + Sync {
    fn id(&self) -> &'static str;

    async fn launch(&self, job: &AssembledJob) -> TrainingResult<LaunchReceipt>;
}

/// Writes the assembled job as `trainer_plan.json` under the artifact
/// library, for a runtime that picks plans up from disk.
#[derive(Debug, Default)]
pub struct PlanWriterRuntime;

#[async_trait]
impl TrainingRuntime for PlanWriterRuntime {
    fn id(&self) -> &'static str {
        "plan-writer"
    }

    async fn launch(&self, job: &AssembledJob) -> TrainingResult<LaunchReceipt> {
        let artifacts = job.config.require_artifact_library().map_err(|e| {
            TrainingError::Runtime(format!("cannot write trainer plan: {e}"))
        })?;

        let layout = ArtifactLayout::for_project(artifacts, &job.config.project);
        layout.ensure_job_dirs(&job.job_id).await?;

        let plan_path = layout.trainer_plan_path(&job.job_id);
        tokio::fs::write(&plan_path, serde_json::to_vec_pretty(job)?).await?;

        tracing::info!(job_id = %job.job_id, plan = %plan_path.display(), "Trainer plan written");
        Ok(LaunchReceipt {
            job_id: job.job_id.clone(),
            runtime: self.id().to_string(),
            launched_at: Utc::now(),
            plan_path: Some(plan_path),
        })
    }
}
