use crate::config::{ModelConfig, NormalizedConfig};
use crate::error::TrainingResult;
use crate::logger::build_logger;
use crate::model::build_model;
use crate::module::ComponentClass;
use crate::registry::ComponentRegistry;
use crate::trainer::{TrainerAssembler, TrainerSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one job invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything the training runtime needs to run one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledJob {
    pub job_id: JobId,
    pub created_at: DateTime<Utc>,
    pub config: NormalizedConfig,
    pub model: ComponentClass,
    pub trainer: TrainerSpec,
}

/// Options for [`assemble_job`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    pub include_rate_monitor: bool,
}

/// Normalize the configuration, then resolve the model and build the logger
/// and trainer for it.
pub fn assemble_job(
    config: &ModelConfig,
    registry: &ComponentRegistry,
    options: AssembleOptions,
) -> TrainingResult<AssembledJob> {
    let config = config.normalize();

    let model = build_model(&config, registry)?;
    let logger = build_logger(&config)?;
    let trainer = TrainerAssembler::new(registry)
        .with_rate_monitor(options.include_rate_monitor)
        .assemble(&config, logger)?;

    let job = AssembledJob { job_id: JobId::new(), created_at: Utc::now(), config, model, trainer };
    tracing::info!(job_id = %job.job_id, model = %job.model.qualified_name(), mode = %job.trainer.mode(), "Job assembled");
    Ok(job)
}
