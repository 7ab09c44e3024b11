//! Trainer assembly.
//!
//! Every job runs on the same topology: DDP over GPUs, one device per node,
//! two nodes. A job either starts fresh or resumes a previous run; the resume
//! path is the fresh configuration with resume settings layered on top.

use crate::callbacks::{build_callbacks, Callback, CallbackSet, ModelCheckpoint};
use crate::config::NormalizedConfig;
use crate::error::{ConfigResult, TrainingResult};
use crate::logger::Logger;
use crate::registry::ComponentRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sanity validation steps run before a resumed job when `sanity_steps` is unset.
pub const DEFAULT_SANITY_STEPS: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Ddp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accelerator {
    Gpu,
}

/// Distributed execution topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub strategy: Strategy,
    pub accelerator: Accelerator,
    /// Devices per node.
    pub devices: u32,
    pub num_nodes: u32,
}

impl Topology {
    #[must_use]
    pub const fn fixed() -> Self {
        Self { strategy: Strategy::Ddp, accelerator: Accelerator::Gpu, devices: 1, num_nodes: 2 }
    }

    #[must_use]
    pub const fn world_size(&self) -> u32 {
        self.devices * self.num_nodes
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::fixed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainerMode {
    Fresh,
    Resume,
}

impl std::fmt::Display for TrainerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh"),
            Self::Resume => write!(f, "resume"),
        }
    }
}

/// Where a resumed run picks up from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    pub resume_id: String,
    pub checkpoint_path: PathBuf,
}

/// Resume settings read from the job configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeOptions {
    pub state: ResumeState,
    pub sanity_steps: i32,
}

impl ResumeOptions {
    /// `None` for a fresh start. A resume without `checkpoint_path` is an error.
    pub fn from_config(config: &NormalizedConfig) -> ConfigResult<Option<Self>> {
        let Some(resume_id) = &config.resume_id else {
            return Ok(None);
        };

        Ok(Some(Self {
            state: ResumeState {
                resume_id: resume_id.clone(),
                checkpoint_path: config.require_checkpoint_path()?.to_path_buf(),
            },
            sanity_steps: config.sanity_steps.unwrap_or(DEFAULT_SANITY_STEPS),
        }))
    }
}

/// A fully assembled trainer, ready for the training runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerSpec {
    pub max_epochs: u32,
    pub topology: Topology,
    pub logger: Option<Logger>,
    pub callbacks: CallbackSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<ResumeState>,
    /// Runtime default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_sanity_val_steps: Option<i32>,
}

impl TrainerSpec {
    #[must_use]
    pub fn mode(&self) -> TrainerMode {
        if self.resume.is_some() { TrainerMode::Resume } else { TrainerMode::Fresh }
    }

    #[must_use]
    pub fn resume_from_checkpoint(&self) -> Option<&Path> {
        self.resume.as_ref().map(|r| r.checkpoint_path.as_path())
    }

    /// The checkpoint-saving callback (always the last callback).
    #[must_use]
    pub fn checkpoint_callback(&self) -> Option<&ModelCheckpoint> {
        match self.callbacks.last() {
            Some(Callback::ModelCheckpoint(checkpoint)) => Some(checkpoint),
            _ => None,
        }
    }

    fn apply_resume(&mut self, options: ResumeOptions) {
        self.resume = Some(options.state);
        self.num_sanity_val_steps = Some(options.sanity_steps);
    }
}

/// Builds [`TrainerSpec`]s from job configurations.
#[derive(Debug)]
pub struct TrainerAssembler<'a> {
    registry: &'a ComponentRegistry,
    include_rate_monitor: bool,
}

impl<'a> TrainerAssembler<'a> {
    #[must_use]
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self { registry, include_rate_monitor: false }
    }

    /// Add an epoch-level learning rate monitor after the configured callbacks.
    #[must_use]
    pub fn with_rate_monitor(mut self, include: bool) -> Self {
        self.include_rate_monitor = include;
        self
    }

    pub fn assemble(&self, config: &NormalizedConfig, logger: Option<Logger>) -> TrainingResult<TrainerSpec> {
        let max_epochs = config.require_max_epochs()?;
        let resume = ResumeOptions::from_config(config)?;

        let mut callbacks = build_callbacks(config, self.registry, self.include_rate_monitor)?;
        callbacks.push(Callback::ModelCheckpoint(ModelCheckpoint::new(config.fom.clone(), config.fom_mode)));

        let mut spec = TrainerSpec {
            max_epochs,
            topology: Topology::fixed(),
            logger,
            callbacks,
            resume: None,
            num_sanity_val_steps: None,
        };

        if let Some(resume) = resume {
            spec.apply_resume(resume);
        }

        tracing::info!(
            mode = %spec.mode(),
            max_epochs,
            callbacks = spec.callbacks.len(),
            world_size = spec.topology.world_size(),
            "Trainer built"
        );
        Ok(spec)
    }
}

/// Assemble a trainer with the default options.
pub fn build_trainer(
    config: &NormalizedConfig,
    registry: &ComponentRegistry,
    logger: Option<Logger>,
) -> TrainingResult<TrainerSpec> {
    TrainerAssembler::new(registry).assemble(config, logger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FomMode, ModelConfig};
    use crate::error::{ConfigError, TrainingError};
    use tempfile::TempDir;

    fn library() -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("A").join("Models");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hooks.toml"), "[symbols.EarlyStop]\n").unwrap();
        temp
    }

    fn config(root: &Path, extra: &str) -> NormalizedConfig {
        let yaml = format!("set: A\nname: Net\nmodel_library: {}\nmax_epochs: 10\n{extra}", root.display());
        ModelConfig::from_yaml_str(&yaml).unwrap().normalize()
    }

    #[test]
    fn test_fresh_trainer_has_no_resume_settings() {
        let lib = library();
        let registry = ComponentRegistry::new(lib.path());
        let spec = build_trainer(&config(lib.path(), "resume_id: null\n"), &registry, None).unwrap();

        assert_eq!(spec.mode(), TrainerMode::Fresh);
        assert!(spec.resume_from_checkpoint().is_none());
        assert!(spec.num_sanity_val_steps.is_none());
        assert_eq!(spec.topology, Topology::fixed());
        assert_eq!(spec.topology.world_size(), 2);
    }

    #[test]
    fn test_resume_defaults_sanity_steps() {
        let lib = library();
        let registry = ComponentRegistry::new(lib.path());
        let spec = build_trainer(
            &config(lib.path(), "resume_id: abc\ncheckpoint_path: /ckpt/last.ckpt\n"),
            &registry,
            None,
        )
        .unwrap();

        assert_eq!(spec.mode(), TrainerMode::Resume);
        assert_eq!(spec.resume_from_checkpoint(), Some(Path::new("/ckpt/last.ckpt")));
        assert_eq!(spec.num_sanity_val_steps, Some(DEFAULT_SANITY_STEPS));
        assert_eq!(spec.resume.as_ref().unwrap().resume_id, "abc");
    }

    #[test]
    fn test_resume_uses_configured_sanity_steps() {
        let lib = library();
        let registry = ComponentRegistry::new(lib.path());
        let spec = build_trainer(
            &config(lib.path(), "resume_id: abc\ncheckpoint_path: /ckpt/last.ckpt\nsanity_steps: 0\n"),
            &registry,
            None,
        )
        .unwrap();

        assert_eq!(spec.num_sanity_val_steps, Some(0));
    }

    #[test]
    fn test_resume_passes_negative_sanity_steps_through() {
        let lib = library();
        let registry = ComponentRegistry::new(lib.path());
        let spec = build_trainer(
            &config(lib.path(), "resume_id: abc\ncheckpoint_path: /ckpt/last.ckpt\nsanity_steps: -1\n"),
            &registry,
            None,
        )
        .unwrap();

        assert_eq!(spec.num_sanity_val_steps, Some(-1));
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["num_sanity_val_steps"], -1);
    }

    #[test]
    fn test_resume_without_checkpoint_path_fails() {
        let lib = library();
        let registry = ComponentRegistry::new(lib.path());
        let result = build_trainer(&config(lib.path(), "resume_id: abc\n"), &registry, None);

        assert!(matches!(result, Err(TrainingError::Config(ConfigError::MissingKey("checkpoint_path")))));
    }

    #[test]
    fn test_missing_max_epochs_fails_fast() {
        let lib = library();
        let registry = ComponentRegistry::new(lib.path());
        let yaml = format!("set: A\nname: Net\nmodel_library: {}\n", lib.path().display());
        let config = ModelConfig::from_yaml_str(&yaml).unwrap().normalize();

        let result = build_trainer(&config, &registry, None);
        assert!(matches!(result, Err(TrainingError::Config(ConfigError::MissingKey("max_epochs")))));
    }

    #[test]
    fn test_checkpoint_callback_is_last_and_uses_fom_defaults() {
        let lib = library();
        let registry = ComponentRegistry::new(lib.path());
        let spec = TrainerAssembler::new(&registry)
            .with_rate_monitor(true)
            .assemble(&config(lib.path(), "callbacks: EarlyStop\n"), None)
            .unwrap();

        assert_eq!(spec.callbacks.names(), vec!["EarlyStop", "LearningRateMonitor", "ModelCheckpoint"]);
        let checkpoint = spec.checkpoint_callback().unwrap();
        assert_eq!(checkpoint.monitor, "val_loss");
        assert_eq!(checkpoint.mode, FomMode::Min);
        assert_eq!(checkpoint.save_top_k, 2);
        assert!(checkpoint.save_last);
    }

    #[test]
    fn test_fom_overrides_are_used_verbatim() {
        let lib = library();
        let registry = ComponentRegistry::new(lib.path());
        let spec = build_trainer(&config(lib.path(), "fom: val_acc\nfom_mode: max\n"), &registry, None).unwrap();

        let checkpoint = spec.checkpoint_callback().unwrap();
        assert_eq!(checkpoint.monitor, "val_acc");
        assert_eq!(checkpoint.mode, FomMode::Max);
    }

    #[test]
    fn test_fresh_plan_omits_resume_fields_in_json() {
        let lib = library();
        let registry = ComponentRegistry::new(lib.path());
        let spec = build_trainer(&config(lib.path(), ""), &registry, None).unwrap();

        let json = serde_json::to_value(&spec).unwrap();
        assert!(json.get("resume").is_none());
        assert!(json.get("num_sanity_val_steps").is_none());
        assert_eq!(json["topology"]["strategy"], "ddp");
        assert_eq!(json["topology"]["accelerator"], "gpu");
        assert_eq!(json["topology"]["num_nodes"], 2);
    }
}
