//! Job configuration.
//!
//! `ModelConfig` is the raw mapping read from a YAML job file. It is never
//! mutated; [`ModelConfig::normalize`] produces a fully defaulted
//! [`NormalizedConfig`] that the assemblers consume.

use crate::error::{ConfigError, ConfigResult};
use crate::logger::LoggerBackend;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Project name used when the job does not set one.
pub const DEFAULT_PROJECT: &str = "my_project";

/// Metric ranked by the checkpoint callback when `fom` is absent.
pub const DEFAULT_FOM: &str = "val_loss";

/// Overrides the job's model library root.
pub const ENV_MODEL_LIBRARY: &str = "TRAINTRACK_MODEL_LIBRARY";

/// Overrides the job's artifact library.
pub const ENV_ARTIFACT_LIBRARY: &str = "TRAINTRACK_ARTIFACT_LIBRARY";

/// Optimization direction of the figure of merit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FomMode {
    #[default]
    Min,
    Max,
}

impl std::fmt::Display for FomMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
        }
    }
}

/// `callbacks:` accepts a single name or a sequence of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallbackList {
    One(String),
    Many(Vec<String>),
}

impl CallbackList {
    /// Normalize to a sequence, preserving order and multiplicity.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }
}

/// Accept `resume_id: abc123` as well as `resume_id: 20240101`.
fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OpaqueId {
        Str(String),
        Int(i64),
    }

    Ok(Option::<OpaqueId>::deserialize(deserializer)?.map(|id| match id {
        OpaqueId::Str(s) => s,
        OpaqueId::Int(n) => n.to_string(),
    }))
}

/// Raw job configuration as written in the YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model set (namespace) holding the components.
    pub set: String,
    /// Model symbol to resolve within the set.
    pub name: String,
    /// Root of the model library.
    pub model_library: PathBuf,
    /// Model-specific configuration file, passed through untouched.
    #[serde(default)]
    pub config: Option<PathBuf>,
    /// Tracking backend; absent and `null` both mean no logger.
    #[serde(default)]
    pub logger: Option<LoggerBackend>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub artifact_library: Option<PathBuf>,
    /// Identifier of a previous run to continue. Absent means a fresh start.
    #[serde(default, deserialize_with = "deserialize_opaque_id")]
    pub resume_id: Option<String>,
    #[serde(default)]
    pub callbacks: Option<CallbackList>,
    #[serde(default)]
    pub fom: Option<String>,
    #[serde(default)]
    pub fom_mode: Option<FomMode>,
    #[serde(default)]
    pub max_epochs: Option<u32>,
    #[serde(default)]
    pub checkpoint_path: Option<PathBuf>,
    /// Passed through unchanged; `-1` runs every validation batch.
    #[serde(default)]
    pub sanity_steps: Option<i32>,
}

impl ModelConfig {
    /// Load a job configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply `TRAINTRACK_*` environment overrides on top of the file values.
    #[must_use]
    pub fn apply_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(library) = lookup(ENV_MODEL_LIBRARY).filter(|v| !v.is_empty()) {
            tracing::debug!(model_library = %library, "Model library overridden from environment");
            self.model_library = PathBuf::from(library);
        }
        if let Some(artifacts) = lookup(ENV_ARTIFACT_LIBRARY).filter(|v| !v.is_empty()) {
            tracing::debug!(artifact_library = %artifacts, "Artifact library overridden from environment");
            self.artifact_library = Some(PathBuf::from(artifacts));
        }
        self
    }

    /// Produce a fully defaulted copy of this configuration.
    #[must_use]
    pub fn normalize(&self) -> NormalizedConfig {
        NormalizedConfig {
            set: self.set.clone(),
            name: self.name.clone(),
            model_library: self.model_library.clone(),
            config: self.config.clone(),
            logger: self.logger,
            project: self.project.clone().unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
            artifact_library: self.artifact_library.clone(),
            resume_id: self.resume_id.clone(),
            callbacks: self.callbacks.as_ref().map(CallbackList::to_vec).unwrap_or_default(),
            fom: self.fom.clone().unwrap_or_else(|| DEFAULT_FOM.to_string()),
            fom_mode: self.fom_mode.unwrap_or_default(),
            max_epochs: self.max_epochs,
            checkpoint_path: self.checkpoint_path.clone(),
            sanity_steps: self.sanity_steps,
        }
    }
}

/// Job configuration with every optional key defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedConfig {
    pub set: String,
    pub name: String,
    pub model_library: PathBuf,
    pub config: Option<PathBuf>,
    pub logger: Option<LoggerBackend>,
    pub project: String,
    pub artifact_library: Option<PathBuf>,
    pub resume_id: Option<String>,
    pub callbacks: Vec<String>,
    pub fom: String,
    pub fom_mode: FomMode,
    pub max_epochs: Option<u32>,
    pub checkpoint_path: Option<PathBuf>,
    pub sanity_steps: Option<i32>,
}

impl NormalizedConfig {
    pub fn require_max_epochs(&self) -> ConfigResult<u32> {
        self.max_epochs.ok_or(ConfigError::MissingKey("max_epochs"))
    }

    pub fn require_artifact_library(&self) -> ConfigResult<&Path> {
        self.artifact_library.as_deref().ok_or(ConfigError::MissingKey("artifact_library"))
    }

    pub fn require_checkpoint_path(&self) -> ConfigResult<&Path> {
        self.checkpoint_path.as_deref().ok_or(ConfigError::MissingKey("checkpoint_path"))
    }
}

/// Read the `resume_id` of a pipeline stage mapping.
#[must_use]
pub fn get_resume_id(stage: &serde_yaml::Mapping) -> Option<String> {
    match stage.get("resume_id")? {
        serde_yaml::Value::String(id) => Some(id.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
