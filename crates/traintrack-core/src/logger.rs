//! Experiment logger factory.
//!
//! The tracking backends themselves live in the training runtime; this module
//! only decides which one to use and which settings it is constructed with.

use crate::config::NormalizedConfig;
use crate::error::TrainingResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Selector values accepted by the `logger:` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerBackend {
    /// Remote experiment tracking (Weights & Biases).
    Wandb,
    /// Local event files (TensorBoard).
    Tb,
    /// Metadata lineage (CMF / MLMD).
    Cmf,
}

impl std::fmt::Display for LoggerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wandb => write!(f, "wandb"),
            Self::Tb => write!(f, "tb"),
            Self::Cmf => write!(f, "cmf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WandbLogger {
    pub project: String,
    pub save_dir: PathBuf,
    /// Run id; set when resuming so the remote run is continued.
    pub id: Option<String>,
}

impl WandbLogger {
    pub fn from_config(config: &NormalizedConfig) -> TrainingResult<Self> {
        Ok(Self {
            project: config.project.clone(),
            save_dir: config.require_artifact_library()?.to_path_buf(),
            id: config.resume_id.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorBoardLogger {
    pub name: String,
    pub save_dir: PathBuf,
    pub version: Option<String>,
}

impl TensorBoardLogger {
    pub fn from_config(config: &NormalizedConfig) -> TrainingResult<Self> {
        Ok(Self {
            name: config.project.clone(),
            save_dir: config.require_artifact_library()?.to_path_buf(),
            version: config.resume_id.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmfLogger {
    /// `<artifact_library>/<project>_mlmd`
    pub mlmd_filename: PathBuf,
    pub pipeline_name: String,
    pub pipeline_stage: String,
    pub execution_type: String,
}

impl CmfLogger {
    pub fn from_config(config: &NormalizedConfig) -> TrainingResult<Self> {
        let artifacts = config.require_artifact_library()?;
        Ok(Self {
            mlmd_filename: artifacts.join(format!("{}_mlmd", config.project)),
            pipeline_name: config.project.clone(),
            pipeline_stage: config.set.clone(),
            execution_type: config.set.clone(),
        })
    }
}

/// A constructed experiment logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum Logger {
    Wandb(WandbLogger),
    #[serde(rename = "tb")]
    TensorBoard(TensorBoardLogger),
    Cmf(CmfLogger),
}

impl Logger {
    #[must_use]
    pub fn backend(&self) -> LoggerBackend {
        match self {
            Self::Wandb(_) => LoggerBackend::Wandb,
            Self::TensorBoard(_) => LoggerBackend::Tb,
            Self::Cmf(_) => LoggerBackend::Cmf,
        }
    }
}

/// Build the logger selected by `config.logger`, or `None` when no logger
/// is configured.
pub fn build_logger(config: &NormalizedConfig) -> TrainingResult<Option<Logger>> {
    let Some(backend) = config.logger else {
        tracing::info!("No logger configured");
        return Ok(None);
    };

    let logger = match backend {
        LoggerBackend::Wandb => Logger::Wandb(WandbLogger::from_config(config)?),
        LoggerBackend::Tb => Logger::TensorBoard(TensorBoardLogger::from_config(config)?),
        LoggerBackend::Cmf => Logger::Cmf(CmfLogger::from_config(config)?),
    };

    tracing::info!(backend = %backend, project = %config.project, "Logger retrieved");
    Ok(Some(logger))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, DEFAULT_PROJECT};
    use crate::error::{ConfigError, TrainingError};

    fn normalized(extra: &str) -> NormalizedConfig {
        ModelConfig::from_yaml_str(&format!("set: A\nname: Net\nmodel_library: /lib\n{extra}"))
            .unwrap()
            .normalize()
    }

    #[test]
    fn test_no_logger_selector_yields_none() {
        assert!(build_logger(&normalized("logger: null\n")).unwrap().is_none());
        assert!(build_logger(&normalized("")).unwrap().is_none());
    }

    #[test]
    fn test_wandb_defaults_project() {
        let logger = build_logger(&normalized("logger: wandb\nartifact_library: /out\n")).unwrap().unwrap();

        assert_eq!(
            logger,
            Logger::Wandb(WandbLogger {
                project: DEFAULT_PROJECT.to_string(),
                save_dir: PathBuf::from("/out"),
                id: None,
            })
        );
    }

    #[test]
    fn test_tensorboard_uses_resume_id_as_version() {
        let logger =
            build_logger(&normalized("logger: tb\nproject: mnist\nartifact_library: /out\nresume_id: run7\n"))
                .unwrap()
                .unwrap();

        match logger {
            Logger::TensorBoard(tb) => {
                assert_eq!(tb.name, "mnist");
                assert_eq!(tb.version.as_deref(), Some("run7"));
            }
            other => panic!("expected tensorboard logger, got {other:?}"),
        }
    }

    #[test]
    fn test_cmf_derives_mlmd_filename_and_stage() {
        let logger = build_logger(&normalized("logger: cmf\nproject: mnist\nartifact_library: /out\n")).unwrap().unwrap();

        assert_eq!(logger.backend(), LoggerBackend::Cmf);
        match logger {
            Logger::Cmf(cmf) => {
                assert_eq!(cmf.mlmd_filename, PathBuf::from("/out/mnist_mlmd"));
                assert_eq!(cmf.pipeline_name, "mnist");
                assert_eq!(cmf.pipeline_stage, "A");
                assert_eq!(cmf.execution_type, "A");
            }
            other => panic!("expected cmf logger, got {other:?}"),
        }
    }

    #[test]
    fn test_backend_without_artifact_library_fails() {
        let result = build_logger(&normalized("logger: wandb\n"));
        assert!(matches!(result, Err(TrainingError::Config(ConfigError::MissingKey("artifact_library")))));
    }
}
