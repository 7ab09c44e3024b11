//! traintrack
//!
//! Resolves and wires the components of a training job:
//! - Finding model and callback components in a model library (`ComponentRegistry`)
//! - Loading and normalizing job configuration (`ModelConfig`)
//! - Building the experiment logger and the callback set
//! - Assembling the trainer for fresh and resumed runs (`TrainerSpec`)
//! - Handing assembled jobs to a training runtime (`TrainingRuntime`)

pub mod callbacks;
pub mod config;
pub mod error;
pub mod job;
pub mod layout;
pub mod logger;
pub mod model;
pub mod module;
pub mod registry;
pub mod runtime;
pub mod trainer;

pub use callbacks::{build_callbacks, Callback, CallbackSet, EpochContext, LearningRateMonitor, LoggingInterval, ModelCheckpoint, TrainingHook};
pub use config::{get_resume_id, CallbackList, FomMode, ModelConfig, NormalizedConfig};
pub use error::{ConfigError, RegistryError, TrainingError, TrainingResult};
pub use job::{assemble_job, AssembleOptions, AssembledJob, JobId};
pub use layout::ArtifactLayout;
pub use logger::{build_logger, Logger, LoggerBackend};
pub use model::build_model;
pub use module::{ComponentClass, ComponentInstance, ComponentModule};
pub use registry::{find_component, ComponentRegistry};
pub use runtime::{LaunchReceipt, PlanWriterRuntime, TrainingRuntime};
pub use trainer::{build_trainer, Topology, TrainerAssembler, TrainerMode, TrainerSpec};
