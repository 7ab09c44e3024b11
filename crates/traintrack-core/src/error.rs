use std::path::PathBuf;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Component resolution errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No module in the namespace exports the symbol.
    #[error("component not found: `{symbol}` in namespace `{namespace}` (searched {})", search_path.display())]
    NotFound { namespace: String, symbol: String, search_path: PathBuf },

    /// More than one module exports the symbol.
    #[error("component `{symbol}` in namespace `{namespace}` is exported by several modules: {}", modules.join(", "))]
    Ambiguous { namespace: String, symbol: String, modules: Vec<String> },

    /// A module exists but cannot be read or parsed.
    #[error("failed to import module {}: {reason}", path.display())]
    Import { path: PathBuf, reason: String },

    /// Cache lock poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Job configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A key required by the requested operation is absent.
    #[error("missing required configuration key `{0}`")]
    MissingKey(&'static str),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
