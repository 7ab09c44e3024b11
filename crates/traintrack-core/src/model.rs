use crate::config::NormalizedConfig;
use crate::error::{ConfigError, TrainingResult};
use crate::module::ComponentClass;
use crate::registry::ComponentRegistry;
use std::path::Path;

/// Resolve the model class named by `config.name` in `config.set`.
pub fn build_model(config: &NormalizedConfig, registry: &ComponentRegistry) -> TrainingResult<ComponentClass> {
    check_library_root(config, registry)?;

    tracing::info!(set = %config.set, name = %config.name, "Building model...");
    let class = registry.require(&config.set, &config.name)?;
    tracing::info!(model = %class.qualified_name(), "Model built");
    Ok(class)
}

/// Components must come from the library the job names.
pub(crate) fn check_library_root(config: &NormalizedConfig, registry: &ComponentRegistry) -> TrainingResult<()> {
    if !same_directory(registry.library_root(), &config.model_library) {
        return Err(ConfigError::Invalid(format!(
            "registry is rooted at {} but the job uses model_library {}",
            registry.library_root().display(),
            config.model_library.display()
        ))
        .into());
    }
    Ok(())
}

/// Compares resolved paths; falls back to the literal paths when either cannot be resolved.
fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
