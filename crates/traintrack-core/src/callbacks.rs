//! Callback assembly and the training lifecycle hooks.

use crate::config::{FomMode, NormalizedConfig};
use crate::error::TrainingResult;
use crate::model::check_library_root;
use crate::module::ComponentInstance;
use crate::registry::ComponentRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State handed to hooks at the end of an epoch.
#[derive(Debug, Clone, Default)]
pub struct EpochContext {
    pub epoch: u32,
    pub metrics: BTreeMap<String, f64>,
    pub learning_rate: Option<f64>,
}

/// Lifecycle hook invoked by the training runtime.
pub trait TrainingHook {
    fn name(&self) -> &str;

    fn on_train_start(&mut self) {}

    fn on_epoch_end(&mut self, _ctx: &EpochContext) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingInterval {
    Step,
    #[default]
    Epoch,
}

/// Records the optimizer learning rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningRateMonitor {
    pub logging_interval: LoggingInterval,
    #[serde(skip)]
    history: Vec<(u32, f64)>,
}

impl LearningRateMonitor {
    #[must_use]
    pub fn new(logging_interval: LoggingInterval) -> Self {
        Self { logging_interval, history: Vec::new() }
    }

    /// `(epoch, learning_rate)` pairs seen so far.
    #[must_use]
    pub fn history(&self) -> &[(u32, f64)] {
        &self.history
    }
}

impl TrainingHook for LearningRateMonitor {
    fn name(&self) -> &str {
        "LearningRateMonitor"
    }

    fn on_train_start(&mut self) {
        self.history.clear();
    }

    fn on_epoch_end(&mut self, ctx: &EpochContext) {
        if self.logging_interval != LoggingInterval::Epoch {
            return;
        }
        if let Some(lr) = ctx.learning_rate {
            self.history.push((ctx.epoch, lr));
        }
    }
}

/// Checkpoint retention policy ranked by a figure of merit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCheckpoint {
    pub monitor: String,
    pub mode: FomMode,
    pub save_top_k: usize,
    pub save_last: bool,
    /// Best `(epoch, score)` pairs, best first.
    #[serde(skip)]
    best: Vec<(u32, f64)>,
    #[serde(skip)]
    last_epoch: Option<u32>,
}

impl ModelCheckpoint {
    pub const DEFAULT_TOP_K: usize = 2;

    /// Keep the two best checkpoints plus the most recent one.
    #[must_use]
    pub fn new(monitor: impl Into<String>, mode: FomMode) -> Self {
        Self {
            monitor: monitor.into(),
            mode,
            save_top_k: Self::DEFAULT_TOP_K,
            save_last: true,
            best: Vec::new(),
            last_epoch: None,
        }
    }

    #[must_use]
    pub fn best_epochs(&self) -> Vec<u32> {
        self.best.iter().map(|(epoch, _)| *epoch).collect()
    }

    #[must_use]
    pub fn best_score(&self) -> Option<f64> {
        self.best.first().map(|(_, score)| *score)
    }

    #[must_use]
    pub fn last_epoch(&self) -> Option<u32> {
        self.last_epoch
    }

    /// Epochs whose checkpoints are kept on disk, ascending.
    #[must_use]
    pub fn retained_epochs(&self) -> Vec<u32> {
        let mut epochs = self.best_epochs();
        epochs.extend(self.last_epoch);
        epochs.sort_unstable();
        epochs.dedup();
        epochs
    }

    fn is_better(&self, candidate: f64, incumbent: f64) -> bool {
        match self.mode {
            FomMode::Min => candidate < incumbent,
            FomMode::Max => candidate > incumbent,
        }
    }

    fn record(&mut self, epoch: u32, score: f64) {
        let position = self.best.iter().position(|(_, s)| self.is_better(score, *s)).unwrap_or(self.best.len());
        self.best.insert(position, (epoch, score));
        self.best.truncate(self.save_top_k);
    }
}

impl TrainingHook for ModelCheckpoint {
    fn name(&self) -> &str {
        "ModelCheckpoint"
    }

    fn on_train_start(&mut self) {
        self.best.clear();
        self.last_epoch = None;
    }

    fn on_epoch_end(&mut self, ctx: &EpochContext) {
        match ctx.metrics.get(&self.monitor) {
            Some(score) if score.is_finite() => self.record(ctx.epoch, *score),
            Some(_) => tracing::warn!(monitor = %self.monitor, epoch = ctx.epoch, "Non-finite metric, not ranked"),
            None => tracing::debug!(monitor = %self.monitor, epoch = ctx.epoch, "Monitored metric not reported"),
        }
        if self.save_last {
            self.last_epoch = Some(ctx.epoch);
        }
    }
}

/// A callback handed to the trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Callback {
    /// Component from the model library; runs inside the training runtime.
    Component(ComponentInstance),
    LearningRateMonitor(LearningRateMonitor),
    ModelCheckpoint(ModelCheckpoint),
}

impl TrainingHook for Callback {
    fn name(&self) -> &str {
        match self {
            Self::Component(instance) => instance.name(),
            Self::LearningRateMonitor(monitor) => monitor.name(),
            Self::ModelCheckpoint(checkpoint) => checkpoint.name(),
        }
    }

    fn on_train_start(&mut self) {
        match self {
            Self::Component(_) => {}
            Self::LearningRateMonitor(monitor) => monitor.on_train_start(),
            Self::ModelCheckpoint(checkpoint) => checkpoint.on_train_start(),
        }
    }

    fn on_epoch_end(&mut self, ctx: &EpochContext) {
        match self {
            Self::Component(_) => {}
            Self::LearningRateMonitor(monitor) => monitor.on_epoch_end(ctx),
            Self::ModelCheckpoint(checkpoint) => checkpoint.on_epoch_end(ctx),
        }
    }
}

/// Ordered callbacks of one trainer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackSet(Vec<Callback>);

impl CallbackSet {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, callback: Callback) {
        self.0.push(callback);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Callback> {
        self.0.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Callback> {
        self.0.last()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|callback| callback.name()).collect()
    }

    /// Dispatch `on_train_start` in order.
    pub fn on_train_start(&mut self) {
        for callback in &mut self.0 {
            callback.on_train_start();
        }
    }

    /// Dispatch `on_epoch_end` in order.
    pub fn on_epoch_end(&mut self, ctx: &EpochContext) {
        for callback in &mut self.0 {
            callback.on_epoch_end(ctx);
        }
    }
}

impl<'a> IntoIterator for &'a CallbackSet {
    type Item = &'a Callback;
    type IntoIter = std::slice::Iter<'a, Callback>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Resolve and instantiate the configured callbacks in order, optionally
/// followed by an epoch-level learning rate monitor.
///
/// Any name that does not resolve fails the whole assembly.
pub fn build_callbacks(
    config: &NormalizedConfig,
    registry: &ComponentRegistry,
    include_rate_monitor: bool,
) -> TrainingResult<CallbackSet> {
    check_library_root(config, registry)?;

    let mut callbacks = CallbackSet::new();
    for name in &config.callbacks {
        let class = registry.require(&config.set, name)?;
        callbacks.push(Callback::Component(class.instantiate()));
    }

    if include_rate_monitor {
        callbacks.push(Callback::LearningRateMonitor(LearningRateMonitor::new(LoggingInterval::Epoch)));
    }

    tracing::info!(count = callbacks.len(), "Callbacks found");
    Ok(callbacks)
}
