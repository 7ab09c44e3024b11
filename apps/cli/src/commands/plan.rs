//! Plan and launch command implementations.

use crate::JobArgs;
use anyhow::{Context, Result};
use colored::Colorize;
use traintrack_core::{
    assemble_job, AssembleOptions, AssembledJob, ComponentRegistry, ModelConfig, PlanWriterRuntime,
    TrainerMode, TrainingHook, TrainingRuntime,
};

/// Load the job file and apply overrides: CLI flag > environment > file.
fn load_config(args: &JobArgs) -> Result<ModelConfig> {
    let mut config = ModelConfig::load(&args.config)
        .with_context(|| format!("Failed to load job configuration {}", args.config.display()))?
        .apply_env_overrides();

    if let Some(library) = &args.model_library {
        config.model_library = library.clone();
    }
    if let Some(artifacts) = &args.artifact_library {
        config.artifact_library = Some(artifacts.clone());
    }
    Ok(config)
}

fn assemble(args: &JobArgs) -> Result<AssembledJob> {
    let config = load_config(args)?;
    let registry = ComponentRegistry::new(&config.model_library);
    let options = AssembleOptions { include_rate_monitor: args.lr_monitor };

    assemble_job(&config, &registry, options).context("Failed to assemble training job")
}

pub fn execute(args: &JobArgs, json_output: bool) -> Result<()> {
    let job = assemble(args)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&job)?);
        return Ok(());
    }

    print_summary(&job);
    Ok(())
}

pub async fn launch(args: &JobArgs, json_output: bool) -> Result<()> {
    let job = assemble(args)?;
    let runtime = PlanWriterRuntime;
    let receipt = runtime.launch(&job).await.context("Failed to hand job to the runtime")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }

    print_summary(&job);
    println!("{}", "Job handed off".bold().green());
    println!("  Runtime: {}", receipt.runtime.cyan());
    if let Some(path) = &receipt.plan_path {
        println!("  Plan:    {}", path.display().to_string().dimmed());
    }
    println!();
    Ok(())
}

fn print_summary(job: &AssembledJob) {
    let trainer = &job.trainer;
    let mode = match trainer.mode() {
        TrainerMode::Fresh => "fresh".green(),
        TrainerMode::Resume => "resume".yellow(),
    };

    println!();
    println!("{}", format!("Job {}", job.job_id).bold().cyan());
    println!("  Model:      {}", job.model.qualified_name());
    println!("  Mode:       {mode}");
    println!("  Max epochs: {}", trainer.max_epochs);
    println!(
        "  Topology:   {:?}/{:?} x{} devices x{} nodes",
        trainer.topology.strategy, trainer.topology.accelerator, trainer.topology.devices, trainer.topology.num_nodes
    );
    match &trainer.logger {
        Some(logger) => println!("  Logger:     {}", logger.backend()),
        None => println!("  Logger:     {}", "none".dimmed()),
    }
    if let Some(path) = trainer.resume_from_checkpoint() {
        println!("  Resume:     {}", path.display());
    }
    if let Some(steps) = trainer.num_sanity_val_steps {
        println!("  Sanity:     {steps} steps");
    }
    println!("  Callbacks:");
    for callback in &trainer.callbacks {
        println!("    - {}", callback.name());
    }
    println!();
}
