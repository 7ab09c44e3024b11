//! traintrack CLI - resolve components and assemble training jobs.
//!
//! Thin driver over `traintrack-core`: reads a job YAML, resolves the model
//! and callbacks from the model library, and prints or hands off the
//! assembled trainer.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// traintrack - training job assembly
#[derive(Parser, Debug)]
#[command(name = "traintrack", author, version, about = "Resolve model components and assemble training jobs")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by commands that read a job configuration.
#[derive(clap::Args, Debug, Clone)]
pub struct JobArgs {
    /// Job configuration (YAML)
    pub config: PathBuf,

    /// Override `model_library` (takes precedence over TRAINTRACK_MODEL_LIBRARY)
    #[arg(long)]
    pub model_library: Option<PathBuf>,

    /// Override `artifact_library` (takes precedence over TRAINTRACK_ARTIFACT_LIBRARY)
    #[arg(long)]
    pub artifact_library: Option<PathBuf>,

    /// Append a learning rate monitor after the configured callbacks
    #[arg(long)]
    pub lr_monitor: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one symbol in a model set
    Resolve {
        /// Symbol to resolve
        symbol: String,

        /// Model set (namespace)
        #[arg(long)]
        set: String,

        /// Model library root
        #[arg(long)]
        library: PathBuf,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List components of a model library
    List {
        /// Model library root
        #[arg(long)]
        library: PathBuf,

        /// Only list this model set
        #[arg(long)]
        set: Option<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Assemble a job and print the trainer plan
    Plan {
        #[command(flatten)]
        job: JobArgs,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Assemble a job and write its plan into the artifact library
    Launch {
        #[command(flatten)]
        job: JobArgs,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Resolve { symbol, set, library, json } => commands::resolve::execute(&library, &set, &symbol, json),
        Command::List { library, set, json } => commands::list::execute(&library, set.as_deref(), json),
        Command::Plan { job, json } => commands::plan::execute(&job, json),
        Command::Launch { job, json } => commands::plan::launch(&job, json).await,
    }
}
