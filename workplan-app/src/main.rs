use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use workplan_core::{export, PlanStore, ProcessConfiguration};

use config::AppConfig;
use workflow::FileImageSource;

mod config;
mod table;
mod workflow;

#[derive(Parser)]
#[command(name = "workplan", about = "Compose manufacturing work plans from process steps")]
struct Cli {
    /// YAML config file (defaults to ./workplan.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a session script and print the resulting plan table
    Run {
        /// Session script (YAML)
        session: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Write the plan table as CSV to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Print the configuration a new plan starts from
    Defaults {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            session,
            format,
            export,
        } => run(&session, format, export.as_deref(), &config),
        Commands::Defaults { format } => {
            let defaults = ProcessConfiguration::new();
            match format {
                OutputFormat::Table => print!("{}", table::render_configuration(&defaults)?),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&defaults)?),
            }
            Ok(())
        }
    }
}

fn run(session_path: &Path, format: OutputFormat, export_path: Option<&Path>, config: &AppConfig) -> Result<()> {
    println!("--- Work Plan Composer ---");

    let session = workflow::load_session(session_path)?;
    let base_dir = session_path.parent().unwrap_or_else(|| Path::new("."));
    let images = FileImageSource::new(base_dir);

    let (store, summary) = workflow::replay_session(&session, config, &images);
    println!(
        "\n{} command(s) executed, {} ignored as invalid input, {} rejected.",
        summary.executed, summary.advisories, summary.rejected
    );

    print_plans(&store, format)?;

    if let Some(path) = workflow::export_plans(&store, export_path, config)
        .context("Failed to export the plan table")?
    {
        println!("\nPlan table written to {:?}", path);
    }
    Ok(())
}

fn print_plans(store: &PlanStore, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!();
            print!("{}", table::render_plans(store.list())?);
        }
        OutputFormat::Json => println!("{}", export::plans_to_json(store.list())?),
    }
    Ok(())
}
