//! Command-line entry point for registry-audit

use clap::{Parser, Subcommand};
use registry_audit::{Config, RegistryAuditor, Result, report};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "registry-audit", version, about = "Crawl a crate registry and record per-crate policy-compliance verdicts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl the registry and stream verdict rows to a dataset file
    Crawl {
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the output dataset path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Aggregate previously produced dataset files into a failure report
    Report {
        /// Dataset CSV file to include (repeatable)
        #[arg(long = "csv", required = true)]
        csv: Vec<PathBuf>,

        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Crawl { config, output } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(output) = output {
                config.pipeline.dataset_path = output;
            }
            let dataset_path = config.pipeline.dataset_path.clone();

            let auditor = RegistryAuditor::new(config)?;
            let summary = auditor.run().await?;

            println!(
                "crawl complete: {} crates discovered, {} rows written to {} ({} skipped, {} yanked)",
                summary.discovered,
                summary.rows_written,
                dataset_path.display(),
                summary.skipped,
                summary.yanked,
            );
            Ok(())
        }
        Command::Report { csv, config } => {
            let config = load_config(config.as_deref())?;
            let built = report::build_report(&csv, &config.report)?;
            print!("{built}");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}
