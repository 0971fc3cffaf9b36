//! flux-zombies - Find Kubernetes resources no longer managed by Flux or Helm
//!
//! Reads a cluster snapshot from manifest files and prints every resource that
//! is neither owned, nor part of a live HelmRelease, nor listed in the
//! inventory of the Kustomization it is labeled for.

mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flux_zombies::config::{ConfigLoader, OutputFormat};

/// flux-zombies - Find Kubernetes resources no longer managed by Flux or Helm
#[derive(Parser, Debug)]
#[command(name = "flux-zombies", version)]
#[command(about = "Find Kubernetes resources no longer managed by Flux or Helm", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Configuration file, merged over the root configuration
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Name of the scanned cluster, matched against excludeClusters and cluster-bound exclusion rules
    #[arg(long)]
    cluster: Option<String>,

    /// Output format (name, yaml, json)
    #[arg(long, short = 'o')]
    output: Option<OutputFormat>,

    /// Exit with status 1 when zombies are found
    #[arg(long)]
    fail: bool,

    /// Only check resources matching this label selector (e.g. `app=web,tier!=db`)
    #[arg(long, short = 'l')]
    selector: Option<String>,

    /// Print zombies once discovery finished instead of as they are found
    #[arg(long)]
    no_stream: bool,

    /// Manifest files (YAML or JSON) holding the cluster snapshot
    files: Vec<PathBuf>,

    /// Configuration subcommand
    #[command(subcommand)]
    command: Option<Command>,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: cli::ConfigSubcommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(args.debug);

    if let Some(Command::Config { subcommand }) = args.command {
        return cli::handle_config_command(subcommand, args.config.as_deref());
    }

    if args.files.is_empty() {
        return Err(anyhow::anyhow!(
            "No manifest files given. Export a snapshot with `kubectl get <kinds> -A -o yaml` first"
        ));
    }

    let mut config =
        ConfigLoader::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(output) = args.output {
        config.output = output;
    }
    if args.fail {
        config.fail = true;
    }
    if args.no_stream {
        config.no_stream = true;
    }
    if let Some(selector) = args.selector {
        config.label_selector = Some(selector);
    }
    tracing::debug!(
        "Configuration loaded: fail={}, output={}, no_stream={}, selector={:?}, exclusions={}",
        config.fail,
        config.output,
        config.no_stream,
        config.label_selector,
        config.exclude_resources.len()
    );

    let options = cli::ScanOptions {
        files: args.files,
        cluster: args.cluster,
    };
    let zombies = cli::run_scan(&options, &config).await?;

    if config.fail && zombies > 0 {
        eprintln!("{} zombie resources found", zombies);
        std::process::exit(1);
    }

    Ok(())
}
