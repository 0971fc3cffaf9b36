//! CLI command handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use tokio::sync::mpsc;

use super::output::ZombiePrinter;
use flux_zombies::collector::{
    Discovery, ExclusionFilter, TracingSink, cancellation, default_filters,
};
use flux_zombies::config::{Config, ConfigLoader, paths};
use flux_zombies::pool::ResourcePools;

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Show the merged configuration as YAML
    Show,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
}

/// Handle configuration subcommands
pub fn handle_config_command(cmd: ConfigSubcommand, explicit: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigSubcommand::Show => {
            let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;
            let yaml =
                serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
        ConfigSubcommand::Path => {
            println!("{}", paths::root_config_path().display());
        }
        ConfigSubcommand::Validate => {
            ConfigLoader::load(explicit).context("Configuration validation failed")?;
            println!("Configuration is valid");
        }
    }

    Ok(())
}

/// Inputs of a scan
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Manifest files holding the cluster snapshot
    pub files: Vec<PathBuf>,
    /// Name of the scanned cluster, matched against `excludeClusters` and cluster-bound rules
    pub cluster: Option<String>,
}

/// Load the snapshot, report zombies on stdout and return how many were found
pub async fn run_scan(options: &ScanOptions, config: &Config) -> Result<usize> {
    if config.excludes_cluster(options.cluster.as_deref()) {
        tracing::info!(
            "Cluster {} is listed in excludeClusters, skipping scan",
            options.cluster.as_deref().unwrap_or_default()
        );
        return Ok(0);
    }

    let mut pools = ResourcePools::load(&options.files)?;
    if let Some(selector) = config.label_selector().context("Invalid label selector")? {
        pools.retain_candidates(&selector);
    }
    tracing::info!(
        "Scanning {} resources against {} helmreleases and {} kustomizations",
        pools.resources.len(),
        pools.helm_releases.len(),
        pools.kustomizations.len()
    );

    let mut filters = default_filters(&pools);
    if !config.exclude_resources.is_empty() {
        filters.push(Box::new(ExclusionFilter::new(
            config.exclude_resources.clone(),
            options.cluster.clone(),
        )));
    }
    let discovery = Discovery::new(Arc::new(TracingSink)).with_filters(filters);
    tracing::debug!("Filter chain: {:?}", discovery.filter_names());

    let (handle, token) = cancellation();
    let (tx, mut rx) = mpsc::channel(config.channel_capacity);

    let mut printer = ZombiePrinter::new(std::io::stdout(), config.output, config.no_stream);
    let printer = tokio::spawn(async move {
        while let Some(obj) = rx.recv().await {
            if let Err(e) = printer.print(&obj) {
                tracing::warn!("Failed to print zombie: {:#}", e);
            }
        }
        printer
    });

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping discovery");
            handle.cancel();
        }
    });

    let result = discovery.discover(&token, &pools.resources, &tx).await;
    drop(tx);
    interrupt.abort();

    let printer = printer.await.context("Zombie printer task failed")?;
    result.context("Discovery failed")?;

    // Buffered zombies are only written once the pass completed
    let count = printer.finish()?;
    tracing::info!("Found {} zombies", count);
    Ok(count)
}
