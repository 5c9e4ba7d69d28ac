//! Eksi-Export main entry point
//!
//! This is the command-line interface for the Eksi-Export thread scraper.

use anyhow::Context;
use clap::Parser;
use eksi_export::config::{collect_threads, load_config_with_hash, validate, Config};
use eksi_export::diagnostics::{SharedDiagnostics, TracingDiagnostics};
use eksi_export::output::print_report;
use eksi_export::scraper::scrape_batch;
use eksi_export::OutputFormat;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Eksi-Export: scrape eksisozluk threads into CSV or JSON
///
/// Every page of each thread is fetched concurrently, with retries on
/// transient network failures, and written to `{thread}.{format}`.
#[derive(Parser, Debug)]
#[command(name = "eksi-export")]
#[command(version = "1.0.0")]
#[command(about = "Scrape threads from eksisozluk", long_about = None)]
struct Cli {
    /// Threads to scrape, the part of the URL after the /, before a possible ?
    #[arg(short, long = "threads", value_name = "THREAD", num_args = 1..)]
    threads: Vec<String>,

    /// File to read threads from, one thread per line
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory to write exports into
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Base URL thread identifiers are appended to
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Maximum concurrent page fetches per thread
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Maximum threads scraped at once
    #[arg(long, value_name = "N")]
    max_threads: Option<u32>,

    /// Append log records to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let Some((threads, config)) = prepare_run(&cli)? else {
        println!("No threads provided, exiting.");
        return Ok(());
    };

    tracing::info!(
        "Scraping {} thread(s) from {} as {}",
        threads.len(),
        config.scraper.base_url,
        config.output.format
    );

    let diagnostics: SharedDiagnostics = Arc::new(TracingDiagnostics);
    let report = scrape_batch(&config, &threads, diagnostics)
        .await
        .context("Failed to start scraping")?;

    if !cli.quiet {
        print_report(&report);
    }

    let failures = report.failures().count();
    if failures > 0 {
        tracing::warn!("{} thread(s) could not be written", failures);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("eksi_export=info,warn"),
            1 => EnvFilter::new("eksi_export=debug,info"),
            2 => EnvFilter::new("eksi_export=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

/// Collects the thread list, then the configuration
///
/// Returns `None` for an empty thread list without touching the config file.
fn prepare_run(cli: &Cli) -> anyhow::Result<Option<(Vec<String>, Config)>> {
    let threads = collect_threads(&cli.threads, cli.file.as_deref())
        .context("Failed to collect thread list")?;

    if threads.is_empty() {
        return Ok(None);
    }

    let config = load_effective_config(cli)?;
    Ok(Some((threads, config)))
}

/// Loads the config file if given, then applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.scraper.base_url = base_url.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.scraper.max_concurrent_pages = max_pages;
    }
    if let Some(max_threads) = cli.max_threads {
        config.scraper.max_concurrent_threads = max_threads;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}
