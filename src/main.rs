//! rwget main entry point
//!
//! This is the command-line interface for the rwget downloader and site mirror.

use anyhow::{bail, Context};
use clap::Parser;
use reqwest::Client;
use rwget::config::{load_config, validate, Config};
use rwget::crawler::{build_http_client, mirror};
use rwget::download::{download_batch, download_file, read_url_list, spawn_download, BatchOptions};
use rwget::output::{print_batch_summary, print_mirror_report};
use rwget::url::parse_target_url;
use rwget::{parse_rate_limit, DownloadRequest, ProgressMode};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Log file used by background downloads
const BACKGROUND_LOG: &str = "wget-log";

/// rwget: a wget-style downloader
///
/// Downloads a single file, a list of files concurrently, or mirrors a
/// whole site for offline browsing by following same-host links.
#[derive(Parser, Debug)]
#[command(name = "rwget")]
#[command(version)]
#[command(about = "A wget-style downloader and site mirror", long_about = None)]
struct Cli {
    /// URL to download or mirror
    #[arg(value_name = "URL", required_unless_present = "input_file")]
    url: Option<String>,

    /// Save the download under this file name
    #[arg(short = 'O', value_name = "FILE")]
    output_name: Option<String>,

    /// Directory to save files into
    #[arg(short = 'P', value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Throughput ceiling, e.g. 200k or 2M
    #[arg(long, value_name = "RATE")]
    rate_limit: Option<String>,

    /// Download in the background and log to wget-log
    #[arg(short = 'B', long, conflicts_with_all = ["mirror", "input_file"])]
    background: bool,

    /// Read URLs to download from a file, one per line
    #[arg(short = 'i', value_name = "FILE", conflicts_with = "mirror")]
    input_file: Option<PathBuf>,

    /// Mirror the site starting at URL
    #[arg(long)]
    mirror: bool,

    /// File extensions to skip while mirroring
    #[arg(short = 'R', long = "reject", value_name = "EXT", value_delimiter = ',')]
    reject: Vec<String>,

    /// Path substrings to skip while mirroring
    #[arg(short = 'X', long = "exclude", value_name = "PATH", value_delimiter = ',')]
    exclude: Vec<String>,

    /// Maximum mirror depth
    #[arg(short = 'l', long = "level", value_name = "N")]
    max_depth: Option<u32>,

    /// Maximum number of concurrent fetches
    #[arg(long, value_name = "N")]
    max_concurrent: Option<usize>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.background)?;

    let config = build_config(&cli)?;
    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    if cli.mirror {
        handle_mirror(&cli, &config, cancel).await
    } else if let Some(input) = &cli.input_file {
        handle_batch(input, &config, cancel).await
    } else if cli.background {
        handle_background(&cli, &config, cancel).await
    } else {
        handle_single(&cli, &config, cancel).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Background runs write to `wget-log` in the current directory instead of
/// the terminal.
fn setup_logging(verbose: u8, quiet: bool, background: bool) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rwget=info,warn"),
            1 => EnvFilter::new("rwget=debug,info"),
            2 => EnvFilter::new("rwget=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    if background {
        let log = std::fs::File::create(BACKGROUND_LOG)
            .with_context(|| format!("Failed to create log file '{}'", BACKGROUND_LOG))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(log))
            .init();
    } else {
        builder.init();
    }

    Ok(())
}

/// Loads the optional configuration file and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from '{}'", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(directory) = &cli.directory {
        config.transfer.directory = Some(directory.clone());
    }
    if let Some(rate_limit) = &cli.rate_limit {
        config.transfer.rate_limit = Some(rate_limit.clone());
    }
    if let Some(max_concurrent) = cli.max_concurrent {
        config.transfer.max_concurrent = max_concurrent;
    }
    if let Some(max_depth) = cli.max_depth {
        config.mirror.max_depth = max_depth;
    }
    if !cli.reject.is_empty() {
        config.mirror.reject = cli.reject.clone();
    }
    if !cli.exclude.is_empty() {
        config.mirror.exclude = cli.exclude.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Cancels the token on Ctrl-C, or SIGTERM on Unix
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown().await;
        tracing::warn!("Interrupt received, stopping after in-flight transfers unwind...");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::debug!("SIGTERM handler unavailable: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}

fn http_client(config: &Config) -> anyhow::Result<Client> {
    build_http_client(&config.client).context("Failed to build HTTP client")
}

fn rate_limit(config: &Config) -> anyhow::Result<u64> {
    let spec = config.transfer.rate_limit.as_deref().unwrap_or("");
    Ok(parse_rate_limit(spec)?)
}

fn single_request(cli: &Cli, config: &Config) -> anyhow::Result<DownloadRequest> {
    let Some(raw) = cli.url.as_deref() else {
        bail!("Missing URL argument");
    };

    let mut request = DownloadRequest::new(parse_target_url(raw)?).with_rate_limit(rate_limit(config)?);
    if let Some(name) = &cli.output_name {
        request = request.with_output_name(name.clone());
    }
    if let Some(directory) = &config.transfer.directory {
        request = request.with_directory(directory.clone());
    }
    Ok(request)
}

/// Handles a plain single-file download
async fn handle_single(cli: &Cli, config: &Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let request = single_request(cli, config)?;
    let client = http_client(config)?;

    download_file(&client, &request, ProgressMode::Live, &cancel).await?;
    Ok(())
}

/// Handles `-B`: the download runs on its own task, logging to `wget-log`
async fn handle_background(cli: &Cli, config: &Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let request = single_request(cli, config)?;
    let client = http_client(config)?;

    println!("Output will be written to '{}'.", BACKGROUND_LOG);
    tracing::info!("Background download of {} started", request.url);

    let handle = spawn_download(client, request, ProgressMode::Terse, cancel);
    match handle.await.context("Background download task failed")? {
        Ok(report) => {
            tracing::info!(
                "Downloaded {} ({} bytes) to {}",
                report.url,
                report.bytes,
                report.path.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Background download failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles `-i`: concurrent download of a URL list
async fn handle_batch(input: &Path, config: &Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let urls = read_url_list(input).await?;
    let client = http_client(config)?;
    let options = BatchOptions {
        directory: config.transfer.directory.clone(),
        max_concurrent: config.transfer.max_concurrent,
        rate_limit: rate_limit(config)?,
    };

    let summary = download_batch(&client, &urls, &options, &cancel).await;
    print_batch_summary(&summary);

    if summary.interrupted {
        bail!("interrupted");
    }
    Ok(())
}

/// Handles `--mirror`: recursive site mirror
async fn handle_mirror(cli: &Cli, config: &Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let Some(url) = cli.url.as_deref() else {
        bail!("Missing URL argument");
    };

    tracing::info!(
        "Mirroring {} (max depth {}, max concurrent {})",
        url,
        config.mirror.max_depth,
        config.transfer.max_concurrent
    );

    let report = mirror(config, url, cancel).await?;
    print_mirror_report(&report);

    if report.interrupted {
        bail!("interrupted");
    }
    Ok(())
}
