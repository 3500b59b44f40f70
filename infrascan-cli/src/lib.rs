//! Command-line interface for infrastructure asset discovery.
#![forbid(unsafe_code)]

use std::future::Future;
use std::time::Duration;

use clap::{Parser, Subcommand};
use infrascan_data::{
    DEFAULT_OVERPASS_URL, HttpOverpassSource, OverpassSourceConfig, RetryPolicy,
};
use infrascan_service::AssetDiscovery;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

mod discover;
mod error;
mod fs;
mod serve;

pub use error::CliError;

use discover::DiscoverArgs;
use serve::ServeArgs;

pub(crate) const ARG_AOI: &str = "aoi";
pub(crate) const ARG_OVERPASS_URL: &str = "overpass-url";
pub(crate) const ARG_HTTP_TIMEOUT_SECS: &str = "http-timeout-secs";
pub(crate) const ARG_MAX_RETRIES: &str = "max-retries";
pub(crate) const ARG_RETRY_DELAY_MS: &str = "retry-delay-ms";
pub(crate) const ARG_REMOTE: &str = "remote";
pub(crate) const ARG_LISTEN: &str = "listen";
pub(crate) const ENV_AOI: &str = "INFRASCAN_CMDS_DISCOVER_AOI_PATH";

pub(crate) const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 3;
pub(crate) const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
pub(crate) const DEFAULT_LISTEN: &str = "0.0.0.0:50052";

/// Run the CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Discover(args) => discover::run_discover(args),
        Command::Serve(args) => serve::run_serve(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "infrascan",
    about = "Discover infrastructure assets inside an area of interest",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover assets inside a GeoJSON polygon and print them as JSON.
    Discover(DiscoverArgs),
    /// Serve the discovery RPC over HTTP.
    Serve(ServeArgs),
}

/// Resolved upstream settings shared by `discover` and `serve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpstreamConfig {
    /// Overpass interpreter endpoint.
    pub(crate) overpass_url: String,
    /// Per-request timeout.
    pub(crate) http_timeout: Duration,
    /// Fetch retry policy.
    pub(crate) retry: RetryPolicy,
}

impl UpstreamConfig {
    pub(crate) fn from_parts(
        overpass_url: Option<String>,
        http_timeout_secs: Option<u64>,
        max_retries: Option<u32>,
        retry_delay_ms: Option<u64>,
    ) -> Self {
        let retry = RetryPolicy::default()
            .with_max_retries(max_retries.unwrap_or(DEFAULT_MAX_RETRIES))
            .with_retry_delay(Duration::from_millis(
                retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS),
            ));
        Self {
            overpass_url: overpass_url.unwrap_or_else(|| DEFAULT_OVERPASS_URL.to_owned()),
            http_timeout: Duration::from_secs(
                http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            retry,
        }
    }

    /// Build a discovery facade backed by the configured Overpass endpoint.
    pub(crate) fn build_discovery(&self) -> Result<AssetDiscovery, CliError> {
        let source = HttpOverpassSource::with_config(
            OverpassSourceConfig::new(self.overpass_url.clone()).with_timeout(self.http_timeout),
        )?;
        Ok(AssetDiscovery::new(source, self.retry))
    }
}

/// Drive `task` to completion on a fresh multi-threaded runtime.
///
/// The token handed to `task` is cancelled on Ctrl-C.
pub(crate) fn block_on_cancellable<F, Fut, T>(task: F) -> Result<T, CliError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, CliError>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(async {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let watcher = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, shutting down");
                    trigger.cancel();
                }
                Err(err) => warn!("Failed to listen for Ctrl-C: {err}"),
            }
        });
        let outcome = task(cancel).await;
        watcher.abort();
        outcome
    })
}

#[cfg(test)]
mod tests;
