//! Discover command implementation.

use std::io::Write;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use infrascan_core::AssetCollection;
use infrascan_service::{AssetDiscovery, RemoteDiscoveryClient};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    ARG_AOI, ARG_HTTP_TIMEOUT_SECS, ARG_MAX_RETRIES, ARG_OVERPASS_URL, ARG_REMOTE,
    ARG_RETRY_DELAY_MS, CliError, ENV_AOI, UpstreamConfig, block_on_cancellable, fs,
};

/// CLI arguments for the `discover` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Discover buildings, roads, power, rail, hospitals and fire \
                 stations inside the GeoJSON polygon stored in the given \
                 file. Runs locally against Overpass, or against a running \
                 `infrascan serve` instance when --remote is set.",
    about = "Discover infrastructure assets inside an AOI"
)]
#[ortho_config(prefix = "INFRASCAN")]
pub(crate) struct DiscoverArgs {
    /// Path to a file containing a GeoJSON polygon geometry.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) aoi_path: Option<Utf8PathBuf>,
    /// Overpass interpreter endpoint.
    #[arg(long = ARG_OVERPASS_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) overpass_url: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long = ARG_HTTP_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) http_timeout_secs: Option<u64>,
    /// Retries after the first failed fetch.
    #[arg(long = ARG_MAX_RETRIES, value_name = "count")]
    #[serde(default)]
    pub(crate) max_retries: Option<u32>,
    /// Delay between fetch attempts in milliseconds.
    #[arg(long = ARG_RETRY_DELAY_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) retry_delay_ms: Option<u64>,
    /// Base URL of a running discovery server, e.g. "http://localhost:50052".
    #[arg(long = ARG_REMOTE, value_name = "url")]
    #[serde(default)]
    pub(crate) remote: Option<String>,
}

impl DiscoverArgs {
    pub(crate) fn into_config(self) -> Result<DiscoverConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DiscoverConfig::try_from(merged)
    }
}

/// Resolved `discover` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DiscoverConfig {
    /// AOI file.
    pub(crate) aoi_path: Utf8PathBuf,
    /// Overpass settings for local discovery.
    pub(crate) upstream: UpstreamConfig,
    /// Remote server, when discovery is delegated.
    pub(crate) remote: Option<String>,
}

impl DiscoverConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.aoi_path, ARG_AOI)
    }
}

impl TryFrom<DiscoverArgs> for DiscoverConfig {
    type Error = CliError;

    fn try_from(args: DiscoverArgs) -> Result<Self, Self::Error> {
        let aoi_path = args.aoi_path.ok_or(CliError::MissingArgument {
            field: ARG_AOI,
            env: ENV_AOI,
        })?;
        let upstream = UpstreamConfig::from_parts(
            args.overpass_url,
            args.http_timeout_secs,
            args.max_retries,
            args.retry_delay_ms,
        );
        let remote = args.remote.filter(|remote| !remote.trim().is_empty());
        Ok(Self {
            aoi_path,
            upstream,
            remote,
        })
    }
}

fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Where discovery runs.
pub(crate) enum DiscoveryBackend {
    /// In-process pipeline.
    Local(AssetDiscovery),
    /// A running discovery server.
    Remote(RemoteDiscoveryClient),
}

impl DiscoveryBackend {
    pub(crate) async fn discover(
        &self,
        aoi: &str,
        cancel: &CancellationToken,
    ) -> Result<AssetCollection, CliError> {
        match self {
            Self::Local(discovery) => Ok(discovery.discover_assets(aoi, cancel).await?.collection),
            Self::Remote(client) => Ok(client.discover_assets_until(aoi, cancel).await?),
        }
    }
}

/// Builds the backend for the current discover invocation.
pub(crate) trait DiscoveryBackendBuilder {
    fn build(&self, config: &DiscoverConfig) -> Result<DiscoveryBackend, CliError>;
}

pub(crate) struct DefaultDiscoveryBackendBuilder;

impl DiscoveryBackendBuilder for DefaultDiscoveryBackendBuilder {
    fn build(&self, config: &DiscoverConfig) -> Result<DiscoveryBackend, CliError> {
        match &config.remote {
            Some(remote) => Ok(DiscoveryBackend::Remote(RemoteDiscoveryClient::new(
                remote.clone(),
                remote_timeout(&config.upstream),
            ))),
            None => Ok(DiscoveryBackend::Local(config.upstream.build_discovery()?)),
        }
    }
}

/// The remote server may itself spend every retry against Overpass.
fn remote_timeout(upstream: &UpstreamConfig) -> Duration {
    let attempts = upstream.retry.attempts();
    upstream
        .http_timeout
        .saturating_add(upstream.retry.retry_delay)
        .saturating_mul(attempts)
}

pub(crate) fn run_discover(args: DiscoverArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_discover_with(args, &DefaultDiscoveryBackendBuilder, &mut stdout)
}

pub(crate) fn run_discover_with(
    args: DiscoverArgs,
    builder: &dyn DiscoveryBackendBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let collection = execute_discover(&config, builder)?;
    write_collection(writer, &collection)
}

fn execute_discover(
    config: &DiscoverConfig,
    builder: &dyn DiscoveryBackendBuilder,
) -> Result<AssetCollection, CliError> {
    let aoi = fs::read_to_string(&config.aoi_path).map_err(|source| CliError::ReadAoi {
        path: config.aoi_path.clone(),
        source,
    })?;
    let backend = builder.build(config)?;
    block_on_cancellable(|cancel| async move { backend.discover(&aoi, &cancel).await })
}

fn write_collection(writer: &mut dyn Write, collection: &AssetCollection) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(collection).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<DiscoverConfig, CliError> {
    let merged = DiscoverArgs::merge_from_layers(layers).map_err(CliError::from)?;
    DiscoverConfig::try_from(merged)
}
