//! Serve command implementation.

use std::net::SocketAddr;

use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_HTTP_TIMEOUT_SECS, ARG_LISTEN, ARG_MAX_RETRIES, ARG_OVERPASS_URL, ARG_RETRY_DELAY_MS,
    CliError, DEFAULT_LISTEN, UpstreamConfig, block_on_cancellable,
};

/// CLI arguments for the `serve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Expose asset discovery over HTTP. The server answers \
                 POST /rpc/discover-assets and GET /health, and shuts down \
                 gracefully on Ctrl-C.",
    about = "Serve the discovery RPC over HTTP"
)]
#[ortho_config(prefix = "INFRASCAN")]
pub(crate) struct ServeArgs {
    /// Socket address to bind, e.g. "127.0.0.1:50052".
    #[arg(long = ARG_LISTEN, value_name = "addr")]
    #[serde(default)]
    pub(crate) listen: Option<String>,
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
}

impl ServeArgs {
    pub(crate) fn into_config(self) -> Result<ServeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ServeConfig::try_from(merged)
    }
}

/// Resolved `serve` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServeConfig {
    pub(crate) listen: SocketAddr,
    pub(crate) upstream: UpstreamConfig,
}

impl TryFrom<ServeArgs> for ServeConfig {
    type Error = CliError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        let value = args.listen.unwrap_or_else(|| DEFAULT_LISTEN.to_owned());
        let listen = value
            .parse::<SocketAddr>()
            .map_err(|source| CliError::InvalidListenAddress { value, source })?;
        let upstream = UpstreamConfig::from_parts(
            args.overpass_url,
            args.http_timeout_secs,
            args.max_retries,
            args.retry_delay_ms,
        );
        Ok(Self { listen, upstream })
    }
}

pub(crate) fn run_serve(args: ServeArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let discovery = config.upstream.build_discovery()?;
    info!(
        "Serving discovery on {} against {}",
        config.listen, config.upstream.overpass_url
    );
    block_on_cancellable(|shutdown| async move {
        infrascan_service::serve(config.listen, discovery, shutdown).await?;
        Ok(())
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ServeConfig, CliError> {
    let merged = ServeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ServeConfig::try_from(merged)
}
