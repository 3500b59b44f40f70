//! Error types emitted by the infrascan CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::net::AddrParseError;
use std::sync::Arc;

use camino::Utf8PathBuf;
use infrascan_data::SourceBuildError;
use infrascan_service::{ClientError, DiscoveryError, ServerError};
use thiserror::Error;

/// Errors emitted by the infrascan CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name.
        field: &'static str,
        /// Environment variable name.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag name.
        field: &'static str,
        /// Path as given.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag name.
        field: &'static str,
        /// Path as given.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name.
        field: &'static str,
        /// Path as given.
        path: Utf8PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Reading the AOI file failed.
    #[error("failed to read AOI from {path:?}: {source}")]
    ReadAoi {
        /// AOI path.
        path: Utf8PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The listen address did not parse.
    #[error("invalid listen address {value:?}: {source}")]
    InvalidListenAddress {
        /// Address as configured.
        value: String,
        /// Parser error.
        #[source]
        source: AddrParseError,
    },
    /// Constructing the Overpass source failed.
    #[error("failed to build Overpass source: {0}")]
    BuildSource(#[from] SourceBuildError),
    /// Starting the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Local discovery failed.
    #[error("asset discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
    /// Remote discovery failed.
    #[error("remote asset discovery failed: {0}")]
    Remote(#[from] ClientError),
    /// The server stopped with an error.
    #[error(transparent)]
    Serve(#[from] ServerError),
    /// Serialising the asset collection failed.
    #[error("failed to serialise assets: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing the output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
