//! Request facade and transport for infrastructure asset discovery.
//!
//! Responsibilities:
//! - Run the discovery pipeline for one area of interest
//!   ([`AssetDiscovery`]).
//! - Expose it over a JSON RPC endpoint ([`server`]).
//! - Call a remote instance through a managed connection ([`client`],
//!   [`connection`]).
//!
//! Boundaries:
//! - Classification and geometry live in `infrascan-core`; Overpass access
//!   lives in `infrascan-data`.

#![forbid(unsafe_code)]

pub mod client;
pub mod connection;
pub mod discovery;
pub mod rpc;
pub mod server;

pub use client::{ClientError, RemoteDiscoveryClient};
pub use connection::{ConnectError, Connection, ConnectionState, Connector, HttpConnector};
pub use discovery::{
    AssetDiscovery, DiscoveryDiagnostics, DiscoveryError, DiscoveryOutcome, ErrorCode,
};
pub use rpc::{DiscoverAssetsRequest, ErrorBody, HealthStatus};
pub use server::{ServerError, router, serve, serve_listener};
