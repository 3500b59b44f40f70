//! Client for a remote discovery server.

use std::time::Duration;

use infrascan_core::AssetCollection;
use log::{debug, info};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::connection::{ConnectError, Connection, ConnectionState, HttpConnector};
use crate::discovery::ErrorCode;
use crate::rpc::{DISCOVER_ASSETS_PATH, DiscoverAssetsRequest, ErrorBody};

/// Errors returned by [`RemoteDiscoveryClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// No channel to the server could be established.
    #[error("failed to connect to discovery service: {source}")]
    Connect {
        /// Dial failure.
        #[from]
        source: ConnectError,
    },
    /// The request failed in transit; the channel is discarded.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The server rejected or failed the request.
    #[error("{code}: {message}")]
    Rpc {
        /// Status code reported by the server.
        code: ErrorCode,
        /// Server-provided description.
        message: String,
    },
    /// The server reply could not be decoded.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Request URL.
        url: String,
        /// Decoder error description.
        message: String,
    },
    /// The caller cancelled the request before the server answered.
    #[error("request cancelled")]
    Cancelled,
}

/// Calls `DiscoverAssets` on a remote server through a managed
/// [`Connection`].
#[derive(Debug)]
pub struct RemoteDiscoveryClient {
    connection: Connection<HttpConnector>,
}

impl RemoteDiscoveryClient {
    /// Client for the server at `address`; nothing is dialled until the first
    /// request.
    #[must_use]
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            connection: Connection::new(HttpConnector::new(address, timeout)),
        }
    }

    /// Lifecycle state of the underlying connection.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Discover assets inside `aoi`, giving up as soon as `cancel` fires.
    ///
    /// Cancellation covers both the dial and the request; an abandoned dial
    /// leaves the connection `Unconnected`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cancelled`] when `cancel` fires first, and the
    /// errors of [`Self::discover_assets`] otherwise.
    pub async fn discover_assets_until(
        &self,
        aoi: &str,
        cancel: &CancellationToken,
    ) -> Result<AssetCollection, ClientError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Remote discovery cancelled");
                Err(ClientError::Cancelled)
            }
            outcome = self.discover_assets(aoi) => outcome,
        }
    }

    /// Discover assets inside `aoi` on the remote server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rpc`] carrying the server's code and message
    /// when the server reports a failure, and the other variants when the
    /// server cannot be reached or answers with something undecodable.
    pub async fn discover_assets(&self, aoi: &str) -> Result<AssetCollection, ClientError> {
        let channel = self.connection.acquire().await?;
        let url = channel
            .endpoint(DISCOVER_ASSETS_PATH)
            .map_err(|err| ClientError::Transport {
                url: DISCOVER_ASSETS_PATH.to_owned(),
                message: err.to_string(),
            })?;
        let request = DiscoverAssetsRequest {
            aoi_geojson: aoi.to_owned(),
        };

        let response = match channel.client().post(url.clone()).json(&request).send().await {
            Ok(response) => response,
            Err(err) => {
                self.connection.reset().await;
                return Err(ClientError::Transport {
                    url: url.to_string(),
                    message: err.to_string(),
                });
            }
        };

        let status = response.status();
        debug!("{url} answered {status}");
        if status.is_success() {
            return response
                .json::<AssetCollection>()
                .await
                .map_err(|err| ClientError::Decode {
                    url: url.to_string(),
                    message: err.to_string(),
                });
        }

        let body: ErrorBody = response.json().await.map_err(|err| ClientError::Decode {
            url: url.to_string(),
            message: format!("status {status}: {err}"),
        })?;
        Err(ClientError::Rpc {
            code: body.code,
            message: body.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Instant;
    use tokio::net::TcpListener;

    #[rstest]
    #[tokio::test]
    async fn cancelled_token_abandons_a_silent_server() {
        // Accepted by the kernel backlog but never answered.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = format!("http://{}", listener.local_addr().expect("local addr"));
        let client = RemoteDiscoveryClient::new(address, Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = Instant::now();
        let err = client
            .discover_assets_until("{}", &cancel)
            .await
            .expect_err("cancelled request fails");
        assert_eq!(err, ClientError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(client.connection_state(), ConnectionState::Unconnected);
    }

    #[rstest]
    #[tokio::test]
    async fn cancelling_mid_dial_returns_promptly() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = format!("http://{}", listener.local_addr().expect("local addr"));
        let client = RemoteDiscoveryClient::new(address, Duration::from_secs(5));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = client
            .discover_assets_until("{}", &cancel)
            .await
            .expect_err("cancelled request fails");
        assert_eq!(err, ClientError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(client.connection_state(), ConnectionState::Unconnected);
        drop(listener);
    }
}
