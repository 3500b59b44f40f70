//! Managed connection to a remote discovery service.
//!
//! A [`Connection`] starts `Unconnected` and is only dialled on the first
//! [`Connection::acquire`]. Concurrent callers queue behind a single dial, so
//! at most one connect is in flight. A failed dial leaves the connection
//! `Failed`; the next `acquire` dials again. Dropping an `acquire` future
//! mid-dial returns the connection to `Unconnected`. [`Connection::reset`]
//! discards a ready channel after a transport error.

use std::fmt;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::rpc::{HEALTH_PATH, HealthStatus};

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never dialled, or reset.
    Unconnected,
    /// A dial is in flight.
    Connecting,
    /// A channel is cached and handed out by `acquire`.
    Ready,
    /// The last dial failed.
    Failed,
}

/// Errors raised while establishing a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The service address did not parse as a URL.
    #[error("invalid service address {address:?}: {message}")]
    InvalidAddress {
        /// Address as configured.
        address: String,
        /// Parser error description.
        message: String,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {message}")]
    Client {
        /// Builder error description.
        message: String,
    },
    /// The service could not be reached.
    #[error("service at {url} is unreachable: {message}")]
    Unreachable {
        /// Probed URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The service answered but is not serving.
    #[error("service at {url} is not serving (status {status})")]
    NotServing {
        /// Probed URL.
        url: String,
        /// Reported status, or the HTTP status code when no body was usable.
        status: String,
    },
}

/// Dials channels for a [`Connection`].
#[async_trait]
pub trait Connector: Send + Sync {
    /// Handle returned once connected.
    type Channel: Clone + Send + Sync;

    /// Establish a new channel.
    async fn connect(&self) -> Result<Self::Channel, ConnectError>;
}

/// Lazily established, shareable channel with an explicit lifecycle.
pub struct Connection<C: Connector> {
    connector: C,
    channel: Mutex<Option<C::Channel>>,
    state: StdMutex<ConnectionState>,
}

impl<C: Connector> fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Connection<C> {
    /// Unconnected connection dialled through `connector`.
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            channel: Mutex::new(None),
            state: StdMutex::new(ConnectionState::Unconnected),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
            .lock()
            .map_or(ConnectionState::Failed, |state| *state)
    }

    fn set_state(&self, next: ConnectionState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    /// The connector used for dialling.
    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Return the cached channel, dialling first if there is none.
    ///
    /// # Errors
    ///
    /// Propagates the [`ConnectError`] from a failed dial; the connection is
    /// left `Failed` and the next call dials again.
    pub async fn acquire(&self) -> Result<C::Channel, ConnectError> {
        let mut slot = self.channel.lock().await;
        if let Some(channel) = slot.as_ref() {
            return Ok(channel.clone());
        }

        let dial = DialGuard::start(self);
        match self.connector.connect().await {
            Ok(channel) => {
                *slot = Some(channel.clone());
                dial.settle(ConnectionState::Ready);
                info!("Connection established");
                Ok(channel)
            }
            Err(err) => {
                dial.settle(ConnectionState::Failed);
                warn!("Connection attempt failed: {err}");
                Err(err)
            }
        }
    }

    /// Drop any cached channel so the next `acquire` dials afresh.
    pub async fn reset(&self) {
        let mut slot = self.channel.lock().await;
        *slot = None;
        self.set_state(ConnectionState::Unconnected);
    }
}

/// Marks a dial in flight; an abandoned dial reverts to `Unconnected`.
struct DialGuard<'a, C: Connector> {
    connection: &'a Connection<C>,
    settled: bool,
}

impl<'a, C: Connector> DialGuard<'a, C> {
    fn start(connection: &'a Connection<C>) -> Self {
        connection.set_state(ConnectionState::Connecting);
        Self {
            connection,
            settled: false,
        }
    }

    fn settle(mut self, outcome: ConnectionState) {
        self.connection.set_state(outcome);
        self.settled = true;
    }
}

impl<C: Connector> Drop for DialGuard<'_, C> {
    fn drop(&mut self) {
        if !self.settled {
            self.connection.set_state(ConnectionState::Unconnected);
        }
    }
}

/// Channel to a discovery server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChannel {
    client: Client,
    base: Url,
}

impl HttpChannel {
    /// Shared HTTP client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Resolve `path` against the server base URL.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when `path` cannot be joined.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }
}

/// [`Connector`] that dials an HTTP discovery server and checks its health
/// probe before handing out the channel.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    address: String,
    timeout: Duration,
}

impl HttpConnector {
    /// Connector for the server at `address`, e.g. `http://localhost:50052`.
    #[must_use]
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    /// Configured server address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Connector for HttpConnector {
    type Channel = HttpChannel;

    async fn connect(&self) -> Result<HttpChannel, ConnectError> {
        let base = Url::parse(&self.address).map_err(|err| ConnectError::InvalidAddress {
            address: self.address.clone(),
            message: err.to_string(),
        })?;
        let client = Client::builder()
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .build()
            .map_err(|err| ConnectError::Client {
                message: err.to_string(),
            })?;
        let probe = base
            .join(HEALTH_PATH)
            .map_err(|err| ConnectError::InvalidAddress {
                address: self.address.clone(),
                message: err.to_string(),
            })?;

        let response = client
            .get(probe.clone())
            .send()
            .await
            .map_err(|err| ConnectError::Unreachable {
                url: probe.to_string(),
                message: err.to_string(),
            })?;
        let status = response.status();
        let health: Option<HealthStatus> = response.json().await.ok();
        match health {
            Some(health) if status.is_success() && health.is_serving() => {
                Ok(HttpChannel { client, base })
            }
            Some(health) => Err(ConnectError::NotServing {
                url: probe.to_string(),
                status: health.status,
            }),
            None => Err(ConnectError::NotServing {
                url: probe.to_string(),
                status: status.as_u16().to_string(),
            }),
        }
    }
}
