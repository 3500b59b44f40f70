//! HTTP transport for the discovery facade.
//!
//! Routes:
//! - `POST /rpc/discover-assets`: body `{"aoi_geojson": "..."}`, replies with
//!   an [`AssetCollection`](infrascan_core::AssetCollection) or an
//!   [`ErrorBody`].
//! - `GET /health`: replies with [`HealthStatus::serving`].

use std::io;
use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::discovery::{AssetDiscovery, DiscoveryError, ErrorCode};
use crate::rpc::{DISCOVER_ASSETS_PATH, DiscoverAssetsRequest, ErrorBody, HEALTH_PATH, HealthStatus};

/// Errors raised while running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// I/O error.
        #[source]
        source: io::Error,
    },
    /// The server stopped with an I/O error.
    #[error("server error: {source}")]
    Serve {
        /// I/O error.
        #[source]
        source: io::Error,
    },
}

#[derive(Clone)]
struct AppState {
    discovery: AssetDiscovery,
    shutdown: CancellationToken,
}

/// Build the router serving `discovery`.
///
/// In-flight requests are cancelled when `shutdown` fires.
#[must_use]
pub fn router(discovery: AssetDiscovery, shutdown: CancellationToken) -> Router {
    Router::new()
        .route(DISCOVER_ASSETS_PATH, post(discover_assets))
        .route(HEALTH_PATH, get(health))
        .layer(middleware::from_fn(log_requests))
        .with_state(AppState {
            discovery,
            shutdown,
        })
}

/// Bind `addr` and serve until `shutdown` fires.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] when the address is unavailable and
/// [`ServerError::Serve`] when the accept loop fails.
pub async fn serve(
    addr: SocketAddr,
    discovery: AssetDiscovery,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_listener(listener, discovery, shutdown).await
}

/// Serve on an already bound listener until `shutdown` fires.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] when the accept loop fails.
pub async fn serve_listener(
    listener: TcpListener,
    discovery: AssetDiscovery,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    if let Ok(local) = listener.local_addr() {
        info!("Discovery service listening on {local}");
    }
    let app = router(discovery, shutdown.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|source| ServerError::Serve { source })?;
    info!("Discovery service stopped");
    Ok(())
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::serving())
}

async fn discover_assets(
    State(state): State<AppState>,
    payload: Result<Json<DiscoverAssetsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected discovery request body: {rejection}");
            return rpc_error(ErrorCode::InvalidArgument, "invalid request body");
        }
    };

    let cancel = state.shutdown.child_token();
    match state
        .discovery
        .discover_assets(&request.aoi_geojson, &cancel)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome.collection)).into_response(),
        Err(err) => discovery_failure(&err),
    }
}

fn discovery_failure(error: &DiscoveryError) -> Response {
    let body = ErrorBody::from(error);
    (status_for(body.code), Json(body)).into_response()
}

fn rpc_error(code: ErrorCode, message: &str) -> Response {
    (status_for(code), Json(ErrorBody::new(code, message))).into_response()
}

const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        "{method} {path} -> {} in {:?}",
        response.status().as_u16(),
        started.elapsed()
    );
    response
}
