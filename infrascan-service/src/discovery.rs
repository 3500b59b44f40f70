//! The asset discovery facade.
//!
//! One call runs the whole pipeline for a single area of interest: validate
//! the payload, derive its bounds, query the element source under the retry
//! policy, then classify and encode every element. Requests share only the
//! immutable facade, so one instance can serve any number of concurrent
//! callers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use infrascan_core::{
    AoiError, AoiPayload, AssetCollection, AssetKind, AssetRecord, DropReason, RawElement,
    convert_element,
};
use infrascan_data::{ElementSource, FetchError, OverpassQuery, RetryPolicy, fetch_with_retry};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Status codes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The request payload was rejected.
    InvalidArgument,
    /// The pipeline failed after the request was accepted.
    Internal,
    /// The request was cancelled before completing.
    Cancelled,
}

impl ErrorCode {
    /// Wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Internal => "INTERNAL",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a discovery request failed.
///
/// `Display` output is safe to return to callers; transport details stay in
/// the source chain.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The AOI payload was empty, not JSON, or had no usable outer ring.
    #[error("{message}")]
    InvalidArgument {
        /// Caller-facing description.
        message: String,
        /// Underlying validation failure.
        #[source]
        source: AoiError,
    },
    /// The upstream source kept failing until the retry budget ran out.
    #[error("failed to fetch assets from OpenStreetMap")]
    UpstreamUnavailable {
        /// Terminal fetch failure.
        #[source]
        source: FetchError,
    },
    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

impl DiscoveryError {
    /// Caller-facing status code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::UpstreamUnavailable { .. } => ErrorCode::Internal,
            Self::Cancelled => ErrorCode::Cancelled,
        }
    }

    fn invalid(source: AoiError) -> Self {
        let message = match &source {
            AoiError::Empty => "aoi_geojson is required".to_owned(),
            AoiError::InvalidJson { .. } => "invalid GeoJSON format".to_owned(),
            other => format!("invalid area of interest: {other}"),
        };
        Self::InvalidArgument { message, source }
    }
}

impl From<FetchError> for DiscoveryError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Cancelled => Self::Cancelled,
            exhausted @ FetchError::Exhausted { .. } => Self::UpstreamUnavailable { source: exhausted },
        }
    }
}

/// Per-request counters describing what happened to each element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryDiagnostics {
    /// Elements returned by the source.
    pub elements_received: usize,
    /// Assets emitted, by kind.
    pub assets_by_kind: BTreeMap<AssetKind, usize>,
    /// Elements that produced no asset, by reason.
    pub dropped: BTreeMap<DropReason, usize>,
    /// Assets whose geometry could not be encoded.
    pub skipped_geometries: usize,
}

impl DiscoveryDiagnostics {
    /// Total elements dropped for any reason.
    #[must_use]
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }

    fn record_asset(&mut self, kind: AssetKind) {
        *self.assets_by_kind.entry(kind).or_default() += 1;
    }

    fn record_drop(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_default() += 1;
    }
}

/// `building=3, road=1`, in kind order.
struct KindSummary<'a>(&'a BTreeMap<AssetKind, usize>);

impl fmt::Display for KindSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        for (position, (kind, count)) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}={count}")?;
        }
        Ok(())
    }
}

/// Successful discovery result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    /// Assets in source order, plus their count.
    pub collection: AssetCollection,
    /// What happened to every received element.
    pub diagnostics: DiscoveryDiagnostics,
}

/// Runs discovery requests against a shared element source.
///
/// # Examples
///
/// ```no_run
/// use infrascan_data::{HttpOverpassSource, RetryPolicy};
/// use infrascan_service::AssetDiscovery;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let source = HttpOverpassSource::new("https://overpass-api.de/api/interpreter")?;
/// let discovery = AssetDiscovery::new(source, RetryPolicy::default());
/// let aoi = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;
/// let outcome = discovery.discover_assets(aoi, &CancellationToken::new()).await?;
/// println!("{} assets", outcome.collection.total_count);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AssetDiscovery {
    source: Arc<dyn ElementSource>,
    policy: RetryPolicy,
}

impl fmt::Debug for AssetDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetDiscovery")
            .field("source", &self.source.endpoint())
            .field("policy", &self.policy)
            .finish()
    }
}

impl AssetDiscovery {
    /// Facade over `source` retrying under `policy`.
    pub fn new<S>(source: S, policy: RetryPolicy) -> Self
    where
        S: ElementSource + 'static,
    {
        Self::from_shared(Arc::new(source), policy)
    }

    /// Facade over an already shared source.
    #[must_use]
    pub fn from_shared(source: Arc<dyn ElementSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Retry policy applied to every request.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Discover infrastructure assets inside the AOI described by `aoi`.
    ///
    /// `aoi` is a `GeoJSON` polygon geometry; only its outer ring is used.
    /// Elements that cannot be classified or reconstructed are dropped and
    /// counted in the returned diagnostics.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::InvalidArgument`] when the payload is empty, not
    ///   JSON, or carries no usable outer ring. No fetch is attempted.
    /// - [`DiscoveryError::UpstreamUnavailable`] when every fetch attempt
    ///   failed.
    /// - [`DiscoveryError::Cancelled`] when `cancel` fires first.
    pub async fn discover_assets(
        &self,
        aoi: &str,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryOutcome, DiscoveryError> {
        let payload = AoiPayload::parse(aoi).map_err(DiscoveryError::invalid)?;
        debug!(
            "AOI geometry type: {}",
            payload.geometry_type().unwrap_or("unspecified")
        );
        let bounds = payload.bounds().map_err(DiscoveryError::invalid)?;
        info!(
            "Discovering assets in bbox {:.6},{:.6},{:.6},{:.6}",
            bounds.min_lat(),
            bounds.min_lon(),
            bounds.max_lat(),
            bounds.max_lon()
        );

        let query = OverpassQuery::for_bounds(&bounds);
        let elements = fetch_with_retry(self.source.as_ref(), &query, &self.policy, cancel)
            .await
            .inspect_err(|err| warn!("Asset fetch failed: {err}"))?;

        let outcome = assemble(&elements);
        info!(
            "Discovered {} assets from {} elements ({}); dropped {}, skipped {}",
            outcome.collection.total_count,
            outcome.diagnostics.elements_received,
            KindSummary(&outcome.diagnostics.assets_by_kind),
            outcome.diagnostics.dropped_total(),
            outcome.diagnostics.skipped_geometries
        );
        Ok(outcome)
    }
}

/// Convert and encode `elements`, preserving their order.
fn assemble(elements: &[RawElement]) -> DiscoveryOutcome {
    let mut diagnostics = DiscoveryDiagnostics {
        elements_received: elements.len(),
        ..DiscoveryDiagnostics::default()
    };
    let mut records: Vec<AssetRecord> = Vec::with_capacity(elements.len());

    for element in elements {
        let asset = match convert_element(element) {
            Ok(asset) => asset,
            Err(reason) => {
                debug!("Dropped {} {}: {reason}", element.kind, element.id);
                diagnostics.record_drop(reason);
                continue;
            }
        };
        match asset.to_record() {
            Ok(record) => {
                diagnostics.record_asset(asset.kind);
                records.push(record);
            }
            Err(err) => {
                warn!("Skipping {} {}: {err}", element.kind, element.id);
                diagnostics.skipped_geometries += 1;
            }
        }
    }

    DiscoveryOutcome {
        collection: AssetCollection::new(records),
        diagnostics,
    }
}
