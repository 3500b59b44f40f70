//! JSON bodies exchanged over the discovery RPC endpoint.

use serde::{Deserialize, Serialize};

use crate::discovery::{DiscoveryError, ErrorCode};

/// Path of the discovery RPC.
pub const DISCOVER_ASSETS_PATH: &str = "/rpc/discover-assets";
/// Path of the health probe.
pub const HEALTH_PATH: &str = "/health";
/// Service name reported by the health probe.
pub const SERVICE_NAME: &str = "infrastructure";
/// Status reported by a healthy server.
pub const SERVING: &str = "SERVING";

/// `DiscoverAssets` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverAssetsRequest {
    /// `GeoJSON` polygon geometry, encoded as a string.
    #[serde(default)]
    pub aoi_geojson: String,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Status code.
    pub code: ErrorCode,
    /// Caller-facing description.
    pub message: String,
}

impl ErrorBody {
    /// Body with an explicit code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&DiscoveryError> for ErrorBody {
    fn from(error: &DiscoveryError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

/// Health probe response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `SERVING` when the server accepts requests.
    pub status: String,
    /// Service name.
    pub service: String,
}

impl HealthStatus {
    /// The status a running server reports.
    #[must_use]
    pub fn serving() -> Self {
        Self {
            status: SERVING.to_owned(),
            service: SERVICE_NAME.to_owned(),
        }
    }

    /// Whether the status reports `SERVING`.
    #[must_use]
    pub fn is_serving(&self) -> bool {
        self.status == SERVING
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn health_body_matches_probe_contract() {
        let body = serde_json::to_value(HealthStatus::serving()).expect("serialises");
        assert_eq!(body, json!({"status": "SERVING", "service": "infrastructure"}));
    }

    #[rstest]
    #[case(ErrorCode::InvalidArgument, "INVALID_ARGUMENT")]
    #[case(ErrorCode::Internal, "INTERNAL")]
    #[case(ErrorCode::Cancelled, "CANCELLED")]
    fn error_codes_use_wire_names(#[case] code: ErrorCode, #[case] wire: &str) {
        let body = serde_json::to_value(ErrorBody::new(code, "boom")).expect("serialises");
        assert_eq!(body, json!({"code": wire, "message": "boom"}));
        assert_eq!(code.as_str(), wire);
    }

    #[rstest]
    fn missing_payload_decodes_as_empty() {
        let request: DiscoverAssetsRequest = serde_json::from_str("{}").expect("decodes");
        assert!(request.aoi_geojson.is_empty());
    }
}
