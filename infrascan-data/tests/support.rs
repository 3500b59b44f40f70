//! In-process stand-in for an Overpass interpreter.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
use axum::routing::post;
use tokio::net::TcpListener;

/// Request observed by the stand-in.
#[derive(Debug, Clone, Default)]
pub struct Observed {
    /// `Content-Type` header, if sent.
    pub content_type: Option<String>,
    /// Raw request body.
    pub body: String,
}

#[derive(Clone)]
struct StandIn {
    status: StatusCode,
    body: &'static str,
    observed: Arc<Mutex<Vec<Observed>>>,
}

/// Handle to a running stand-in server.
pub struct OverpassStandIn {
    /// Bound loopback address.
    pub addr: SocketAddr,
    observed: Arc<Mutex<Vec<Observed>>>,
}

impl OverpassStandIn {
    /// Serve `body` with `status` for every POST to `/api/interpreter`.
    pub async fn start(status: StatusCode, body: &'static str) -> Self {
        let observed = Arc::new(Mutex::new(Vec::new()));
        let state = StandIn {
            status,
            body,
            observed: Arc::clone(&observed),
        };
        let router = Router::new()
            .route("/api/interpreter", post(interpret))
            .with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stand-in server");
        });
        Self { addr, observed }
    }

    /// Interpreter URL on the stand-in.
    pub fn url(&self) -> String {
        format!("http://{}/api/interpreter", self.addr)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<Observed> {
        self.observed.lock().expect("observed lock").clone()
    }
}

async fn interpret(
    State(state): State<StandIn>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, &'static str) {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    state
        .observed
        .lock()
        .expect("observed lock")
        .push(Observed { content_type, body });
    (state.status, state.body)
}

/// A closed building way and a hospital node inside the unit square.
pub const SAMPLE_RESPONSE: &str = r#"{
    "elements": [
        {"type": "way", "id": 100, "tags": {"building": "yes"},
         "geometry": [
            {"lat": 0.2, "lon": 0.2}, {"lat": 0.2, "lon": 0.4},
            {"lat": 0.4, "lon": 0.4}, {"lat": 0.4, "lon": 0.2},
            {"lat": 0.2, "lon": 0.2}
         ]},
        {"type": "node", "id": 200, "lat": 0.5, "lon": 0.5,
         "tags": {"amenity": "hospital", "name": "General"}}
    ]
}"#;
