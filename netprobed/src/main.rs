//! netprobed: a thin HTTP front door over the iperf3 client and TWAMP
//! analyzer measurement cores.

mod config;
mod dispatcher;
mod error;
mod request;
mod response;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::Level;

use async_trait::async_trait;
use twamp_analyzer::clock::{ClockProbe, StubClockProbe};
use twamp_analyzer::error::Result as TwampResult;
use twamp_analyzer::probe::ProbeRecord;
use twamp_analyzer::transport::{TwampSessionParams, TwampSessionTransport};
use twamp_analyzer::TwampError;

use request::{Iperf3Request, TwampRequest};
use response::{Envelope, Iperf3Document};

/// The real TWAMP-Test control handshake and probe scheduling are an
/// external collaborator per this service's contract; this placeholder
/// documents the seam until a concrete transport is wired in.
struct UnconfiguredTwampTransport;

#[async_trait]
impl TwampSessionTransport for UnconfiguredTwampTransport {
    async fn run_session(&self, _params: &TwampSessionParams) -> TwampResult<Vec<ProbeRecord>> {
        Err(TwampError::Transport(
            "no TWAMP session transport configured".to_string(),
        ))
    }
}

#[derive(Clone)]
struct AppState {
    twamp_transport: Arc<dyn TwampSessionTransport>,
    clock_probe: Arc<dyn ClockProbe>,
}

async fn health() -> &'static str {
    "ok"
}

async fn handle_iperf3(Json(request): Json<Iperf3Request>) -> Json<Envelope<Iperf3Document>> {
    match dispatcher::dispatch_iperf3(request).await {
        Ok(document) => Json(Envelope::ok(document)),
        Err(err) => Json(Envelope::error(err.to_string())),
    }
}

async fn handle_twamp(
    State(state): State<AppState>,
    Json(request): Json<TwampRequest>,
) -> Json<Envelope<twamp_analyzer::TwampResult>> {
    match dispatcher::dispatch_twamp(request, state.twamp_transport.as_ref(), state.clock_probe.as_ref()).await {
        Ok(document) => Json(Envelope::ok(document)),
        Err(err) => Json(Envelope::error(err.to_string())),
    }
}

fn init_tracing(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(env_filter) => {
            tracing_subscriber::fmt().with_env_filter(env_filter).init();
        }
        Err(_) => {
            tracing_subscriber::fmt().with_max_level(level).init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load_or_default();
    init_tracing(&config.logging.level);

    tracing::info!("Starting netprobed");
    tracing::info!("  Host: {}", config.server.host);
    tracing::info!("  Port: {}", config.server.port);

    let state = AppState {
        twamp_transport: Arc::new(UnconfiguredTwampTransport),
        clock_probe: Arc::new(StubClockProbe),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/measurements/iperf3", post(handle_iperf3))
        .route("/measurements/twamp", post(handle_twamp))
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
