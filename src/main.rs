//! Stormwatch - a dashboard service for browsing active weather-hazard
//! alerts.
//!
//! # API Endpoints
//!
//! - `GET /dashboard` - The ordered, paginated alert view
//! - `GET /zones` - Zone list for the selected area
//! - `POST /selection` - Update filter/sort fields
//! - `POST /selection/clear` - Reset the filters
//! - `POST /pagination` - Update page index / page size
//! - `GET /health` - Health check

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use stormwatch::api::{AppState, router};
use stormwatch::data_sources::NwsClient;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

/// Default application identifier sent to the NWS API as the `User-Agent`.
const DEFAULT_USER_AGENT: &str = "stormwatch";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("stormwatch=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("STORMWATCH_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let user_agent =
        env::var("STORMWATCH_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

    // The base URL override exists for pointing at a test double
    let client = match env::var("STORMWATCH_API_BASE") {
        Ok(base) => NwsClient::with_base_url(&base, &user_agent),
        Err(_) => NwsClient::new(&user_agent),
    };

    info!(port, user_agent = %user_agent, "Starting stormwatch server");

    // Create application state and router
    let state = AppState::new(Arc::new(client));
    let app = router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Stormwatch is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
