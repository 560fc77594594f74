//! Remote data source for weather-hazard alerts.
//!
//! The core consumes the remote API through the [`AlertFeed`] trait: one
//! opaque, fallible fetch per query kind. [`NwsClient`] is the production
//! implementation against `api.weather.gov`; tests substitute scripted
//! feeds.

pub mod nws;

pub use nws::NwsClient;

use async_trait::async_trait;

use crate::model::{Alert, Zone};

/// Error taxonomy for remote fetches.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS, or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("unexpected status {status}")]
    Status { status: u16 },

    /// The response body did not decode as the expected collection shape.
    #[error("malformed payload: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether a retry can plausibly succeed.
    ///
    /// Transport failures, server errors, and rate limiting are transient;
    /// client errors and malformed payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status { status } => *status >= 500 || *status == 429,
            FetchError::Decode(_) => false,
        }
    }
}

/// The fetch operations the dashboard core depends on.
#[async_trait]
pub trait AlertFeed: Send + Sync {
    /// All currently active alerts (no area selected).
    async fn active_alerts(&self) -> Result<Vec<Alert>, FetchError>;

    /// Alerts scoped to an administrative area code.
    async fn area_alerts(&self, area: &str) -> Result<Vec<Alert>, FetchError>;

    /// Alerts scoped to a zone id.
    async fn zone_alerts(&self, zone: &str) -> Result<Vec<Alert>, FetchError>;

    /// Zones belonging to an area.
    async fn zones(&self, area: &str) -> Result<Vec<Zone>, FetchError>;
}
