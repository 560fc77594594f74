//! National Weather Service API client.
//!
//! The NWS API serves public weather-hazard alerts for the United States as
//! GeoJSON feature collections.
//!
//! # API Reference
//!
//! See: <https://www.weather.gov/documentation/services-web-api>
//!
//! # Identification
//!
//! The API requires a `User-Agent` header identifying the application; the
//! client sends the app name it was constructed with on every request.
//!
//! # Retries
//!
//! Transient failures (transport errors, HTTP 5xx, 429) are retried up to
//! 3 attempts with exponential backoff before surfacing. Permanent failures
//! (other non-2xx statuses, malformed payloads) surface immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::{AlertFeed, FetchError};
use crate::model::{Alert, AlertCollection, Zone, ZoneCollection};

/// Base URL for the NWS API.
const NWS_API_BASE: &str = "https://api.weather.gov";

/// Max attempts per fetch, counting the first.
const MAX_ATTEMPTS: u32 = 3;
/// Base backoff duration. Actual delay is base * 2^attempt.
const RETRY_BASE: Duration = Duration::from_millis(250);

/// Client for querying the NWS alerts API.
#[derive(Clone)]
pub struct NwsClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl Default for NwsClient {
    fn default() -> Self {
        Self::new("stormwatch")
    }
}

impl NwsClient {
    /// Create a new NWS client.
    ///
    /// # Arguments
    ///
    /// * `app_name` - Application identifier sent as the `User-Agent`.
    pub fn new(app_name: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: NWS_API_BASE.to_string(),
            user_agent: app_name.to_string(),
        }
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str, app_name: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            user_agent: app_name.to_string(),
        }
    }

    fn active_alerts_url(&self) -> String {
        format!("{}/alerts/active", self.base_url)
    }

    fn area_alerts_url(&self, area: &str) -> String {
        format!("{}/alerts?area={}", self.base_url, urlencoding::encode(area))
    }

    fn zone_alerts_url(&self, zone: &str) -> String {
        format!(
            "{}/alerts/active/zone/{}",
            self.base_url,
            urlencoding::encode(zone)
        )
    }

    fn zones_url(&self, area: &str) -> String {
        format!("{}/zones?area={}", self.base_url, urlencoding::encode(area))
    }

    /// One GET with no retry.
    async fn try_get<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|err| {
            if err.is_decode() {
                FetchError::Decode(err.to_string())
            } else {
                FetchError::Transport(err)
            }
        })
    }

    /// GET with bounded retry on transient failures.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let mut attempt = 0;
        loop {
            match self.try_get::<T>(url).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if !err.is_transient() || attempt >= MAX_ATTEMPTS {
                        warn!(url, attempts = attempt, error = %err, "NWS request failed");
                        return Err(err);
                    }
                    let backoff = RETRY_BASE * 2u32.pow(attempt - 1);
                    warn!(
                        url,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "NWS request failed, retrying after backoff"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[async_trait]
impl AlertFeed for NwsClient {
    async fn active_alerts(&self) -> Result<Vec<Alert>, FetchError> {
        let data: AlertCollection = self.get_json(&self.active_alerts_url()).await?;
        Ok(data.features)
    }

    async fn area_alerts(&self, area: &str) -> Result<Vec<Alert>, FetchError> {
        let data: AlertCollection = self.get_json(&self.area_alerts_url(area)).await?;
        Ok(data.features)
    }

    async fn zone_alerts(&self, zone: &str) -> Result<Vec<Alert>, FetchError> {
        let data: AlertCollection = self.get_json(&self.zone_alerts_url(zone)).await?;
        Ok(data.features)
    }

    async fn zones(&self, area: &str) -> Result<Vec<Zone>, FetchError> {
        let data: ZoneCollection = self.get_json(&self.zones_url(area)).await?;
        Ok(data.into_zones())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = NwsClient::new("stormwatch-test");

        assert_eq!(
            client.active_alerts_url(),
            "https://api.weather.gov/alerts/active"
        );
        assert_eq!(
            client.area_alerts_url("CA"),
            "https://api.weather.gov/alerts?area=CA"
        );
        assert_eq!(
            client.zone_alerts_url("CAZ043"),
            "https://api.weather.gov/alerts/active/zone/CAZ043"
        );
        assert_eq!(
            client.zones_url("TX"),
            "https://api.weather.gov/zones?area=TX"
        );
    }

    #[test]
    fn test_scope_values_are_encoded() {
        let client = NwsClient::with_base_url("http://localhost:9", "stormwatch-test");

        assert_eq!(
            client.area_alerts_url("C A"),
            "http://localhost:9/alerts?area=C%20A"
        );
        assert_eq!(
            client.zone_alerts_url("a/b"),
            "http://localhost:9/alerts/active/zone/a%2Fb"
        );
    }
}
