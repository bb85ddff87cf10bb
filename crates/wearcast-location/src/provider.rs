//! Location provider capability.
//!
//! The acquirer talks to whatever the host platform can offer through
//! this trait; the shipped implementation is an IP-based lookup, which
//! works everywhere a network does.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::types::{Coordinate, LocationError, RawFix};

/// Source of device position fixes.
///
/// Implementations must return a fresh fix at the highest accuracy
/// available, never a cached one. A stale position is worse than an
/// honest failure.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> Result<RawFix, LocationError>;
}

/// Provider for hosts with no location capability at all.
pub struct UnsupportedProvider;

#[async_trait]
impl LocationProvider for UnsupportedProvider {
    async fn locate(&self) -> Result<RawFix, LocationError> {
        Err(LocationError::Unsupported)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
}

/// IP geolocation over a JSON endpoint (ip-api.com shape).
///
/// Coarse (city level), so no accuracy figure is reported.
pub struct IpLookupProvider {
    lookup_url: String,
    timeout: Duration,
}

impl IpLookupProvider {
    pub fn new(lookup_url: &str, timeout: Duration) -> Self {
        Self {
            lookup_url: lookup_url.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl LocationProvider for IpLookupProvider {
    async fn locate(&self) -> Result<RawFix, LocationError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| LocationError::Unavailable(format!("IP lookup client: {}", e)))?;

        let response = client
            .get(&self.lookup_url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LocationError::Timeout
                } else {
                    LocationError::Unavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "IP lookup returned status {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(format!("IP lookup parse error: {}", e)))?;

        if body.status.as_deref() == Some("fail") {
            return Err(LocationError::Unavailable(
                "IP lookup could not resolve this address".to_string(),
            ));
        }

        let (lat, lon) = match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(LocationError::Unavailable(
                    "IP lookup response had no coordinates".to_string(),
                ))
            }
        };

        let coordinate = Coordinate::new(lat, lon)
            .map_err(|e| LocationError::Unavailable(format!("IP lookup coordinates: {}", e)))?;

        tracing::debug!("IP lookup fix: {}", coordinate);

        Ok(RawFix {
            coordinate,
            accuracy_meters: None,
            city_hint: body.city.filter(|c| !c.is_empty()),
        })
    }
}
