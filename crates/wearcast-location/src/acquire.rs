//! Geolocation acquisition: provider fix + timeout + display label.

use std::sync::Arc;
use std::time::Duration;

use wearcast_core::{GeocodingConfig, GeolocationConfig};

use crate::geocode::reverse_geocode;
use crate::provider::LocationProvider;
use crate::types::{Coordinate, LocationError};

/// Label used when reverse geocoding cannot name the place.
pub const FALLBACK_LABEL: &str = "Current Location";

/// A fix ready for display and for driving a request.
///
/// `coordinate` keeps the provider's full precision; the display pair is
/// rounded to 4 decimal places (about 11 m), which is all a form field
/// needs to show.
#[derive(Debug, Clone)]
pub struct AcquiredFix {
    pub coordinate: Coordinate,
    pub display_latitude: f64,
    pub display_longitude: f64,
    pub label: String,
}

/// Wraps a [`LocationProvider`] with a timeout and best-effort labeling.
pub struct GeoAcquirer {
    provider: Arc<dyn LocationProvider>,
    geocode_endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl GeoAcquirer {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        geocode_endpoint: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            geocode_endpoint: geocode_endpoint.to_string(),
            user_agent: user_agent.to_string(),
            timeout,
        }
    }

    /// Build from config sections, using the given provider.
    pub fn from_config(
        provider: Arc<dyn LocationProvider>,
        geolocation: &GeolocationConfig,
        geocoding: &GeocodingConfig,
    ) -> Self {
        Self::new(
            provider,
            &geocoding.reverse_url,
            &geocoding.user_agent,
            Duration::from_millis(geolocation.timeout_ms),
        )
    }

    /// Obtain a fresh fix, bounded by the configured timeout.
    ///
    /// Labeling is best effort: a provider city hint wins, then reverse
    /// geocoding, then [`FALLBACK_LABEL`]. A failed label never fails
    /// the acquisition.
    pub async fn acquire(&self) -> Result<AcquiredFix, LocationError> {
        let fix = tokio::time::timeout(self.timeout, self.provider.locate())
            .await
            .map_err(|_| LocationError::Timeout)??;

        let label = match fix.city_hint {
            Some(city) => city,
            None => {
                reverse_geocode(&self.geocode_endpoint, &self.user_agent, fix.coordinate)
                    .await
                    .unwrap_or_else(|| FALLBACK_LABEL.to_string())
            }
        };

        let acquired = AcquiredFix {
            coordinate: fix.coordinate,
            display_latitude: round4(fix.coordinate.latitude()),
            display_longitude: round4(fix.coordinate.longitude()),
            label,
        };

        tracing::info!(
            "Acquired fix at {}, {} ({})",
            acquired.display_latitude,
            acquired.display_longitude,
            acquired.label
        );

        Ok(acquired)
    }
}

/// Round to 4 decimal places for display.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
