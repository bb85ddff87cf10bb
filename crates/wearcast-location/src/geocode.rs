//! Turn coordinates into display labels via Nominatim (OpenStreetMap).
//! No API key needed; the endpoint only asks for an identifying User-Agent.

use crate::types::Coordinate;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// Prefer city > town > village > municipality for the primary
    /// place name, with broader areas as a last resort.
    fn place(self) -> (Option<String>, Option<String>, Option<String>) {
        let state = self.state.clone();
        let country = self.country.clone();
        let place = self
            .city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.state_district)
            .or(self.county)
            .or(self.state)
            .or(self.country);
        (place, state, country)
    }
}

/// Reverse geocode a coordinate to a place name (e.g. "Seattle, Washington").
///
/// Best effort: returns `None` on any failure so the caller can fall back
/// to a generic label. Runs on its own timeout, independent of whatever
/// budget the caller is under.
pub async fn reverse_geocode(
    endpoint: &str,
    user_agent: &str,
    coordinate: Coordinate,
) -> Option<String> {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(user_agent)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to create geocoding client: {}", e);
            return None;
        }
    };

    let url = format!(
        "{}?lat={}&lon={}&format=json&addressdetails=1&zoom=10",
        endpoint,
        coordinate.latitude(),
        coordinate.longitude()
    );

    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("Reverse geocode request failed: {}", e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("Reverse geocode returned status {}", response.status());
        return None;
    }

    let body: NominatimResponse = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("Reverse geocode parse error: {}", e);
            return None;
        }
    };

    let (place, state, country) = body.address?.place();
    let place = place?;

    // Disambiguate with the state (or country) unless it repeats the place
    let suffix = state
        .as_ref()
        .filter(|s| !s.is_empty() && s.as_str() != place)
        .or_else(|| {
            country
                .as_ref()
                .filter(|c| !c.is_empty() && c.as_str() != place)
        });

    let result = match suffix {
        Some(s) => format!("{}, {}", place, s),
        None => place,
    };

    tracing::info!("Reverse geocoded to: {}", result);
    Some(result)
}
