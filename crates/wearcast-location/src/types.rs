use serde::{Deserialize, Serialize};

/// A geographic coordinate validated against WGS84 bounds.
///
/// Construction goes through [`Coordinate::new`]; once captured for a
/// request the value never changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Rejected coordinate input.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
}

/// A fix as reported by a location provider, before display rounding
/// and labeling.
#[derive(Debug, Clone)]
pub struct RawFix {
    pub coordinate: Coordinate,
    pub accuracy_meters: Option<f64>,
    /// Place name the provider already knows (IP lookups return one);
    /// saves a reverse geocoding round trip when present.
    pub city_hint: Option<String>,
}

/// A location saved in the user's remote settings. Read-only here;
/// the settings service owns the canonical copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl SavedLocation {
    /// Validated coordinate for this entry.
    pub fn coordinate(&self) -> Result<Coordinate, CoordinateError> {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Geolocation failures. All are recoverable; manual coordinate entry
/// stays available whatever happens here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("Geolocation is not supported on this device")]
    Unsupported,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
    #[error("Location request timed out")]
    Timeout,
}
