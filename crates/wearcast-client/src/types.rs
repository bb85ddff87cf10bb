//! Wire types for the scoring and settings endpoints.

use serde::{Deserialize, Serialize};
use wearcast_location::{Coordinate, SavedLocation};

/// Body for POST /score. Built fresh per request and never mutated;
/// an in-flight request stays tied to the inputs that spawned it.
///
/// An unset comfort temperature is an absent key on the wire, never 0,
/// so the backend default (70 F) applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfort_temperature: Option<f64>,
}

impl ScoreRequest {
    pub fn new(coordinate: Coordinate, comfort_temperature: Option<f64>) -> Self {
        Self {
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
            comfort_temperature,
        }
    }
}

/// Weather conditions the score was computed from.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSnapshot {
    pub temp_f: f64,
    pub wind_mph: f64,
    pub short_forecast: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub period_start: String,
    #[serde(default)]
    pub source: String,
}

/// One recommended clothing item.
#[derive(Debug, Clone, Deserialize)]
pub struct ClothingItem {
    pub name: String,
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rainproof: Option<bool>,
    #[serde(default)]
    pub windproof: Option<bool>,
    #[serde(default)]
    pub insulated: Option<bool>,
}

/// Comfort score component breakdown.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreBreakdown {
    pub temperature_score: f64,
    pub wind_multiplier: f64,
    pub forecast_score: f64,
    pub final_score: f64,
}

/// Coordinates the backend echoes with the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EchoedCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Full response to POST /score. Passed through beyond shape checks;
/// how the score is computed is the backend's business.
#[derive(Debug, Clone, Deserialize)]
pub struct Recommendation {
    pub weather: WeatherSnapshot,
    pub comfort_score: f64,
    #[serde(default)]
    pub score_breakdown: Option<ScoreBreakdown>,
    #[serde(default)]
    pub clothing_recommendations: Vec<ClothingItem>,
    #[serde(default)]
    pub location: Option<EchoedCoordinate>,
}

/// The slice of GET /settings/{user_id} this client consumes. Unknown
/// fields in the document are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub saved_locations: Vec<SavedLocation>,
    #[serde(default)]
    pub comfort_temperature: Option<f64>,
}
