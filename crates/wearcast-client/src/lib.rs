//! Wearcast backend client
//!
//! HTTP plumbing for the scoring service: a cancellation-aware request
//! gateway plus typed clients for the /score and /settings endpoints.

pub mod error;
pub mod gateway;
pub mod recommend;
pub mod settings;
pub mod types;

pub use error::GatewayError;
pub use gateway::RequestGateway;
pub use recommend::{RecommendationApi, ScoreClient};
pub use settings::{SettingsApi, SettingsClient};
pub use types::{
    ClothingItem, EchoedCoordinate, Recommendation, ScoreBreakdown, ScoreRequest, UserSettings,
    WeatherSnapshot,
};
