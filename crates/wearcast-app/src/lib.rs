//! Wearcast application core
//!
//! Coordinates location sources, the single-flight recommendation
//! orchestrator, and quick-access settings sync on top of the
//! `wearcast-client` and `wearcast-location` crates.

pub mod app;
pub mod orchestrator;
pub mod profile;
pub mod quick_access;
pub mod state;

pub use app::App;
pub use orchestrator::Orchestrator;
pub use profile::{ComfortProfile, COMFORT_DEFAULT_F, COMFORT_MAX_F, COMFORT_MIN_F};
pub use quick_access::QuickAccessSync;
pub use state::{FailureKind, FetchFailure, LocationEvent, ViewState};
