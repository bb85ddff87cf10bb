//! Location handling for Wearcast
//!
//! Reconciles GPS fixes, preset cities, manual coordinate entry, and
//! saved quick-access locations into a single active source, with
//! Nominatim reverse geocoding for display labels.

pub mod acquire;
pub mod geocode;
pub mod provider;
pub mod registry;
pub mod types;

pub use acquire::{AcquiredFix, GeoAcquirer, FALLBACK_LABEL};
pub use geocode::reverse_geocode;
pub use provider::{IpLookupProvider, LocationProvider, UnsupportedProvider};
pub use registry::{CityEntry, LocationSourceRegistry, Selection};
pub use types::{Coordinate, CoordinateError, LocationError, RawFix, SavedLocation};
