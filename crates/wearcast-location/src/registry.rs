//! Location source registry.
//!
//! Tracks which of the four location sources is active and keeps the
//! coordinate form fields in sync. At most one source is ever selected;
//! the selection is a single enum field, so exclusivity holds by
//! construction rather than by bookkeeping.

use crate::acquire::AcquiredFix;
use crate::types::{Coordinate, SavedLocation};

/// Which location source is currently selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Gps,
    City(usize),
    Manual,
    QuickAccess(usize),
}

/// A preset city offered in the picker.
#[derive(Debug, Clone)]
pub struct CityEntry {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

const PRESET_CITIES: &[(&str, f64, f64)] = &[
    ("New York", 40.7128, -74.0060),
    ("Los Angeles", 34.0522, -118.2437),
    ("Chicago", 41.8781, -87.6298),
    ("Houston", 29.7604, -95.3698),
    ("Seattle", 47.6062, -122.3321),
    ("Miami", 25.7617, -80.1918),
    ("Denver", 39.7392, -104.9903),
    ("Boston", 42.3601, -71.0589),
];

/// Registry reconciling GPS, city picks, manual entry, and quick-access
/// locations into one pair of coordinate fields.
///
/// Every activation sets both fields and replaces the selection wholesale,
/// even when the new coordinates equal the old ones; it is the selection
/// identity that matters, not coordinate equality. Editing a field demotes
/// whatever was selected to `Manual`.
#[derive(Debug, Default)]
pub struct LocationSourceRegistry {
    selection: Selection,
    latitude_field: Option<f64>,
    longitude_field: Option<f64>,
    label: Option<String>,
    cities: Vec<CityEntry>,
    quick_access: Vec<SavedLocation>,
}

impl LocationSourceRegistry {
    pub fn new() -> Self {
        Self {
            cities: PRESET_CITIES
                .iter()
                .map(|(name, lat, lon)| CityEntry {
                    name: (*name).to_string(),
                    latitude: *lat,
                    longitude: *lon,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn latitude_field(&self) -> Option<f64> {
        self.latitude_field
    }

    pub fn longitude_field(&self) -> Option<f64> {
        self.longitude_field
    }

    /// Display label for the active source, if it has one.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn cities(&self) -> &[CityEntry] {
        &self.cities
    }

    pub fn quick_access(&self) -> &[SavedLocation] {
        &self.quick_access
    }

    /// Replace the quick-access list (after a settings sync).
    ///
    /// A selected entry whose index no longer exists demotes to `Manual`;
    /// the coordinate fields keep their last values either way.
    pub fn set_quick_access(&mut self, locations: Vec<SavedLocation>) {
        if let Selection::QuickAccess(index) = self.selection {
            if index >= locations.len() {
                self.selection = Selection::Manual;
            }
        }
        self.quick_access = locations;
    }

    /// Select the device GPS fix as the active source.
    pub fn activate_gps(&mut self, fix: &AcquiredFix) -> Coordinate {
        self.selection = Selection::Gps;
        self.latitude_field = Some(fix.display_latitude);
        self.longitude_field = Some(fix.display_longitude);
        self.label = Some(fix.label.clone());
        tracing::debug!("Activated GPS source ({})", fix.label);
        fix.coordinate
    }

    /// Select a preset city. Returns `None` for an unknown index.
    pub fn activate_city(&mut self, index: usize) -> Option<Coordinate> {
        let city = match self.cities.get(index) {
            Some(c) => c,
            None => {
                tracing::warn!("City index {} out of bounds", index);
                return None;
            }
        };
        let coordinate = Coordinate::new(city.latitude, city.longitude).ok()?;

        self.selection = Selection::City(index);
        self.latitude_field = Some(city.latitude);
        self.longitude_field = Some(city.longitude);
        self.label = Some(city.name.clone());
        tracing::debug!("Activated city source: {}", city.name);
        Some(coordinate)
    }

    /// Select a quick-access entry. Returns `None` for an unknown index
    /// or an entry with out-of-range coordinates; the current state is
    /// left untouched in both cases.
    pub fn activate_quick_access(&mut self, index: usize) -> Option<Coordinate> {
        let entry = match self.quick_access.get(index) {
            Some(e) => e,
            None => {
                tracing::warn!("Quick-access index {} out of bounds", index);
                return None;
            }
        };
        let coordinate = match entry.coordinate() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Quick-access entry {:?} rejected: {}", entry.name, e);
                return None;
            }
        };

        self.selection = Selection::QuickAccess(index);
        self.latitude_field = Some(entry.latitude);
        self.longitude_field = Some(entry.longitude);
        self.label = Some(entry.name.clone());
        tracing::debug!("Activated quick-access source: {}", entry.name);
        Some(coordinate)
    }

    /// Apply a latitude edit from the form. Any edit makes the source
    /// `Manual`, whatever was selected before.
    pub fn edit_latitude(&mut self, input: &str) -> Option<Coordinate> {
        self.latitude_field = parse_field(input);
        self.demote_to_manual();
        self.resolved()
    }

    /// Apply a longitude edit from the form. Same demotion rule as
    /// [`Self::edit_latitude`].
    pub fn edit_longitude(&mut self, input: &str) -> Option<Coordinate> {
        self.longitude_field = parse_field(input);
        self.demote_to_manual();
        self.resolved()
    }

    /// The coordinate the form currently describes, when both fields are
    /// present and in range.
    pub fn resolved(&self) -> Option<Coordinate> {
        let latitude = self.latitude_field?;
        let longitude = self.longitude_field?;
        Coordinate::new(latitude, longitude).ok()
    }

    fn demote_to_manual(&mut self) {
        self.selection = Selection::Manual;
        self.label = None;
    }
}

fn parse_field(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
