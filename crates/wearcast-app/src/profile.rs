//! Comfort temperature preference.

/// Validation bounds enforced by the scoring service on
/// `comfort_temperature`; values outside them are rejected with a 422.
pub const COMFORT_MIN_F: f64 = 50.0;
pub const COMFORT_MAX_F: f64 = 90.0;

/// Starting preference before the user or their settings say otherwise.
pub const COMFORT_DEFAULT_F: f64 = 70.0;

/// The user's preferred temperature in Fahrenheit. Unset means the
/// scoring service applies its own default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComfortProfile {
    comfort_temperature_f: Option<f64>,
}

impl Default for ComfortProfile {
    fn default() -> Self {
        Self {
            comfort_temperature_f: Some(COMFORT_DEFAULT_F),
        }
    }
}

impl ComfortProfile {
    pub fn comfort_temperature_f(&self) -> Option<f64> {
        self.comfort_temperature_f
    }

    /// Replace the preference with a stored value, e.g. from the user's
    /// settings document. Non-finite values clear it.
    pub fn set(&mut self, value: Option<f64>) {
        self.comfort_temperature_f = value.filter(|v| v.is_finite()).map(clamp);
    }

    /// Interpret raw text input. Empty or unparseable text clears the
    /// preference so the request carries no comfort key at all; parsed
    /// values are clamped into the service's accepted range.
    pub fn set_from_input(&mut self, raw: &str) {
        self.comfort_temperature_f = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(clamp);
    }
}

fn clamp(value: f64) -> f64 {
    value.clamp(COMFORT_MIN_F, COMFORT_MAX_F)
}
