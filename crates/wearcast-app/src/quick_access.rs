//! Saved-location snapshots from the settings service.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use wearcast_client::{GatewayError, SettingsApi, UserSettings};
use wearcast_location::SavedLocation;

/// Read-only cache of the user's saved locations.
///
/// A failed refresh keeps the previous snapshot; a transient settings
/// outage must not blank out the quick-access entries already on screen.
pub struct QuickAccessSync {
    api: Arc<dyn SettingsApi>,
    locations: RwLock<Vec<SavedLocation>>,
}

impl QuickAccessSync {
    pub fn new(api: Arc<dyn SettingsApi>) -> Self {
        Self {
            api,
            locations: RwLock::new(Vec::new()),
        }
    }

    /// Latest known snapshot.
    pub fn locations(&self) -> Vec<SavedLocation> {
        self.locations.read().clone()
    }

    /// Drop the snapshot, e.g. when the identity signal reports a logout.
    pub fn clear(&self) {
        self.locations.write().clear();
    }

    /// Fetch the user's settings document and replace the snapshot on
    /// success. Returns the whole document so callers can apply the
    /// other fields they care about.
    pub async fn refresh(&self, user_id: &str) -> Result<UserSettings, GatewayError> {
        let cancel = CancellationToken::new();
        match self.api.fetch_settings(user_id, &cancel).await {
            Ok(settings) => {
                *self.locations.write() = settings.saved_locations.clone();
                tracing::info!(
                    user_id = %user_id,
                    count = settings.saved_locations.len(),
                    "Quick access locations updated"
                );
                Ok(settings)
            }
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %err,
                    "Settings refresh failed, keeping cached quick access"
                );
                Err(err)
            }
        }
    }
}
