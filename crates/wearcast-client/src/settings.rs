//! Per-user settings endpoint.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::GatewayError;
use crate::gateway::RequestGateway;
use crate::types::UserSettings;

/// Settings backend seam, mirroring [`crate::RecommendationApi`].
#[async_trait]
pub trait SettingsApi: Send + Sync {
    async fn fetch_settings(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<UserSettings, GatewayError>;
}

/// HTTP implementation of [`SettingsApi`] against GET /settings/{user_id}.
pub struct SettingsClient {
    gateway: RequestGateway,
}

impl SettingsClient {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl SettingsApi for SettingsClient {
    async fn fetch_settings(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<UserSettings, GatewayError> {
        let path = format!("/settings/{}", urlencoding::encode(user_id));
        let value = self.gateway.get_json(&path, cancel).await?;
        let settings: UserSettings = serde_json::from_value(value)
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        tracing::debug!(
            user_id = %user_id,
            saved_locations = settings.saved_locations.len(),
            "Fetched user settings"
        );
        Ok(settings)
    }
}
