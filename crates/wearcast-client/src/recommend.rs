//! Outfit scoring endpoint.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::GatewayError;
use crate::gateway::RequestGateway;
use crate::types::{Recommendation, ScoreRequest};

/// Scoring backend seam. The orchestrator talks to this trait so tests
/// can stand in a scripted backend.
#[async_trait]
pub trait RecommendationApi: Send + Sync {
    /// Submit one scoring request. Honors `cancel` for the whole
    /// exchange; a cancelled call returns [`GatewayError::Cancelled`].
    async fn score(
        &self,
        request: &ScoreRequest,
        cancel: &CancellationToken,
    ) -> Result<Recommendation, GatewayError>;
}

/// HTTP implementation of [`RecommendationApi`] against POST /score.
pub struct ScoreClient {
    gateway: RequestGateway,
}

impl ScoreClient {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl RecommendationApi for ScoreClient {
    async fn score(
        &self,
        request: &ScoreRequest,
        cancel: &CancellationToken,
    ) -> Result<Recommendation, GatewayError> {
        let body = serde_json::to_value(request)
            .map_err(|e| GatewayError::Malformed(format!("request encode: {}", e)))?;
        let value = self.gateway.post_json("/score", &body, cancel).await?;

        // A 200 without a weather object is useless to every consumer,
        // so it surfaces as malformed rather than a zeroed snapshot.
        if value.get("weather").map_or(true, serde_json::Value::is_null) {
            return Err(GatewayError::Malformed(
                "response is missing the weather object".to_string(),
            ));
        }

        let recommendation: Recommendation = serde_json::from_value(value)
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        tracing::debug!(
            comfort_score = recommendation.comfort_score,
            forecast = %recommendation.weather.short_forecast,
            "Recommendation received"
        );
        Ok(recommendation)
    }
}
