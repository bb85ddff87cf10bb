//! Request gateway: one bounded, cancellable HTTP exchange at a time.
//!
//! Every call races the exchange against the caller's cancellation token
//! and a timer; whichever finishes first decides the outcome, and the
//! losing futures are dropped on the spot. Callers own all state; the
//! gateway has no side effects beyond the wire.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::instrument;
use url::Url;

use crate::error::{classify_transport, GatewayError};

pub struct RequestGateway {
    client: reqwest::Client,
    base_url: String,
    host: String,
    timeout: Duration,
}

impl RequestGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let host = Url::parse(base_url)
            .ok()
            .and_then(|u| {
                u.host_str().map(|h| match u.port() {
                    Some(port) => format!("{}:{}", h, port),
                    None => h.to_string(),
                })
            })
            .unwrap_or_else(|| base_url.to_string());

        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            host,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body, bounded by the configured timeout and the
    /// caller's token. Exactly one of value or error comes back.
    #[instrument(skip(self, body, cancel), level = "info")]
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let exchange = async {
            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| classify_transport(&self.host, e))?;
            handle_response(response).await
        };
        self.bounded(exchange, cancel).await
    }

    /// GET a JSON resource with the same bounds as [`Self::post_json`].
    #[instrument(skip(self, cancel), level = "info")]
    pub async fn get_json(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let exchange = async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| classify_transport(&self.host, e))?;
            handle_response(response).await
        };
        self.bounded(exchange, cancel).await
    }

    /// Liveness probe against GET /health: true on 2xx, false on any
    /// HTTP error status. Transport failures still surface as errors.
    pub async fn health(&self, cancel: &CancellationToken) -> Result<bool, GatewayError> {
        match self.get_json("/health", cancel).await {
            Ok(_) => Ok(true),
            Err(GatewayError::Http { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Race the exchange against cancellation and the timer. Dropping
    /// the losing branches disarms the timer on every path.
    async fn bounded<F>(
        &self,
        exchange: F,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, GatewayError>
    where
        F: std::future::Future<Output = Result<serde_json::Value, GatewayError>>,
    {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Request cancelled by caller");
                Err(GatewayError::Cancelled)
            }
            _ = tokio::time::sleep(self.timeout) => {
                tracing::warn!("Request timed out after {:?}", self.timeout);
                Err(GatewayError::Timeout)
            }
            result = exchange => result,
        }
    }
}

/// Map a completed exchange onto the error taxonomy.
async fn handle_response(response: reqwest::Response) -> Result<serde_json::Value, GatewayError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()));
    }

    let code = status.as_u16();
    let fallback = format!(
        "HTTP {}: {}",
        code,
        status.canonical_reason().unwrap_or("Unknown Error")
    );
    let detail = match response.text().await {
        Ok(body) => extract_detail(&body).unwrap_or(fallback),
        Err(_) => fallback,
    };

    Err(GatewayError::Http {
        status: code,
        detail,
    })
}

/// The backend wraps errors as `{"detail": "..."}` (FastAPI shape);
/// validation failures put an array of objects there instead.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        v @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => Some(v.to_string()),
        _ => None,
    }
}
