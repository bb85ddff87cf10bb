//! Gateway-specific error types.

use thiserror::Error;

/// Failures a gateway call can surface.
///
/// `Timeout` and `Cancelled` are deliberately separate variants: the
/// first comes from the request's own timer, the second from the caller
/// superseding the request, and the orchestrator treats them very
/// differently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Cannot reach {host}: {detail}")]
    Unreachable { host: String, detail: String },

    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout => "The request took too long. Try again in a moment.".to_string(),
            Self::Cancelled => "Request cancelled".to_string(),
            Self::Unreachable { host, .. } => {
                format!("Cannot reach the recommendation service at {}", host)
            }
            Self::Http { detail, .. } => detail.clone(),
            Self::Malformed(_) => "The service returned an unexpected response".to_string(),
        }
    }

    /// Whether this error is supersession fallout rather than a real
    /// failure. Cancelled results are discarded, never shown.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Map a transport-phase reqwest error onto the taxonomy.
///
/// `host` names the configured backend so a down server is diagnosable
/// from the message alone.
pub(crate) fn classify_transport(host: &str, err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Unreachable {
            host: host.to_string(),
            detail: err.to_string(),
        }
    }
}
