//! View state published by the orchestrator.

use thiserror::Error;

use wearcast_client::{GatewayError, Recommendation};
use wearcast_location::{AcquiredFix, Coordinate};

/// One location-changing event: GPS success, city pick, quick-access
/// click, or a manual edit that resolved both fields.
#[derive(Debug, Clone)]
pub struct LocationEvent {
    pub coordinate: Coordinate,
    pub label: Option<String>,
}

impl LocationEvent {
    /// An unlabeled event, as produced by manual coordinate entry.
    pub fn plain(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            label: None,
        }
    }

    pub fn labeled(coordinate: Coordinate, label: impl Into<String>) -> Self {
        Self {
            coordinate,
            label: Some(label.into()),
        }
    }

    pub fn from_fix(fix: &AcquiredFix) -> Self {
        Self::labeled(fix.coordinate, fix.label.clone())
    }
}

/// Broad class of a failed fetch, machine-checkable for display decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Unreachable,
    Http(u16),
    Malformed,
}

/// A fetch failure as the view sees it: a kind plus human-readable text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchFailure {
    /// Classify a gateway error for publication. `Cancelled` is
    /// supersession fallout and yields `None`; it never reaches the view.
    pub fn from_gateway(err: &GatewayError) -> Option<Self> {
        let kind = match err {
            GatewayError::Timeout => FailureKind::Timeout,
            GatewayError::Cancelled => return None,
            GatewayError::Unreachable { .. } => FailureKind::Unreachable,
            GatewayError::Http { status, .. } => FailureKind::Http(*status),
            GatewayError::Malformed(_) => FailureKind::Malformed,
        };
        Some(Self {
            kind,
            message: err.user_message(),
        })
    }
}

/// Snapshot of everything a frontend needs to render.
///
/// Geolocation and the recommendation fetch get independent
/// loading/error slots; a geolocation failure does not disturb the last
/// good recommendation and vice versa.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Label of the place driving the current request, when one exists.
    pub place_label: Option<String>,
    /// Coordinate of the most recently submitted request.
    pub coordinate: Option<(f64, f64)>,
    pub locating: bool,
    pub location_error: Option<String>,
    pub fetching: bool,
    pub fetch_error: Option<FetchFailure>,
    pub recommendation: Option<Recommendation>,
}
