//! Single-flight recommendation requests.
//!
//! Every location-changing event submits exactly one request and cancels
//! whatever was outstanding, so at most one exchange is in flight at any
//! instant. Completions carry the sequence number they were issued with
//! and are applied only while still current; a superseded result is
//! discarded no matter when it arrives.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use wearcast_client::{GatewayError, Recommendation, RecommendationApi, ScoreRequest};

use crate::profile::ComfortProfile;
use crate::state::{FetchFailure, LocationEvent, ViewState};

struct ActiveRequest {
    token: CancellationToken,
    seq: u64,
}

#[derive(Default)]
struct ActiveSlot {
    current: Option<ActiveRequest>,
    next_seq: u64,
}

struct Inner {
    api: Arc<dyn RecommendationApi>,
    view: RwLock<ViewState>,
    profile: RwLock<ComfortProfile>,
    active: Mutex<ActiveSlot>,
    last_event: Mutex<Option<LocationEvent>>,
}

/// Cloneable handle to the request state machine. All clones share one
/// view, one comfort profile, and one active-request slot.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(api: Arc<dyn RecommendationApi>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                view: RwLock::new(ViewState::default()),
                profile: RwLock::new(ComfortProfile::default()),
                active: Mutex::new(ActiveSlot::default()),
                last_event: Mutex::new(None),
            }),
        }
    }

    /// Snapshot of the published view.
    pub fn view(&self) -> ViewState {
        self.inner.view.read().clone()
    }

    pub fn comfort_temperature_f(&self) -> Option<f64> {
        self.inner.profile.read().comfort_temperature_f()
    }

    /// Interpret the comfort text field. Takes effect on the next
    /// request; changing it never re-fires one by itself.
    pub fn set_comfort_input(&self, raw: &str) {
        self.inner.profile.write().set_from_input(raw);
    }

    /// Apply a stored comfort value, e.g. from the settings document.
    pub fn set_comfort(&self, value: Option<f64>) {
        self.inner.profile.write().set(value);
    }

    /// Submit a scoring request for `event`, superseding any outstanding
    /// one. The request is built from the event and the profile as they
    /// are right now; later edits cannot touch it.
    pub fn submit(&self, event: LocationEvent) {
        let token = CancellationToken::new();
        let request = ScoreRequest::new(event.coordinate, self.comfort_temperature_f());

        // The slot mutex stays held across the view write so the token
        // handoff and the published state always move together; a racing
        // completion cannot slip its result in between. Lock order is
        // active -> view everywhere.
        let seq = {
            let mut slot = self.inner.active.lock();
            if let Some(previous) = slot.current.take() {
                tracing::debug!(seq = previous.seq, "Superseding in-flight request");
                previous.token.cancel();
            }
            let seq = slot.next_seq;
            slot.next_seq += 1;
            slot.current = Some(ActiveRequest {
                token: token.clone(),
                seq,
            });

            let mut view = self.inner.view.write();
            view.fetching = true;
            view.fetch_error = None;
            view.place_label = event.label.clone();
            view.coordinate = Some((event.coordinate.latitude(), event.coordinate.longitude()));
            *self.inner.last_event.lock() = Some(event);
            seq
        };

        tracing::info!(
            seq,
            latitude = request.latitude,
            longitude = request.longitude,
            "Requesting recommendation"
        );
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.api.score(&request, &token).await;
            inner.complete(seq, result);
        });
    }

    /// Re-issue the last submitted event. This is the only retry path; a
    /// failed request never re-fires on its own.
    pub fn refresh(&self) {
        let event = self.inner.last_event.lock().clone();
        match event {
            Some(event) => self.submit(event),
            None => tracing::debug!("Refresh with no prior location event"),
        }
    }

    /// Cancel the outstanding request, if any, without replacing it.
    pub fn cancel_active(&self) {
        let mut slot = self.inner.active.lock();
        if let Some(active) = slot.current.take() {
            tracing::debug!(seq = active.seq, "Cancelling active request");
            active.token.cancel();
            self.inner.view.write().fetching = false;
        }
    }

    pub(crate) fn begin_locating(&self) {
        let mut view = self.inner.view.write();
        view.locating = true;
        view.location_error = None;
    }

    pub(crate) fn finish_locating(&self, error: Option<String>) {
        let mut view = self.inner.view.write();
        view.locating = false;
        view.location_error = error;
    }
}

impl Inner {
    /// Apply a completion if `seq` is still the active request.
    ///
    /// The slot mutex is held through the view write: the seq check and
    /// the publication are one atomic step, so a `submit` racing in
    /// cannot observe a half-applied completion.
    fn complete(&self, seq: u64, result: Result<Recommendation, GatewayError>) {
        let mut slot = self.active.lock();
        match slot.current {
            Some(ref active) if active.seq == seq => slot.current = None,
            _ => {
                tracing::debug!(seq, "Discarding superseded completion");
                return;
            }
        }

        let mut view = self.view.write();
        view.fetching = false;
        match result {
            Ok(recommendation) => {
                tracing::info!(
                    seq,
                    score = recommendation.comfort_score,
                    "Recommendation applied"
                );
                view.fetch_error = None;
                view.recommendation = Some(recommendation);
            }
            Err(err) => {
                // Cancelled classifies to None and stays internal.
                if let Some(failure) = FetchFailure::from_gateway(&err) {
                    tracing::warn!(seq, error = %err, "Recommendation request failed");
                    view.fetch_error = Some(failure);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::state::FailureKind;
    use wearcast_client::WeatherSnapshot;
    use wearcast_location::Coordinate;

    fn event(latitude: f64, longitude: f64) -> LocationEvent {
        LocationEvent::plain(Coordinate::new(latitude, longitude).unwrap())
    }

    /// The comfort score echoes the request latitude so tests can tell
    /// which request produced a given recommendation.
    fn recommendation_for(request: &ScoreRequest) -> Recommendation {
        Recommendation {
            weather: WeatherSnapshot {
                temp_f: 60.0,
                wind_mph: 5.0,
                short_forecast: "Clear".to_string(),
                location: String::new(),
                period_start: String::new(),
                source: String::new(),
            },
            comfort_score: request.latitude,
            score_breakdown: None,
            clothing_recommendations: Vec::new(),
            location: None,
        }
    }

    struct FakeApi {
        delay_for: Box<dyn Fn(&ScoreRequest) -> Duration + Send + Sync>,
        calls: Mutex<Vec<ScoreRequest>>,
        in_flight: Mutex<HashMap<u64, CancellationToken>>,
        next_id: AtomicU64,
        overlaps: AtomicUsize,
    }

    impl FakeApi {
        fn instant() -> Arc<Self> {
            Self::with_delays(|_| Duration::ZERO)
        }

        fn with_delays(
            delay_for: impl Fn(&ScoreRequest) -> Duration + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                delay_for: Box::new(delay_for),
                calls: Mutex::new(Vec::new()),
                in_flight: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                overlaps: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> Vec<ScoreRequest> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl RecommendationApi for FakeApi {
        async fn score(
            &self,
            request: &ScoreRequest,
            cancel: &CancellationToken,
        ) -> Result<Recommendation, GatewayError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            {
                // A second live (uncancelled) exchange entering while
                // another is live breaks the single-flight guarantee.
                let mut in_flight = self.in_flight.lock();
                if !cancel.is_cancelled() {
                    let live = in_flight.values().filter(|t| !t.is_cancelled()).count();
                    self.overlaps.fetch_add(live, Ordering::SeqCst);
                }
                in_flight.insert(id, cancel.clone());
            }
            self.calls.lock().push(request.clone());

            let delay = (self.delay_for)(request);
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(GatewayError::Cancelled),
                _ = tokio::time::sleep(delay) => Ok(recommendation_for(request)),
            };
            self.in_flight.lock().remove(&id);
            result
        }
    }

    /// Ignores the cancellation token entirely: a superseded call still
    /// runs to completion and hands back an `Ok`, which the seq guard
    /// alone must discard.
    struct UncancellableApi {
        delay_for: Box<dyn Fn(&ScoreRequest) -> Duration + Send + Sync>,
    }

    impl UncancellableApi {
        fn with_delays(
            delay_for: impl Fn(&ScoreRequest) -> Duration + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                delay_for: Box::new(delay_for),
            })
        }
    }

    #[async_trait]
    impl RecommendationApi for UncancellableApi {
        async fn score(
            &self,
            request: &ScoreRequest,
            _cancel: &CancellationToken,
        ) -> Result<Recommendation, GatewayError> {
            tokio::time::sleep((self.delay_for)(request)).await;
            Ok(recommendation_for(request))
        }
    }

    struct FailingApi {
        error: GatewayError,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RecommendationApi for FailingApi {
        async fn score(
            &self,
            _request: &ScoreRequest,
            _cancel: &CancellationToken,
        ) -> Result<Recommendation, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    async fn settled(orchestrator: &Orchestrator) -> ViewState {
        for _ in 0..1000 {
            let view = orchestrator.view();
            if !view.fetching {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("orchestrator never settled");
    }

    #[tokio::test]
    async fn test_submit_publishes_recommendation() {
        let api = FakeApi::instant();
        let orchestrator = Orchestrator::new(api.clone());

        orchestrator.submit(LocationEvent::labeled(
            Coordinate::new(47.6062, -122.3321).unwrap(),
            "Seattle",
        ));
        let view = settled(&orchestrator).await;

        assert_eq!(view.recommendation.unwrap().comfort_score, 47.6062);
        assert_eq!(view.place_label.as_deref(), Some("Seattle"));
        assert_eq!(view.coordinate, Some((47.6062, -122.3321)));
        assert!(view.fetch_error.is_none());
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_supersession_applies_latest() {
        let api = FakeApi::with_delays(|request| {
            if request.latitude == 40.0 {
                Duration::from_millis(80)
            } else {
                Duration::from_millis(1)
            }
        });
        let orchestrator = Orchestrator::new(api.clone());

        orchestrator.submit(event(40.0, -74.0));
        tokio::time::sleep(Duration::from_millis(5)).await;
        orchestrator.submit(event(41.0, -75.0));
        let view = settled(&orchestrator).await;

        // Let the superseded exchange drain before inspecting.
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(view.recommendation.unwrap().comfort_score, 41.0);
        assert!(view.fetch_error.is_none());
        let final_view = orchestrator.view();
        assert_eq!(final_view.recommendation.unwrap().comfort_score, 41.0);
        assert!(final_view.fetch_error.is_none());

        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].latitude, 41.0);
        assert_eq!(api.overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_latency_grid_applies_last_event() {
        let grids: [[u64; 3]; 6] = [
            [0, 15, 40],
            [0, 40, 15],
            [15, 0, 40],
            [15, 40, 0],
            [40, 0, 15],
            [40, 15, 0],
        ];

        for grid in grids {
            let api = FakeApi::with_delays(move |request| {
                let index = (request.latitude / 10.0) as usize - 1;
                Duration::from_millis(grid[index])
            });
            let orchestrator = Orchestrator::new(api.clone());

            for latitude in [10.0, 20.0, 30.0] {
                orchestrator.submit(event(latitude, 5.0));
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            settled(&orchestrator).await;
            tokio::time::sleep(Duration::from_millis(60)).await;

            let view = orchestrator.view();
            assert_eq!(
                view.recommendation.unwrap().comfort_score,
                30.0,
                "grid {:?} applied the wrong result",
                grid
            );
            assert!(view.fetch_error.is_none(), "grid {:?} published an error", grid);
            assert_eq!(
                api.overlaps.load(Ordering::SeqCst),
                0,
                "grid {:?} overlapped live requests",
                grid
            );
        }
    }

    #[tokio::test]
    async fn test_late_ok_for_superseded_request_is_discarded() {
        // The backend keeps processing after cancellation and delivers a
        // successful result late; only the seq guard stands between it
        // and the view.
        let api = UncancellableApi::with_delays(|request| {
            if request.latitude == 40.0 {
                Duration::from_millis(80)
            } else {
                Duration::from_millis(5)
            }
        });
        let orchestrator = Orchestrator::new(api);

        orchestrator.submit(event(40.0, -74.0));
        tokio::time::sleep(Duration::from_millis(10)).await;
        orchestrator.submit(event(41.0, -75.0));
        settled(&orchestrator).await;

        // Request 40's Ok lands around the 80 ms mark; give it room.
        tokio::time::sleep(Duration::from_millis(150)).await;

        let view = orchestrator.view();
        assert_eq!(view.recommendation.unwrap().comfort_score, 41.0);
        assert!(view.fetch_error.is_none());
        assert!(!view.fetching);
    }

    #[tokio::test]
    async fn test_late_completion_never_settles_a_newer_request() {
        // A superseded request finishes while its successor is still in
        // flight; the view must keep reading as fetching with no stale
        // result until the successor lands.
        let api = UncancellableApi::with_delays(|request| {
            if request.latitude == 40.0 {
                Duration::from_millis(30)
            } else {
                Duration::from_millis(150)
            }
        });
        let orchestrator = Orchestrator::new(api);

        orchestrator.submit(event(40.0, -74.0));
        tokio::time::sleep(Duration::from_millis(5)).await;
        orchestrator.submit(event(41.0, -75.0));

        // Well past request 40's completion, well before request 41's.
        tokio::time::sleep(Duration::from_millis(70)).await;
        let view = orchestrator.view();
        assert!(view.fetching, "late completion marked the view settled");
        assert!(view.recommendation.is_none());
        assert_eq!(view.coordinate, Some((41.0, -75.0)));

        let view = settled(&orchestrator).await;
        assert_eq!(view.recommendation.unwrap().comfort_score, 41.0);
    }

    #[tokio::test]
    async fn test_failure_published_and_no_auto_retry() {
        let api = Arc::new(FailingApi {
            error: GatewayError::Http {
                status: 503,
                detail: "Service Unavailable".to_string(),
            },
            calls: AtomicUsize::new(0),
        });
        let orchestrator = Orchestrator::new(api.clone());

        orchestrator.submit(event(40.0, -74.0));
        let view = settled(&orchestrator).await;

        let failure = view.fetch_error.unwrap();
        assert_eq!(failure.kind, FailureKind::Http(503));
        assert_eq!(failure.message, "Service Unavailable");
        assert!(view.recommendation.is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);

        orchestrator.refresh();
        settled(&orchestrator).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_without_prior_event_is_noop() {
        let api = FakeApi::instant();
        let orchestrator = Orchestrator::new(api.clone());

        orchestrator.refresh();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(api.calls().is_empty());
        assert!(!orchestrator.view().fetching);
    }

    #[tokio::test]
    async fn test_cancel_active_never_publishes() {
        let api = FakeApi::with_delays(|_| Duration::from_millis(200));
        let orchestrator = Orchestrator::new(api.clone());

        orchestrator.submit(event(40.0, -74.0));
        tokio::time::sleep(Duration::from_millis(10)).await;
        orchestrator.cancel_active();
        tokio::time::sleep(Duration::from_millis(250)).await;

        let view = orchestrator.view();
        assert!(!view.fetching);
        assert!(view.fetch_error.is_none());
        assert!(view.recommendation.is_none());
    }

    #[tokio::test]
    async fn test_comfort_built_fresh_per_request() {
        let api = FakeApi::instant();
        let orchestrator = Orchestrator::new(api.clone());

        orchestrator.set_comfort_input("68");
        orchestrator.submit(event(40.7128, -74.006));
        settled(&orchestrator).await;

        orchestrator.set_comfort_input("");
        orchestrator.refresh();
        settled(&orchestrator).await;

        let calls = api.calls();
        assert_eq!(calls[0].comfort_temperature, Some(68.0));
        assert_eq!(calls[1].comfort_temperature, None);
    }

    #[tokio::test]
    async fn test_locating_slots_are_independent() {
        let api = FakeApi::instant();
        let orchestrator = Orchestrator::new(api);

        orchestrator.begin_locating();
        let view = orchestrator.view();
        assert!(view.locating);
        assert!(view.location_error.is_none());

        orchestrator.finish_locating(Some("permission denied".to_string()));
        let view = orchestrator.view();
        assert!(!view.locating);
        assert_eq!(view.location_error.as_deref(), Some("permission denied"));
        assert!(view.fetch_error.is_none());

        orchestrator.begin_locating();
        assert!(orchestrator.view().location_error.is_none());
    }
}
