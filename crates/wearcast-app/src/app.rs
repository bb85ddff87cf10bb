//! Application facade.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use wearcast_client::{
    GatewayError, RecommendationApi, RequestGateway, ScoreClient, SettingsApi, SettingsClient,
};
use wearcast_core::Config;
use wearcast_location::{
    CityEntry, Coordinate, GeoAcquirer, IpLookupProvider, LocationSourceRegistry, SavedLocation,
    Selection,
};

use crate::orchestrator::Orchestrator;
use crate::quick_access::QuickAccessSync;
use crate::state::{LocationEvent, ViewState};

/// Everything a frontend talks to: the location source registry, the
/// request orchestrator, geolocation, and quick-access sync, wired
/// together. Each user gesture maps to one method.
pub struct App {
    registry: Mutex<LocationSourceRegistry>,
    orchestrator: Orchestrator,
    acquirer: GeoAcquirer,
    quick_access: Arc<QuickAccessSync>,
}

impl App {
    /// Wire the full HTTP stack from configuration.
    pub fn from_config(config: &Config) -> Arc<Self> {
        let timeout = Duration::from_millis(config.backend.request_timeout_ms);
        let recommendations =
            ScoreClient::new(RequestGateway::new(&config.backend.base_url, timeout));
        let settings = SettingsClient::new(RequestGateway::new(&config.backend.base_url, timeout));
        let provider = Arc::new(IpLookupProvider::new(
            &config.geolocation.lookup_url,
            Duration::from_millis(config.geolocation.timeout_ms),
        ));
        let acquirer = GeoAcquirer::from_config(provider, &config.geolocation, &config.geocoding);
        Self::new(Arc::new(recommendations), Arc::new(settings), acquirer)
    }

    /// Wire from parts; tests inject fakes here.
    pub fn new(
        recommendations: Arc<dyn RecommendationApi>,
        settings: Arc<dyn SettingsApi>,
        acquirer: GeoAcquirer,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(LocationSourceRegistry::new()),
            orchestrator: Orchestrator::new(recommendations),
            acquirer,
            quick_access: Arc::new(QuickAccessSync::new(settings)),
        })
    }

    pub fn view(&self) -> ViewState {
        self.orchestrator.view()
    }

    pub fn selection(&self) -> Selection {
        self.registry.lock().selection()
    }

    /// Current coordinate form fields, as the registry tracks them.
    pub fn field_values(&self) -> (Option<f64>, Option<f64>) {
        let registry = self.registry.lock();
        (registry.latitude_field(), registry.longitude_field())
    }

    pub fn cities(&self) -> Vec<CityEntry> {
        self.registry.lock().cities().to_vec()
    }

    pub fn quick_access(&self) -> Vec<SavedLocation> {
        self.registry.lock().quick_access().to_vec()
    }

    /// Pick a preset city. Returns false when the index is out of range.
    pub fn pick_city(&self, index: usize) -> bool {
        let activated = {
            let mut registry = self.registry.lock();
            registry
                .activate_city(index)
                .map(|coordinate| (coordinate, registry.label().map(str::to_string)))
        };
        match activated {
            Some((coordinate, label)) => {
                self.submit_event(coordinate, label);
                true
            }
            None => {
                tracing::warn!(index, "City pick out of range");
                false
            }
        }
    }

    /// Pick a saved quick-access location. Returns false when the index
    /// is out of range or the entry's coordinates are invalid.
    pub fn pick_quick_access(&self, index: usize) -> bool {
        let activated = {
            let mut registry = self.registry.lock();
            registry
                .activate_quick_access(index)
                .map(|coordinate| (coordinate, registry.label().map(str::to_string)))
        };
        match activated {
            Some((coordinate, label)) => {
                self.submit_event(coordinate, label);
                true
            }
            None => {
                tracing::warn!(index, "Quick access pick rejected");
                false
            }
        }
    }

    /// Apply a latitude field edit. Fires a request when both fields
    /// resolve to a valid coordinate.
    pub fn edit_latitude(&self, input: &str) {
        let resolved = self.registry.lock().edit_latitude(input);
        if let Some(coordinate) = resolved {
            self.submit_event(coordinate, None);
        }
    }

    /// Apply a longitude field edit; same firing rule as latitude.
    pub fn edit_longitude(&self, input: &str) {
        let resolved = self.registry.lock().edit_longitude(input);
        if let Some(coordinate) = resolved {
            self.submit_event(coordinate, None);
        }
    }

    /// Resolve the device position and drive a request from it. The
    /// label is best-effort; a failed acquisition leaves manual entry
    /// untouched and reports through the view's location slot.
    pub async fn use_my_location(&self) -> bool {
        self.orchestrator.begin_locating();
        match self.acquirer.acquire().await {
            Ok(fix) => {
                self.registry.lock().activate_gps(&fix);
                self.orchestrator.finish_locating(None);
                self.orchestrator.submit(LocationEvent::from_fix(&fix));
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Geolocation failed");
                self.orchestrator.finish_locating(Some(err.to_string()));
                false
            }
        }
    }

    pub fn set_comfort_input(&self, raw: &str) {
        self.orchestrator.set_comfort_input(raw);
    }

    /// Re-run the last request; the manual retry path.
    pub fn refresh(&self) {
        self.orchestrator.refresh();
    }

    /// Pull the user's settings: quick-access locations plus their
    /// stored comfort temperature when one is present.
    pub async fn sync_quick_access(&self, user_id: &str) -> Result<(), GatewayError> {
        let settings = self.quick_access.refresh(user_id).await?;
        self.registry
            .lock()
            .set_quick_access(self.quick_access.locations());
        if settings.comfort_temperature.is_some() {
            self.orchestrator.set_comfort(settings.comfort_temperature);
        }
        Ok(())
    }

    /// Drop quick-access entries, demoting a quick-access selection to
    /// manual. Invoked on logout; the comfort field stays as typed.
    pub fn clear_quick_access(&self) {
        self.quick_access.clear();
        self.registry.lock().set_quick_access(Vec::new());
    }

    /// Follow an identity signal: sync on every login, clear on logout.
    /// The task ends when the sender side is dropped.
    pub fn watch_identity(
        self: Arc<Self>,
        mut identity: watch::Receiver<Option<String>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let user = identity.borrow_and_update().clone();
                match user {
                    Some(user_id) => {
                        if let Err(err) = self.sync_quick_access(&user_id).await {
                            tracing::warn!(error = %err, "Quick access sync failed");
                        }
                    }
                    None => self.clear_quick_access(),
                }
                if identity.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn submit_event(&self, coordinate: Coordinate, label: Option<String>) {
        let event = match label {
            Some(label) => LocationEvent::labeled(coordinate, label),
            None => LocationEvent::plain(coordinate),
        };
        self.orchestrator.submit(event);
    }
}
