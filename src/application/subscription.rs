// Location subscription - Permission-gated start/stop of the fix stream
use crate::application::error::SubscriptionError;
use crate::application::location_provider::{
    FixSink, LocationProvider, LocationRequest, PermissionChecker, PermissionKind,
    SubscriptionHandle,
};
use crate::domain::target::ObserverFix;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const FIX_CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct ActiveUpdates {
    handle: SubscriptionHandle,
    forwarder: JoinHandle<()>,
}

struct SubscriptionState {
    connection: ConnectionState,
    active: Option<ActiveUpdates>,
}

pub struct LocationSubscription {
    provider: Arc<dyn LocationProvider>,
    permissions: Arc<dyn PermissionChecker>,
    sink: Arc<dyn FixSink>,
    request: LocationRequest,
    state: Mutex<SubscriptionState>,
    // outlives each forwarder so a quick stop/start cannot beat the throttle
    last_delivery: Arc<StdMutex<Option<Instant>>>,
}

impl LocationSubscription {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        permissions: Arc<dyn PermissionChecker>,
        sink: Arc<dyn FixSink>,
        request: LocationRequest,
    ) -> Self {
        Self {
            provider,
            permissions,
            sink,
            request,
            state: Mutex::new(SubscriptionState {
                connection: ConnectionState::Disconnected,
                active: None,
            }),
            last_delivery: Arc::new(StdMutex::new(None)),
        }
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.state.lock().await.connection
    }

    pub async fn is_subscribed(&self) -> bool {
        self.state.lock().await.active.is_some()
    }

    pub async fn connect(&self) -> Result<(), SubscriptionError> {
        let mut state = self.state.lock().await;
        self.connect_locked(&mut state).await
    }

    async fn connect_locked(&self, state: &mut SubscriptionState) -> Result<(), SubscriptionError> {
        if state.connection == ConnectionState::Connected {
            return Ok(());
        }

        state.connection = ConnectionState::Connecting;
        match self.provider.connect().await {
            Ok(()) => {
                state.connection = ConnectionState::Connected;
                tracing::info!("Connected to location provider");
                Ok(())
            }
            Err(e) => {
                state.connection = ConnectionState::Disconnected;
                tracing::warn!("Connection failed: {}", e);
                Err(e)
            }
        }
    }

    fn permission_granted(&self) -> bool {
        self.permissions.has_permission(PermissionKind::FineLocation)
            || self.permissions.has_permission(PermissionKind::CoarseLocation)
    }

    /// Begin delivering fixes to the sink. Connects first when needed and
    /// does nothing if updates are already flowing.
    pub async fn start(&self) -> Result<(), SubscriptionError> {
        let mut state = self.state.lock().await;
        if state.active.is_some() {
            return Ok(());
        }

        self.connect_locked(&mut state).await?;

        if !self.permission_granted() {
            tracing::warn!("Location permission not granted, location updates not started");
            return Err(SubscriptionError::PermissionDenied);
        }

        if let Some(fix) = self.provider.last_location().await {
            tracing::info!("Last known location {}", fix.coordinate);
            self.sink.on_last_known(&fix);
        }

        let (tx, rx) = mpsc::channel(FIX_CHANNEL_CAPACITY);
        let handle = self.provider.request_updates(self.request, tx).await?;
        let forwarder = tokio::spawn(forward_fixes(
            rx,
            self.sink.clone(),
            self.request.fastest_interval,
            self.last_delivery.clone(),
        ));
        state.active = Some(ActiveUpdates { handle, forwarder });

        tracing::info!(
            "Location updates started (interval {:?}, fastest {:?})",
            self.request.interval,
            self.request.fastest_interval
        );
        Ok(())
    }

    /// Stop delivering fixes. Safe to call when nothing is subscribed.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await;
    }

    async fn stop_locked(&self, state: &mut SubscriptionState) {
        let Some(active) = state.active.take() else {
            return;
        };

        self.provider.remove_updates(active.handle).await;
        active.forwarder.abort();
        // wait out a delivery that was already running
        let _ = active.forwarder.await;
        tracing::info!("Location updates stopped");
    }

    /// Host callback once the user has answered the permission request.
    pub async fn on_permission_result(&self, granted: bool) -> Result<(), SubscriptionError> {
        if granted {
            self.start().await
        } else {
            tracing::warn!("Location permission refused");
            Err(SubscriptionError::PermissionDenied)
        }
    }

    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await;
        if state.connection != ConnectionState::Disconnected {
            self.provider.disconnect().await;
            state.connection = ConnectionState::Disconnected;
            tracing::info!("Disconnected from location provider");
        }
    }
}

async fn forward_fixes(
    mut rx: mpsc::Receiver<ObserverFix>,
    sink: Arc<dyn FixSink>,
    fastest_interval: Duration,
    last_delivery: Arc<StdMutex<Option<Instant>>>,
) {
    while let Some(fix) = rx.recv().await {
        let now = Instant::now();
        {
            let mut last_delivery = last_delivery
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(last) = *last_delivery {
                if now.duration_since(last) < fastest_interval {
                    tracing::debug!("Dropping fix received {:?} after the previous one", now - last);
                    continue;
                }
            }
            *last_delivery = Some(now);
        }
        sink.on_fix(fix);
    }
}
