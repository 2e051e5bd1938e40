// Application state driven by the host lifecycle
use crate::application::error::SubscriptionError;
use crate::application::proximity_service::ProximityService;
use crate::application::subscription::LocationSubscription;
use std::sync::Arc;

pub struct AppState {
    pub proximity_service: Arc<ProximityService>,
    pub subscription: LocationSubscription,
}

impl AppState {
    /// Host came to the foreground: resume location updates.
    pub async fn resume(&self) -> Result<(), SubscriptionError> {
        match self.subscription.start().await {
            Ok(()) => Ok(()),
            Err(SubscriptionError::PermissionDenied) => {
                tracing::warn!("Location permission missing; grant fine_location or coarse_location");
                Err(SubscriptionError::PermissionDenied)
            }
            Err(e) => {
                tracing::warn!("Could not start location updates: {}", e);
                Err(e)
            }
        }
    }

    /// Host left the foreground: stop updates and store the target.
    pub async fn pause(&self) {
        self.subscription.stop().await;
        if let Err(e) = self.proximity_service.persist().await {
            tracing::warn!("Failed to store target: {}", e);
        }
    }

    pub async fn shutdown(&self) {
        self.pause().await;
        self.subscription.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::location_provider::{LocationRequest, PermissionKind};
    use crate::application::proximity_service::tests::RecordingObserver;
    use crate::application::target_store::tests::MemoryPreferences;
    use crate::application::target_store::{PreferencesTargetStore, TargetStore};
    use crate::application::subscription::ConnectionState;
    use crate::domain::proximity::AlertMode;
    use crate::domain::target::{Coordinate, Target};
    use crate::infrastructure::permissions::GrantedPermissions;
    use crate::infrastructure::replay_provider::{ReplayLocationProvider, TrackPoint};

    fn app(granted: Vec<PermissionKind>) -> (AppState, Arc<PreferencesTargetStore>) {
        let store = Arc::new(PreferencesTargetStore::new(Arc::new(MemoryPreferences::default())));
        let service = Arc::new(ProximityService::new(
            store.clone(),
            AlertMode::Level,
            Arc::new(RecordingObserver::default()),
        ));
        let provider = Arc::new(ReplayLocationProvider::new(
            vec![TrackPoint {
                latitude: 39.2557,
                longitude: -76.7112,
                timestamp: None,
            }],
            true,
        ));
        let subscription = LocationSubscription::new(
            provider,
            Arc::new(GrantedPermissions::new(granted)),
            service.clone(),
            LocationRequest::default(),
        );
        (
            AppState {
                proximity_service: service,
                subscription,
            },
            store,
        )
    }

    #[tokio::test]
    async fn test_resume_pause_cycle() {
        let (app, store) = app(vec![PermissionKind::FineLocation]);
        let umbc = Target::named(Coordinate::new(39.2557, -76.7112), "UMBC");
        app.proximity_service.select_target(umbc.clone()).await.unwrap();

        app.resume().await.unwrap();
        assert!(app.subscription.is_subscribed().await);

        app.pause().await;
        assert!(!app.subscription.is_subscribed().await);
        assert_eq!(store.load().await.unwrap(), Some(umbc));

        app.resume().await.unwrap();
        app.shutdown().await;
        assert_eq!(
            app.subscription.connection_state().await,
            ConnectionState::Disconnected
        );
    }

    #[tokio::test]
    async fn test_resume_without_permission() {
        let (app, _) = app(vec![]);
        assert_eq!(app.resume().await, Err(SubscriptionError::PermissionDenied));
        assert!(!app.subscription.is_subscribed().await);
    }
}
