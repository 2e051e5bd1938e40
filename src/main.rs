// Main entry point - Dependency injection and lifecycle wiring
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::application::proximity_service::ProximityService;
use crate::application::subscription::LocationSubscription;
use crate::application::target_store::PreferencesTargetStore;
use crate::infrastructure::config::load_settings;
use crate::infrastructure::permissions::GrantedPermissions;
use crate::infrastructure::place_picker::ConfiguredPlacePicker;
use crate::infrastructure::preferences::FilePreferences;
use crate::infrastructure::replay_provider::ReplayLocationProvider;
use crate::presentation::app_state::AppState;
use crate::presentation::console::ConsoleObserver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = load_settings()?;

    // Create store and provider (infrastructure layer)
    let preferences = Arc::new(FilePreferences::new(&settings.store.path));
    tracing::info!("Using target store {}", preferences.path().display());
    let store = Arc::new(PreferencesTargetStore::new(preferences));
    let provider = Arc::new(ReplayLocationProvider::from_file(
        &settings.provider.track_file,
        settings.provider.repeat,
    )?);
    let permissions = Arc::new(GrantedPermissions::new(settings.permissions.granted.clone()));

    // Create services (application layer)
    let proximity_service = Arc::new(ProximityService::new(
        store,
        settings.alerts.mode,
        Arc::new(ConsoleObserver),
    ));
    let picker = ConfiguredPlacePicker::new(settings.target.clone());
    if let Err(e) = proximity_service.restore_or_choose(&picker).await {
        tracing::warn!("Target selection failed: {}", e);
    }

    let subscription = LocationSubscription::new(
        provider,
        permissions,
        proximity_service.clone(),
        settings.location.request(),
    );

    let state = AppState {
        proximity_service,
        subscription,
    };

    // Start monitoring
    println!(
        "Starting location-alert ({:?} alerts)",
        settings.alerts.mode
    );
    if let Err(e) = state.resume().await {
        tracing::debug!("Waiting for shutdown without location updates: {}", e);
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    state.shutdown().await;

    Ok(())
}
