// Proximity service - Use cases for choosing a target and evaluating fixes
use crate::application::error::{SelectionError, StoreError};
use crate::application::location_provider::{FixSink, PlacePicker};
use crate::application::target_store::TargetStore;
use crate::domain::proximity::{
    AlertEvent, AlertMode, FixOutcome, MonitorPhase, ProximityMonitor, TargetGeneration,
};
use crate::domain::target::{ObserverFix, Target};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;

/// Output side of the monitor: marker rendering, position text, notifications.
pub trait ProximityObserver: Send + Sync {
    fn on_target_selected(&self, _target: &Target) {}

    fn on_target_restored(&self, _target: &Target) {}

    fn on_position(&self, _fix: &ObserverFix) {}

    fn on_alert(&self, event: &AlertEvent);
}

pub struct ProximityService {
    monitor: Mutex<ProximityMonitor>,
    // held across a target change and its save, so the store ends on the last choice
    selection: AsyncMutex<()>,
    store: Arc<dyn TargetStore>,
    observer: Arc<dyn ProximityObserver>,
}

impl ProximityService {
    pub fn new(
        store: Arc<dyn TargetStore>,
        mode: AlertMode,
        observer: Arc<dyn ProximityObserver>,
    ) -> Self {
        Self {
            monitor: Mutex::new(ProximityMonitor::new(mode)),
            selection: AsyncMutex::new(()),
            store,
            observer,
        }
    }

    fn monitor(&self) -> MutexGuard<'_, ProximityMonitor> {
        self.monitor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn target(&self) -> Option<Target> {
        self.monitor().target().cloned()
    }

    pub fn phase(&self) -> MonitorPhase {
        self.monitor().phase()
    }

    pub fn generation(&self) -> TargetGeneration {
        self.monitor().generation()
    }

    /// Re-arm with the stored target after a restart. Does not alert.
    pub async fn restore(&self) -> Result<Option<Target>, StoreError> {
        let _selection = self.selection.lock().await;
        let Some(target) = self.store.load().await? else {
            tracing::info!("No stored target to restore");
            return Ok(None);
        };

        self.monitor().set_target(target.clone());
        tracing::info!("Restored target {}", target.display_name());
        self.observer.on_target_restored(&target);
        Ok(Some(target))
    }

    /// Make `target` the monitored point and persist it.
    ///
    /// The monitor is re-armed even when persisting fails; the store error is
    /// still returned so the host can report it. Concurrent selections are
    /// applied one at a time, so the stored target is always the monitored one.
    pub async fn select_target(&self, target: Target) -> Result<TargetGeneration, SelectionError> {
        if !target.coordinate.is_valid() {
            return Err(SelectionError::InvalidCoordinate {
                latitude: target.coordinate.latitude,
                longitude: target.coordinate.longitude,
            });
        }

        let _selection = self.selection.lock().await;
        let generation = self.monitor().set_target(target.clone());
        tracing::info!("Place: {}", target.display_name());
        self.observer.on_target_selected(&target);

        if let Err(e) = self.store.save(&target).await {
            tracing::warn!("Failed to persist target {}: {}", target.display_name(), e);
            return Err(e.into());
        }
        Ok(generation)
    }

    /// Ask `picker` for a target; a cancelled pick leaves the monitor untouched.
    pub async fn choose_target(
        &self,
        picker: &dyn PlacePicker,
    ) -> Result<TargetGeneration, SelectionError> {
        match picker.pick_place().await {
            Ok(target) => self.select_target(target).await,
            Err(SelectionError::Cancelled) => {
                tracing::info!("Place selection cancelled, keeping current target");
                Err(SelectionError::Cancelled)
            }
            Err(e) => Err(e),
        }
    }

    /// Resume the stored target, or ask `picker` when nothing was stored.
    pub async fn restore_or_choose(
        &self,
        picker: &dyn PlacePicker,
    ) -> Result<Option<Target>, SelectionError> {
        match self.restore().await {
            Ok(Some(target)) => return Ok(Some(target)),
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not restore target: {}", e),
        }

        match self.choose_target(picker).await {
            Ok(_) => Ok(self.target()),
            Err(SelectionError::Cancelled) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write the current target back to the store, if there is one.
    pub async fn persist(&self) -> Result<(), StoreError> {
        let _selection = self.selection.lock().await;
        match self.target() {
            Some(target) => self.store.save(&target).await,
            None => Ok(()),
        }
    }

    pub fn evaluate(&self, fix: ObserverFix) -> FixOutcome {
        self.observer.on_position(&fix);
        let outcome = self.monitor().evaluate(fix);
        self.report(&outcome);
        outcome
    }

    /// Evaluate a fix captured while `generation` was the current target.
    pub fn evaluate_for(&self, generation: TargetGeneration, fix: ObserverFix) -> FixOutcome {
        self.observer.on_position(&fix);
        let outcome = self.monitor().evaluate_for(generation, fix);
        self.report(&outcome);
        outcome
    }

    fn report(&self, outcome: &FixOutcome) {
        match outcome {
            FixOutcome::Unarmed => tracing::debug!("No target set, ignoring fix"),
            FixOutcome::StaleTarget => tracing::debug!("Fix belongs to a replaced target, discarding"),
            FixOutcome::Evaluated {
                distance_meters,
                inside,
                alert,
            } => {
                tracing::debug!("Distance to target {:.1} m (inside: {})", distance_meters, inside);
                if let Some(event) = alert {
                    self.observer.on_alert(event);
                }
            }
        }
    }
}

impl FixSink for ProximityService {
    fn on_fix(&self, fix: ObserverFix) {
        self.evaluate(fix);
    }

    fn on_last_known(&self, fix: &ObserverFix) {
        self.observer.on_position(fix);
    }
}
