// Traits for the platform collaborators: location, permissions, place picking
use crate::application::error::{SelectionError, SubscriptionError};
use crate::domain::target::{ObserverFix, Target};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// Desired update interval. Inexact; updates may come slower or faster.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(10_000);

/// Fastest update interval. Fixes are never delivered more often than this.
pub const FASTEST_UPDATE_INTERVAL: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub interval: Duration,
    pub fastest_interval: Duration,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            interval: UPDATE_INTERVAL,
            fastest_interval: FASTEST_UPDATE_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    FineLocation,
    CoarseLocation,
}

pub trait PermissionChecker: Send + Sync {
    fn has_permission(&self, kind: PermissionKind) -> bool;
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Connect to the location service
    async fn connect(&self) -> Result<(), SubscriptionError>;

    async fn disconnect(&self);

    /// Most recent location the provider knows of, if any
    async fn last_location(&self) -> Option<ObserverFix>;

    /// Start delivering fixes into `sender` until `remove_updates` is called
    async fn request_updates(
        &self,
        request: LocationRequest,
        sender: mpsc::Sender<ObserverFix>,
    ) -> Result<SubscriptionHandle, SubscriptionError>;

    async fn remove_updates(&self, handle: SubscriptionHandle);
}

#[async_trait]
pub trait PlacePicker: Send + Sync {
    /// Let the user choose a target; `SelectionError::Cancelled` if they decline
    async fn pick_place(&self) -> Result<Target, SelectionError>;
}

/// Consumer of delivered fixes.
pub trait FixSink: Send + Sync {
    fn on_fix(&self, fix: ObserverFix);

    /// Provider's last known location, reported once when updates start
    fn on_last_known(&self, _fix: &ObserverFix) {}
}
