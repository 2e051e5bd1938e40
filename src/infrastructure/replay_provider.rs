// Location provider that replays a recorded track
use crate::application::error::SubscriptionError;
use crate::application::location_provider::{LocationProvider, LocationRequest, SubscriptionHandle};
use crate::domain::target::{Coordinate, ObserverFix};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};

/// One recorded position. Points without a timestamp are stamped on replay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TrackPoint {
    fn to_fix(&self) -> ObserverFix {
        ObserverFix::new(
            Coordinate::new(self.latitude, self.longitude),
            self.timestamp.unwrap_or_else(Utc::now),
        )
    }
}

pub struct ReplayLocationProvider {
    track: Arc<Vec<TrackPoint>>,
    repeat: bool,
    connected: AtomicBool,
    next_handle: AtomicU64,
    tasks: Mutex<HashMap<u64, JoinHandle<()>>>,
    last: Arc<Mutex<Option<ObserverFix>>>,
}

impl ReplayLocationProvider {
    pub fn new(track: Vec<TrackPoint>, repeat: bool) -> Self {
        Self {
            track: Arc::new(track),
            repeat,
            connected: AtomicBool::new(false),
            next_handle: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Load a JSON array of track points
    pub fn from_file(path: &Path, repeat: bool) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read track file {}", path.display()))?;
        let track: Vec<TrackPoint> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse track file {}", path.display()))?;

        tracing::info!("Loaded {} track points from {}", track.len(), path.display());
        Ok(Self::new(track, repeat))
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<u64, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn replay(
    track: Arc<Vec<TrackPoint>>,
    interval: Duration,
    repeat: bool,
) -> impl Stream<Item = ObserverFix> {
    async_stream::stream! {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        loop {
            for point in track.iter() {
                ticker.tick().await;
                yield point.to_fix();
            }
            if !repeat {
                break;
            }
        }
    }
}

#[async_trait]
impl LocationProvider for ReplayLocationProvider {
    async fn connect(&self) -> Result<(), SubscriptionError> {
        if self.track.is_empty() {
            return Err(SubscriptionError::ProviderUnavailable(
                "track has no points".to_string(),
            ));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        for (_, task) in self.tasks().drain() {
            task.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn last_location(&self) -> Option<ObserverFix> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn request_updates(
        &self,
        request: LocationRequest,
        sender: mpsc::Sender<ObserverFix>,
    ) -> Result<SubscriptionHandle, SubscriptionError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SubscriptionError::ProviderUnavailable(
                "not connected".to_string(),
            ));
        }

        let stream = replay(self.track.clone(), request.interval, self.repeat);
        let last = self.last.clone();
        let task = tokio::spawn(async move {
            tokio::pin!(stream);
            while let Some(fix) = stream.next().await {
                *last.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(fix.clone());
                if sender.send(fix).await.is_err() {
                    break;
                }
            }
            tracing::debug!("Track replay finished");
        });

        let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.tasks().insert(id, task);
        Ok(SubscriptionHandle(id))
    }

    async fn remove_updates(&self, handle: SubscriptionHandle) {
        if let Some(task) = self.tasks().remove(&handle.0) {
            task.abort();
        }
    }
}
