// Repository traits for durable target storage
use crate::application::error::StoreError;
use crate::domain::target::{Coordinate, Target};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Single-slot durable storage of the current target.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Overwrite the stored target
    async fn save(&self, target: &Target) -> Result<(), StoreError>;

    /// Stored target, or `None` if nothing usable was ever saved
    async fn load(&self) -> Result<Option<Target>, StoreError>;
}

/// Value held in a preference slot
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceValue {
    Float(f64),
    Text(String),
}

/// Every preference as of a single read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceSnapshot {
    values: HashMap<String, PreferenceValue>,
}

impl PreferenceSnapshot {
    pub fn new(values: HashMap<String, PreferenceValue>) -> Self {
        Self { values }
    }

    pub fn get_f64(&self, key: &str) -> Result<Option<f64>, StoreError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(PreferenceValue::Float(value)) => Ok(Some(*value)),
            Some(PreferenceValue::Text(_)) => Err(StoreError::Format(format!(
                "{} should be a number, found a string",
                key
            ))),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(PreferenceValue::Text(value)) => Ok(Some(value.clone())),
            Some(PreferenceValue::Float(_)) => Err(StoreError::Format(format!(
                "{} should be a string, found a number",
                key
            ))),
        }
    }
}

/// Key-value preferences with an all-or-nothing multi-key commit.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// All keys from one read, so a concurrent commit is seen whole or not at all
    async fn snapshot(&self) -> Result<PreferenceSnapshot, StoreError>;

    /// Write every entry at once; a crash leaves either all or none applied
    async fn commit(&self, entries: Vec<(String, PreferenceValue)>) -> Result<(), StoreError>;
}

const LATITUDE_KEY: &str = "Lat";
const LONGITUDE_KEY: &str = "Lng";
const NAME_KEY: &str = "Name";

/// `TargetStore` backed by preference slots for latitude, longitude and name.
///
/// A stored coordinate with a zero latitude or longitude reads back as "no
/// target", so points on the equator or the prime meridian do not restore.
#[derive(Clone)]
pub struct PreferencesTargetStore {
    preferences: Arc<dyn PreferenceStore>,
}

impl PreferencesTargetStore {
    pub fn new(preferences: Arc<dyn PreferenceStore>) -> Self {
        Self { preferences }
    }
}

#[async_trait]
impl TargetStore for PreferencesTargetStore {
    async fn save(&self, target: &Target) -> Result<(), StoreError> {
        // an unnamed target writes an empty name so the previous one is cleared
        let entries = vec![
            (
                LATITUDE_KEY.to_string(),
                PreferenceValue::Float(target.coordinate.latitude),
            ),
            (
                LONGITUDE_KEY.to_string(),
                PreferenceValue::Float(target.coordinate.longitude),
            ),
            (
                NAME_KEY.to_string(),
                PreferenceValue::Text(target.name.clone().unwrap_or_default()),
            ),
        ];

        self.preferences.commit(entries).await?;
        tracing::debug!("Saved target {}", target.coordinate);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Target>, StoreError> {
        let snapshot = self.preferences.snapshot().await?;
        let latitude = snapshot.get_f64(LATITUDE_KEY)?;
        let longitude = snapshot.get_f64(LONGITUDE_KEY)?;

        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Ok(None);
        };
        if latitude == 0.0 || longitude == 0.0 {
            tracing::debug!(
                "Stored target {}, {} has a zero component, treating as absent",
                latitude,
                longitude
            );
            return Ok(None);
        }

        let name = snapshot
            .get_string(NAME_KEY)?
            .filter(|name| !name.is_empty());

        Ok(Some(Target {
            coordinate: Coordinate::new(latitude, longitude),
            name,
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory preferences for tests
    #[derive(Default)]
    pub(crate) struct MemoryPreferences {
        values: Mutex<HashMap<String, PreferenceValue>>,
    }

    #[async_trait]
    impl PreferenceStore for MemoryPreferences {
        async fn snapshot(&self) -> Result<PreferenceSnapshot, StoreError> {
            Ok(PreferenceSnapshot::new(self.values.lock().unwrap().clone()))
        }

        async fn commit(&self, entries: Vec<(String, PreferenceValue)>) -> Result<(), StoreError> {
            self.values.lock().unwrap().extend(entries);
            Ok(())
        }
    }

    fn store() -> PreferencesTargetStore {
        PreferencesTargetStore::new(Arc::new(MemoryPreferences::default()))
    }

    #[tokio::test]
    async fn test_never_written_store_has_no_target() {
        assert_eq!(store().load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = store();
        let umbc = Target::named(Coordinate::new(39.2557, -76.7112), "UMBC");
        store.save(&umbc).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(umbc));
    }

    #[tokio::test]
    async fn test_save_overwrites_and_clears_name() {
        let store = store();
        store
            .save(&Target::named(Coordinate::new(39.2557, -76.7112), "UMBC"))
            .await
            .unwrap();
        let pin = Target::new(Coordinate::new(-33.8688, 151.2093));
        store.save(&pin).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(pin));
    }

    #[tokio::test]
    async fn test_zero_component_reads_as_absent() {
        let store = store();
        store
            .save(&Target::new(Coordinate::new(0.0, 0.0)))
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap(), None);

        // a single zero component is enough
        store
            .save(&Target::new(Coordinate::new(51.4779, 0.0)))
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        store
            .save(&Target::new(Coordinate::new(0.0, 32.5825)))
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[test]
    fn test_snapshot_type_mismatch_is_an_error() {
        let snapshot = PreferenceSnapshot::new(HashMap::from([
            ("Lat".to_string(), PreferenceValue::Text("north".to_string())),
            ("Name".to_string(), PreferenceValue::Float(1.0)),
        ]));
        assert!(matches!(snapshot.get_f64("Lat"), Err(StoreError::Format(_))));
        assert!(matches!(snapshot.get_string("Name"), Err(StoreError::Format(_))));
        assert_eq!(snapshot.get_f64("Lng").unwrap(), None);
    }
}
