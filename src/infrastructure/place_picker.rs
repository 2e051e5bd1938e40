// Place picker backed by the configured target
use crate::application::error::SelectionError;
use crate::application::location_provider::PlacePicker;
use crate::domain::target::Target;
use crate::infrastructure::config::TargetSettings;
use async_trait::async_trait;

/// Picks the place named in settings; without one the pick is cancelled.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredPlacePicker {
    target: Option<TargetSettings>,
}

impl ConfiguredPlacePicker {
    pub fn new(target: Option<TargetSettings>) -> Self {
        Self { target }
    }
}

#[async_trait]
impl PlacePicker for ConfiguredPlacePicker {
    async fn pick_place(&self) -> Result<Target, SelectionError> {
        self.target
            .as_ref()
            .map(TargetSettings::to_target)
            .ok_or(SelectionError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::target::Coordinate;

    #[tokio::test]
    async fn test_configured_target_is_picked() {
        let picker = ConfiguredPlacePicker::new(Some(TargetSettings {
            latitude: 39.2557,
            longitude: -76.7112,
            name: Some("UMBC".to_string()),
        }));
        assert_eq!(
            picker.pick_place().await.unwrap(),
            Target::named(Coordinate::new(39.2557, -76.7112), "UMBC")
        );
    }

    #[tokio::test]
    async fn test_no_target_cancels() {
        let picker = ConfiguredPlacePicker::default();
        assert!(matches!(picker.pick_place().await, Err(SelectionError::Cancelled)));
    }
}
