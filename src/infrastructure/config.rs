use crate::application::location_provider::{LocationRequest, PermissionKind};
use crate::domain::proximity::AlertMode;
use crate::domain::target::{Coordinate, Target};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG: &str = "config/location_alert";
const ENV_PREFIX: &str = "LOCATION_ALERT";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub location: LocationSettings,
    pub alerts: AlertSettings,
    pub permissions: PermissionSettings,
    pub provider: ProviderSettings,
    pub target: Option<TargetSettings>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreSettings {
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/last_location.toml"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LocationSettings {
    pub interval_ms: u64,
    pub fastest_interval_ms: u64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        let request = LocationRequest::default();
        Self {
            interval_ms: request.interval.as_millis() as u64,
            fastest_interval_ms: request.fastest_interval.as_millis() as u64,
        }
    }
}

impl LocationSettings {
    pub fn request(&self) -> LocationRequest {
        LocationRequest {
            interval: Duration::from_millis(self.interval_ms),
            fastest_interval: Duration::from_millis(self.fastest_interval_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AlertSettings {
    pub mode: AlertMode,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PermissionSettings {
    pub granted: Vec<PermissionKind>,
}

impl Default for PermissionSettings {
    fn default() -> Self {
        Self {
            granted: vec![PermissionKind::FineLocation],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderSettings {
    pub track_file: PathBuf,
    pub repeat: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            track_file: PathBuf::from("config/track.json"),
            repeat: false,
        }
    }
}

/// Place chosen ahead of time, standing in for the interactive picker
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TargetSettings {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
}

impl TargetSettings {
    pub fn to_target(&self) -> Target {
        Target {
            coordinate: Coordinate::new(self.latitude, self.longitude),
            name: self.name.clone(),
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(DEFAULT_CONFIG)
}

/// Settings from an optional file at `name`, overridden by
/// `LOCATION_ALERT__SECTION__KEY` environment variables.
pub fn load_settings_from(name: &str) -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(name).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
