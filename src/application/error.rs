// Error taxonomy for the proximity use cases
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("location permission has not been granted")]
    PermissionDenied,

    #[error("location provider unavailable: {0}")]
    ProviderUnavailable(String),
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("place selection was cancelled")]
    Cancelled,

    #[error("selected coordinate is out of range: {latitude}, {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("target store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("target store is malformed: {0}")]
    Format(String),
}
