// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod permissions;
pub mod place_picker;
pub mod preferences;
pub mod replay_provider;
