// Application layer - Use cases and collaborator traits
pub mod error;
pub mod location_provider;
pub mod proximity_service;
pub mod subscription;
pub mod target_store;
