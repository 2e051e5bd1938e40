// Domain layer - Pure models and proximity logic
pub mod geo;
pub mod proximity;
pub mod target;
