// Presentation layer - Host lifecycle and user-facing output
pub mod app_state;
pub mod console;
