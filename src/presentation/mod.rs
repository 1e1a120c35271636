// Presentation layer - HTTP routing, handlers and error bodies
pub mod app_state;
pub mod error;
pub mod handlers;
pub mod router;
