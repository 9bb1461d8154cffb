// Presentation layer - HTTP routes, handlers and envelopes
pub mod app_state;
pub mod error;
pub mod handlers;
pub mod routes;
