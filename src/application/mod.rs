// Application layer - Use cases over the upstream seams
pub mod dashboard_service;
pub mod telemetry_repository;
pub mod weather_provider;
pub mod weather_service;
