// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod csv_parser;
pub mod flux_query;
pub mod influx_repository;
pub mod settings_store;
pub mod ttl_cache;
pub mod weather_client;
