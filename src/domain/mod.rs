// Domain layer - Records, schemas and the pure metrics pipeline
pub mod dashboard;
pub mod metrics;
pub mod record;
pub mod schema;
pub mod series;
pub mod time_range;
