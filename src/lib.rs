pub mod config;
pub mod errors;
pub mod evaluation;
pub mod ingestion;
pub mod learning;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod sampling;
pub mod stats;
