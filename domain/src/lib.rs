pub mod error;
pub mod ingestion;
pub mod models;
pub mod ports;
pub mod run_config;
