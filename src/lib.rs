pub mod batch;
pub mod browser;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod export;
pub mod hh;
pub mod output;
pub mod scoring;
pub mod store;
pub mod telemetry;
