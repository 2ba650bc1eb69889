pub mod aggregate;
pub mod config;
pub mod error;
pub mod http_client;
pub mod pipeline;
pub mod projection;
pub mod records;
pub mod report;
pub mod schedule;
pub mod simulate;
pub mod stats;
pub mod stats_fetch;
pub mod strength;

pub use error::ForecastError;
pub use pipeline::Forecaster;
