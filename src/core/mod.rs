pub mod cache;
pub mod config;
pub mod effort;
pub mod idle;
pub mod issue;
pub mod metrics;
pub mod stages;
pub mod timespan;
