pub mod config;
pub mod error;
pub mod market;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod threshold;
pub mod view;
pub mod volatility;
