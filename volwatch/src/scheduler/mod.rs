pub mod countdown;
pub mod cycle;
pub mod scheduler;

pub use countdown::Countdown;
pub use scheduler::{AggregationScheduler, SchedulerConfig, SchedulerHandle};
