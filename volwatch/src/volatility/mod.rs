pub mod estimator;
pub mod types;

pub use estimator::{EstimateError, VolatilityEstimate, estimate};
pub use types::{FailureKind, InstrumentStatus, Snapshot, VolatilityResult};
