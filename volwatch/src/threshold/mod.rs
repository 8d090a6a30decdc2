pub mod evaluator;
pub mod table;

pub use evaluator::{DEFAULT_THRESHOLD_PCT, MAX_THRESHOLD_PCT, is_alert, parse_threshold};
pub use table::ThresholdTable;
