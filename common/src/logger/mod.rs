mod init;
mod spans;
mod timing;
mod trace_id;

pub use init::{LogFormat, init_logger};
pub use spans::{cycle_span, record_outcome};
pub use timing::warn_if_slow;
pub use trace_id::TraceId;
