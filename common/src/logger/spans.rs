use tracing::{Span, field};

use super::TraceId;

/// Root span for one refresh cycle.
///
/// `ok` and `failed` stay empty until the cycle joins; see [`record_outcome`].
pub fn cycle_span(trace_id: &TraceId, instruments: usize) -> Span {
    tracing::info_span!(
        "refresh_cycle",
        trace_id = %trace_id,
        instruments,
        ok = field::Empty,
        failed = field::Empty
    )
}

/// Records the joined outcome counts on a span created by [`cycle_span`].
pub fn record_outcome(span: &Span, ok: usize, failed: usize) {
    span.record("ok", ok);
    span.record("failed", failed);
}
