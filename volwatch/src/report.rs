//! Plain-text rendering for log-based collaborators.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::threshold::ThresholdTable;
use crate::view::{MonitorStatus, MonitorView};
use crate::volatility::{InstrumentStatus, Snapshot, VolatilityResult};

const NOT_AVAILABLE: &str = "N/A";

/// `"9m 59s"`.
pub fn format_countdown(secs: u64) -> String {
    format!("{}m {}s", secs / 60, secs % 60)
}

pub fn format_price(price: Option<Decimal>) -> String {
    format_fixed(price, 4)
}

pub fn format_pct(pct: Option<Decimal>) -> String {
    format_fixed(pct, 2)
}

// Decimal's `{:.N}` truncates; round half away from zero first.
fn format_fixed(value: Option<Decimal>, dp: u32) -> String {
    value.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |v| {
            let rounded = v.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}", dp as usize, rounded)
        },
    )
}

/// One table line: instrument, price, volatility, threshold, flag.
pub fn format_row(row: &VolatilityResult, threshold: Decimal) -> String {
    let flag = match row.status() {
        InstrumentStatus::Ok if row.alert() => "ALERT".to_string(),
        InstrumentStatus::Ok => "ok".to_string(),
        InstrumentStatus::Degraded => "halted".to_string(),
        InstrumentStatus::Failed { kind, .. } => format!("failed ({kind:?})"),
    };

    format!(
        "{:<8} {:>14} {:>8} {:>6} {}",
        row.instrument(),
        format_price(row.reference_price()),
        format_pct(row.volatility_pct()),
        threshold.normalize(),
        flag
    )
}

pub fn render_snapshot(snapshot: &Snapshot, thresholds: &ThresholdTable) -> Vec<String> {
    let mut lines = Vec::with_capacity(snapshot.len() + 1);
    lines.push(format!(
        "{:<8} {:>14} {:>8} {:>6} {}",
        "Symbol", "Price", "Vol(%)", "Thr(%)", "Alert"
    ));
    lines.extend(
        snapshot
            .rows()
            .iter()
            .map(|row| format_row(row, thresholds.get(row.instrument()))),
    );
    lines
}

/// Header line: global status and time to the next refresh.
pub fn render_status(view: &MonitorView) -> String {
    let status = match &view.status {
        MonitorStatus::Starting => "starting".to_string(),
        MonitorStatus::Ready if view.is_loading() => "refreshing data...".to_string(),
        MonitorStatus::Ready => "ready".to_string(),
        MonitorStatus::ConfigError(e) => format!("error: {e} (manual retry required)"),
    };
    format!(
        "{status} | next auto-refresh in: {}",
        format_countdown(view.countdown_secs)
    )
}
