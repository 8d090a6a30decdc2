use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::market::types::InstrumentId;

/// Why an instrument produced no estimate this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Auth,
    Schema,
    RateLimited,
    Provider,
    Timeout,
    InsufficientData,
    Division,
    /// Closes too large or too small to estimate in decimal range.
    Overflow,
    /// The pipeline task panicked or was cancelled.
    Aborted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstrumentStatus {
    Ok,
    /// Not evaluated: the whole cycle was halted by a configuration error.
    Degraded,
    Failed { kind: FailureKind, reason: String },
}

/// One row of a [`Snapshot`].
///
/// Only `Ok` rows carry values; every other status has both values absent
/// and `alert == false`. The constructors are the only way to build one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolatilityResult {
    instrument: InstrumentId,
    reference_price: Option<Decimal>,
    volatility_pct: Option<Decimal>,
    alert: bool,
    status: InstrumentStatus,
}

impl VolatilityResult {
    pub fn ok(
        instrument: InstrumentId,
        reference_price: Decimal,
        volatility_pct: Decimal,
        alert: bool,
    ) -> Self {
        Self {
            instrument,
            reference_price: Some(reference_price),
            volatility_pct: Some(volatility_pct),
            alert,
            status: InstrumentStatus::Ok,
        }
    }

    pub fn failed(instrument: InstrumentId, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self::empty(
            instrument,
            InstrumentStatus::Failed {
                kind,
                reason: reason.into(),
            },
        )
    }

    pub fn degraded(instrument: InstrumentId) -> Self {
        Self::empty(instrument, InstrumentStatus::Degraded)
    }

    fn empty(instrument: InstrumentId, status: InstrumentStatus) -> Self {
        Self {
            instrument,
            reference_price: None,
            volatility_pct: None,
            alert: false,
            status,
        }
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    pub fn reference_price(&self) -> Option<Decimal> {
        self.reference_price
    }

    pub fn volatility_pct(&self) -> Option<Decimal> {
        self.volatility_pct
    }

    pub fn alert(&self) -> bool {
        self.alert
    }

    pub fn status(&self) -> &InstrumentStatus {
        &self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == InstrumentStatus::Ok
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.status {
            InstrumentStatus::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Complete, ordered result set of one tick. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Monotonic cycle counter, starting at 1.
    pub seq: u64,
    pub taken_at: DateTime<Utc>,
    rows: Vec<VolatilityResult>,
}

impl Snapshot {
    pub fn new(seq: u64, taken_at: DateTime<Utc>, rows: Vec<VolatilityResult>) -> Self {
        Self {
            seq,
            taken_at,
            rows,
        }
    }

    pub fn rows(&self) -> &[VolatilityResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, instrument: &InstrumentId) -> Option<&VolatilityResult> {
        self.rows.iter().find(|r| r.instrument() == instrument)
    }

    pub fn ok_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_ok()).count()
    }

    pub fn alerts(&self) -> impl Iterator<Item = &VolatilityResult> {
        self.rows.iter().filter(|r| r.alert())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn non_ok_rows_never_alert_or_carry_values() {
        let failed = VolatilityResult::failed("XAU/USD".into(), FailureKind::Network, "down");
        assert_eq!(failed.reference_price(), None);
        assert_eq!(failed.volatility_pct(), None);
        assert!(!failed.alert());
        assert_eq!(failed.failure_kind(), Some(FailureKind::Network));

        let degraded = VolatilityResult::degraded("XAU/USD".into());
        assert!(!degraded.alert());
        assert_eq!(degraded.status(), &InstrumentStatus::Degraded);
        assert_eq!(degraded.failure_kind(), None);
    }

    #[test]
    fn snapshot_lookup_and_counts() {
        let snap = Snapshot::new(
            1,
            Utc::now(),
            vec![
                VolatilityResult::ok("BTC/USD".into(), dec!(100.5), dec!(0.17), true),
                VolatilityResult::failed("XAU/USD".into(), FailureKind::Timeout, "slow"),
            ],
        );

        assert_eq!(snap.len(), 2);
        assert_eq!(snap.ok_count(), 1);
        assert_eq!(snap.alerts().count(), 1);
        assert!(snap.get(&"XAU/USD".into()).is_some_and(|r| !r.is_ok()));
        assert!(snap.get(&"GBP/CAD".into()).is_none());
    }
}
