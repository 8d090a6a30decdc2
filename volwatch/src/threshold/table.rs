use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::ValidationError;
use crate::market::types::InstrumentId;
use crate::threshold::evaluator::{DEFAULT_THRESHOLD_PCT, parse_threshold, validate_threshold};

type Entries = HashMap<InstrumentId, Decimal>;

/// Alert thresholds (percent) per instrument.
///
/// Writers replace the whole map; readers clone the current `Arc` and never
/// hold the lock across an await. Pipelines read at evaluation time, so an
/// edit lands on the in-flight tick if it happens before the read.
#[derive(Clone)]
pub struct ThresholdTable {
    entries: Arc<RwLock<Arc<Entries>>>,
    default_pct: Decimal,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_PCT)
    }
}

impl ThresholdTable {
    pub fn new(default_pct: Decimal) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Arc::new(HashMap::new()))),
            default_pct,
        }
    }

    /// Startup defaults for the known instruments; everything else uses the
    /// 0.2% fallback.
    pub fn with_defaults(instruments: &[InstrumentId]) -> Self {
        let table = Self::default();
        let entries = instruments
            .iter()
            .map(|id| (id.clone(), startup_default(id)))
            .collect();
        *table.entries.write() = Arc::new(entries);
        table
    }

    pub fn default_pct(&self) -> Decimal {
        self.default_pct
    }

    /// Current threshold, or the default when no entry exists yet.
    pub fn get(&self, instrument: &InstrumentId) -> Decimal {
        self.entries
            .read()
            .get(instrument)
            .copied()
            .unwrap_or(self.default_pct)
    }

    /// Copy-on-read view of every stored entry.
    pub fn snapshot(&self) -> Arc<Entries> {
        Arc::clone(&self.entries.read())
    }

    pub fn set(&self, instrument: &InstrumentId, pct: Decimal) -> Result<Decimal, ValidationError> {
        let pct = validate_threshold(pct)?;

        let mut guard = self.entries.write();
        let mut next = Entries::clone(&guard);
        let previous = next.insert(instrument.clone(), pct);
        *guard = Arc::new(next);
        drop(guard);

        info!(
            instrument = %instrument,
            previous = ?previous,
            threshold_pct = %pct,
            "threshold updated"
        );

        Ok(pct)
    }

    /// Parses and stores a user-entered threshold.
    pub fn set_from_str(
        &self,
        instrument: &InstrumentId,
        raw: &str,
    ) -> Result<Decimal, ValidationError> {
        let pct = parse_threshold(raw)?;
        self.set(instrument, pct)
    }
}

fn startup_default(instrument: &InstrumentId) -> Decimal {
    match instrument.as_str() {
        "BTC/USD" => Decimal::new(3, 1),
        "XAU/USD" => Decimal::new(25, 2),
        _ => DEFAULT_THRESHOLD_PCT,
    }
}
