use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

/// Opaque identifier of one tracked instrument, e.g. `BTC/USD`.
///
/// Cheap to clone; the configured set is fixed for the process lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrumentId(Arc<str>);

impl InstrumentId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref().trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Pair code without separators, as most REST providers expect (`BTC/USD` -> `BTCUSD`).
    pub fn provider_symbol(&self) -> String {
        self.0.chars().filter(|c| *c != '/').collect()
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One price sample. Only the close is consumed downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candle {
    pub close: Decimal,
}

impl Candle {
    pub fn new(close: Decimal) -> Self {
        Self { close }
    }
}

/// Order of the candles held by a [`CandleWindow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowOrder {
    /// Provider wire order.
    NewestFirst,
    /// Chronological order required by the estimator.
    OldestFirst,
}

/// Fixed-size run of recent candles for one instrument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandleWindow {
    candles: Vec<Candle>,
    order: WindowOrder,
}

impl CandleWindow {
    /// Wraps candles exactly as delivered by a provider (newest first).
    pub fn newest_first(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            order: WindowOrder::NewestFirst,
        }
    }

    pub fn oldest_first_from(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            order: WindowOrder::OldestFirst,
        }
    }

    /// Normalises to chronological order; no-op when already oldest first.
    pub fn into_oldest_first(mut self) -> Self {
        if self.order == WindowOrder::NewestFirst {
            self.candles.reverse();
            self.order = WindowOrder::OldestFirst;
        }
        self
    }

    pub fn order(&self) -> WindowOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Closing prices in the window's current order.
    pub fn closes(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

/// What to request from a quote source on every tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowSpec {
    /// Provider interval code, e.g. `15min`.
    pub interval: String,
    /// Number of candles per request.
    pub size: usize,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            interval: "15min".to_string(),
            size: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn provider_symbol_strips_separator() {
        assert_eq!(InstrumentId::new("BTC/USD").provider_symbol(), "BTCUSD");
        assert_eq!(InstrumentId::new(" XAU/USD ").as_str(), "XAU/USD");
    }

    #[test]
    fn newest_first_window_is_reversed_once() {
        let w = CandleWindow::newest_first(vec![
            Candle::new(dec!(3)),
            Candle::new(dec!(2)),
            Candle::new(dec!(1)),
        ]);

        let w = w.into_oldest_first();
        assert_eq!(w.order(), WindowOrder::OldestFirst);
        assert_eq!(w.closes(), vec![dec!(1), dec!(2), dec!(3)]);

        // Normalising twice must not flip it back.
        let w = w.into_oldest_first();
        assert_eq!(w.closes(), vec![dec!(1), dec!(2), dec!(3)]);
    }
}
