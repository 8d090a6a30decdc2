#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::watch;

use volwatch::error::ConfigError;
use volwatch::market::{Candle, CandleWindow, InstrumentId, QuoteError, QuoteSource, WindowSpec};

/// Closes 100, 100.1, 100.3, 100.2, 100.5 (oldest first) -> 0.17%.
pub fn reference_closes() -> Vec<Decimal> {
    vec![dec!(100), dec!(100.1), dec!(100.3), dec!(100.2), dec!(100.5)]
}

/// Scriptable quote source.
///
/// Serves `reference_closes()` for every instrument unless told otherwise,
/// newest first like the real provider.
#[derive(Clone)]
pub struct MockSource {
    inner: Arc<Inner>,
}

struct Inner {
    closes: Mutex<HashMap<InstrumentId, Vec<Decimal>>>,
    failures: Mutex<HashMap<InstrumentId, QuoteError>>,
    delays: Mutex<HashMap<InstrumentId, Duration>>,
    panics: Mutex<HashSet<InstrumentId>>,
    configured: AtomicBool,
    gate: watch::Sender<bool>,

    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                closes: Mutex::new(HashMap::new()),
                failures: Mutex::new(HashMap::new()),
                delays: Mutex::new(HashMap::new()),
                panics: Mutex::new(HashSet::new()),
                configured: AtomicBool::new(true),
                gate,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_closes(&self, id: &str, closes: Vec<Decimal>) {
        self.inner.closes.lock().insert(id.into(), closes);
    }

    pub fn fail(&self, id: &str, err: QuoteError) {
        self.inner.failures.lock().insert(id.into(), err);
    }

    pub fn delay(&self, id: &str, d: Duration) {
        self.inner.delays.lock().insert(id.into(), d);
    }

    pub fn panic_on(&self, id: &str) {
        self.inner.panics.lock().insert(id.into());
    }

    pub fn set_configured(&self, configured: bool) {
        self.inner.configured.store(configured, Ordering::SeqCst);
    }

    /// Holds every fetch until `open_gate` is called.
    pub fn close_gate(&self) {
        self.inner.gate.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.inner.gate.send_replace(true);
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for MockSource {
    async fn fetch(
        &self,
        instrument: &InstrumentId,
        _window: &WindowSpec,
    ) -> Result<CandleWindow, QuoteError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let mut gate = self.inner.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let delay = self.inner.delays.lock().get(instrument).copied();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }

        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.inner.panics.lock().contains(instrument) {
            panic!("mock source exploded for {instrument}");
        }

        if let Some(err) = self.inner.failures.lock().get(instrument).cloned() {
            return Err(err);
        }

        let mut closes = self
            .inner
            .closes
            .lock()
            .get(instrument)
            .cloned()
            .unwrap_or_else(reference_closes);
        closes.reverse();

        Ok(CandleWindow::newest_first(
            closes.into_iter().map(Candle::new).collect(),
        ))
    }

    fn preflight(&self) -> Result<(), ConfigError> {
        if self.inner.configured.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ConfigError::MissingCredential {
                var: "TWELVE_API_KEY".into(),
            })
        }
    }
}
