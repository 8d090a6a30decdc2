//! Aggregation scheduler.
//!
//! Responsibilities:
//! - Drive the one-second countdown clock and start a refresh cycle when it
//!   expires or when the collaborator asks for a manual retry.
//! - Guarantee that at most one refresh cycle is in flight.
//! - Join every instrument's result and publish the ordered snapshot.
//! - Halt automatic refreshes while the quote source is misconfigured.
//!
//! Non-responsibilities:
//! - Fetching and estimating (the instrument pipeline does this).
//! - Rendering (collaborators subscribe to the published view).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{Instrument, debug, error, info, instrument, warn};

use common::logger::{TraceId, cycle_span, record_outcome, warn_if_slow};

use crate::error::{ConfigError, ValidationError};
use crate::market::source::QuoteSource;
use crate::market::types::{InstrumentId, WindowSpec};
use crate::metrics::counters::Counters;
use crate::scheduler::countdown::Countdown;
use crate::scheduler::cycle::{CycleContext, run_refresh_cycle};
use crate::threshold::ThresholdTable;
use crate::view::{MonitorStatus, MonitorView, MonitorViewStore, Phase};
use crate::volatility::{FailureKind, Snapshot, VolatilityResult};

const COMMAND_QUEUE_CAPACITY: usize = 16;

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Time between automatic refreshes.
    pub refresh_interval: Duration,

    /// Upper bound on a single instrument's fetch.
    pub fetch_timeout: Duration,

    /// Candles requested per instrument.
    pub window: WindowSpec,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(600),
            fetch_timeout: Duration::from_secs(12),
            window: WindowSpec::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    Startup,
    Countdown,
    Manual,
}

#[derive(Debug)]
enum Command {
    Refresh,
}

type CycleHandle = JoinHandle<Vec<VolatilityResult>>;

pub struct AggregationScheduler<S: QuoteSource> {
    source: Arc<S>,
    instruments: Arc<[InstrumentId]>,
    thresholds: ThresholdTable,
    config: SchedulerConfig,
    counters: Counters,
}

impl<S: QuoteSource> AggregationScheduler<S> {
    pub fn new(
        source: Arc<S>,
        instruments: Vec<InstrumentId>,
        thresholds: ThresholdTable,
        config: SchedulerConfig,
        counters: Counters,
    ) -> Self {
        Self {
            source,
            instruments: instruments.into(),
            thresholds,
            config,
            counters,
        }
    }

    /// Starts the control loop on the current runtime.
    ///
    /// The first refresh is scheduled immediately.
    pub fn spawn(self) -> SchedulerHandle {
        let interval_secs = self.config.refresh_interval.as_secs().max(1);

        let view = MonitorViewStore::new(MonitorView {
            countdown_secs: interval_secs,
            ..MonitorView::default()
        });

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let instruments = Arc::clone(&self.instruments);
        let thresholds = self.thresholds.clone();

        let control = ControlLoop {
            ctx: CycleContext {
                source: self.source,
                instruments: self.instruments,
                window: Arc::new(self.config.window),
                fetch_timeout: self.config.fetch_timeout,
                thresholds: self.thresholds,
            },
            counters: self.counters,
            view: view.clone(),
            countdown: Countdown::new(interval_secs),
            in_flight: None,
            halted: false,
            seq: 0,
        };

        let task = tokio::spawn(control.run(cmd_rx, shutdown_rx));

        SchedulerHandle {
            commands: cmd_tx,
            view,
            thresholds,
            instruments,
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// State owned by the spawned loop. Nothing here is shared.
struct ControlLoop<S: QuoteSource> {
    ctx: CycleContext<S>,
    counters: Counters,
    view: MonitorViewStore,
    countdown: Countdown,
    in_flight: Option<CycleHandle>,
    halted: bool,
    seq: u64,
}

impl<S: QuoteSource> ControlLoop<S> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let tick = Duration::from_secs(1);
        let mut clock = interval_at(Instant::now() + tick, tick);
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            instruments = self.ctx.instruments.len(),
            interval_secs = self.countdown.interval_secs(),
            fetch_timeout_ms = self.ctx.fetch_timeout.as_millis() as u64,
            "aggregation scheduler started"
        );

        self.try_start(Trigger::Startup);

        loop {
            tokio::select! {
                // Sender dropped counts as shutdown too.
                _ = &mut shutdown => break,

                _ = clock.tick() => self.on_clock_tick(),

                Some(Command::Refresh) = commands.recv() => self.try_start(Trigger::Manual),

                joined = join_in_flight(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.on_cycle_joined(joined);
                }
            }
        }

        if let Some(cycle) = self.in_flight.take() {
            // Pipelines already spawned are detached, not awaited.
            cycle.abort();
            warn!("shutdown abandoned an in-flight refresh cycle");
        }

        info!("aggregation scheduler stopped");
    }

    fn on_clock_tick(&mut self) {
        if self.countdown.tick() {
            if self.halted {
                Counters::incr(&self.counters.triggers_suppressed);
                debug!("countdown expired while halted; waiting for manual retry");
            } else {
                self.try_start(Trigger::Countdown);
            }
        }

        let remaining = self.countdown.remaining();
        self.view.update(|v| v.countdown_secs = remaining);
    }

    #[instrument(skip(self), fields(seq = self.seq + 1))]
    fn try_start(&mut self, trigger: Trigger) {
        if self.in_flight.is_some() {
            Counters::incr(&self.counters.triggers_coalesced);
            debug!(?trigger, "refresh already in flight; trigger coalesced");
            return;
        }

        self.countdown.reset();

        if let Err(e) = self.ctx.source.preflight() {
            self.halt(e);
            return;
        }

        let resumed = std::mem::take(&mut self.halted);
        if resumed {
            info!("configuration resolved; resuming scheduling");
        }

        let trace_id = TraceId::default();
        let span = cycle_span(&trace_id, self.ctx.instruments.len());
        let ctx = self.ctx.clone();
        let slow_after = self.ctx.fetch_timeout;

        let cycle = async move {
            let rows = warn_if_slow("refresh_cycle", slow_after, run_refresh_cycle(ctx)).await;
            let ok = rows.iter().filter(|r| r.is_ok()).count();
            record_outcome(&tracing::Span::current(), ok, rows.len() - ok);
            rows
        }
        .instrument(span);

        self.in_flight = Some(tokio::spawn(cycle));
        Counters::incr(&self.counters.cycles_started);

        let remaining = self.countdown.remaining();
        self.view.update(|v| {
            v.phase = Phase::Refreshing;
            v.countdown_secs = remaining;
            if resumed {
                v.status = MonitorStatus::Starting;
            }
        });

        debug!(?trigger, trace_id = %trace_id, "refresh cycle scheduled");
    }

    fn halt(&mut self, err: ConfigError) {
        self.halted = true;
        Counters::incr(&self.counters.preflight_failures);
        error!(error = %err, "quote source misconfigured; scheduling halted until manual retry");

        let rows = self
            .ctx
            .instruments
            .iter()
            .cloned()
            .map(VolatilityResult::degraded)
            .collect();
        let snapshot = self.next_snapshot(rows);
        let remaining = self.countdown.remaining();

        self.view.update(|v| {
            v.phase = Phase::Idle;
            v.status = MonitorStatus::ConfigError(err);
            v.countdown_secs = remaining;
            v.snapshot = Some(snapshot);
        });
    }

    fn on_cycle_joined(&mut self, joined: Result<Vec<VolatilityResult>, JoinError>) {
        let rows = match joined {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "refresh cycle task failed");
                self.ctx
                    .instruments
                    .iter()
                    .cloned()
                    .map(|id| VolatilityResult::failed(id, FailureKind::Aborted, e.to_string()))
                    .collect()
            }
        };

        let ok = rows.iter().filter(|r| r.is_ok()).count();
        let failed = rows.len() - ok;
        Counters::add(&self.counters.instruments_ok, ok);
        Counters::add(&self.counters.instruments_failed, failed);

        let snapshot = self.next_snapshot(rows);
        Counters::incr(&self.counters.snapshots_emitted);

        info!(
            seq = snapshot.seq,
            ok,
            failed,
            alerts = snapshot.alerts().count(),
            "snapshot published"
        );

        self.view.update(|v| {
            v.phase = Phase::Idle;
            v.status = MonitorStatus::Ready;
            v.snapshot = Some(snapshot);
        });
    }

    fn next_snapshot(&mut self, rows: Vec<VolatilityResult>) -> Arc<Snapshot> {
        self.seq += 1;
        Arc::new(Snapshot::new(self.seq, Utc::now(), rows))
    }
}

async fn join_in_flight(
    cycle: &mut Option<CycleHandle>,
) -> Result<Vec<VolatilityResult>, JoinError> {
    match cycle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Collaborator-facing side of a running scheduler.
///
/// Dropping the handle stops the loop as well.
pub struct SchedulerHandle {
    commands: mpsc::Sender<Command>,
    view: MonitorViewStore,
    thresholds: ThresholdTable,
    instruments: Arc<[InstrumentId]>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn subscribe(&self) -> watch::Receiver<MonitorView> {
        self.view.subscribe()
    }

    pub fn current(&self) -> MonitorView {
        self.view.current()
    }

    /// Manual retry. A no-op while a cycle is already in flight.
    ///
    /// Returns `false` only when the loop has stopped or its queue is full.
    pub fn refresh_now(&self) -> bool {
        self.commands.try_send(Command::Refresh).is_ok()
    }

    pub fn instruments(&self) -> &[InstrumentId] {
        &self.instruments
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Validates and stores a threshold edit for a configured instrument.
    ///
    /// Takes effect on the next evaluation that reads the table.
    pub fn set_threshold(
        &self,
        instrument: &InstrumentId,
        raw: &str,
    ) -> Result<Decimal, ValidationError> {
        if !self.instruments.contains(instrument) {
            return Err(ValidationError::UnknownInstrument(instrument.to_string()));
        }
        self.thresholds.set_from_str(instrument, raw)
    }

    /// Stops the clock, abandons any in-flight cycle and waits for the loop
    /// to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "scheduler task ended abnormally");
        }
    }
}
