//! One refresh cycle: fan out a pipeline per instrument, join all of them.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{Instrument, warn};

use crate::market::source::QuoteSource;
use crate::market::types::{InstrumentId, WindowSpec};
use crate::pipeline::run_instrument_pipeline;
use crate::threshold::ThresholdTable;
use crate::volatility::{FailureKind, VolatilityResult};

/// Everything a cycle needs, cheap to clone into a task.
pub struct CycleContext<S: ?Sized> {
    pub source: Arc<S>,
    pub instruments: Arc<[InstrumentId]>,
    pub window: Arc<WindowSpec>,
    pub fetch_timeout: Duration,
    pub thresholds: ThresholdTable,
}

impl<S: ?Sized> Clone for CycleContext<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            instruments: Arc::clone(&self.instruments),
            window: Arc::clone(&self.window),
            fetch_timeout: self.fetch_timeout,
            thresholds: self.thresholds.clone(),
        }
    }
}

/// Runs every instrument concurrently and returns one row per instrument in
/// configured order.
///
/// Each pipeline is its own task, so a panic is contained and reported as a
/// `Failed` row. The join waits for all of them; it never short-circuits.
/// Dropping the returned future detaches the pipeline tasks.
pub async fn run_refresh_cycle<S>(ctx: CycleContext<S>) -> Vec<VolatilityResult>
where
    S: QuoteSource + ?Sized,
{
    let handles: Vec<_> = ctx
        .instruments
        .iter()
        .cloned()
        .map(|instrument| {
            let ctx = ctx.clone();
            tokio::spawn(
                async move {
                    run_instrument_pipeline(
                        ctx.source.as_ref(),
                        &instrument,
                        &ctx.window,
                        ctx.fetch_timeout,
                        &ctx.thresholds,
                    )
                    .await
                }
                .in_current_span(),
            )
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .zip(ctx.instruments.iter())
        .map(|(joined, instrument)| match joined {
            Ok(row) => row,
            Err(e) => {
                warn!(instrument = %instrument, error = %e, "instrument task aborted");
                VolatilityResult::failed(instrument.clone(), FailureKind::Aborted, e.to_string())
            }
        })
        .collect()
}
