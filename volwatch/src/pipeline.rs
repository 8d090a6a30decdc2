//! Per-instrument fetch -> estimate -> evaluate.
//!
//! Every failure ends here as a `Failed` row; nothing is propagated to the
//! scheduler's join.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::market::errors::QuoteError;
use crate::market::source::QuoteSource;
use crate::market::types::{InstrumentId, WindowSpec};
use crate::threshold::{ThresholdTable, is_alert};
use crate::volatility::{EstimateError, FailureKind, VolatilityResult, estimate};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Estimate(#[from] EstimateError),

    #[error("quote fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Quote(QuoteError::Network(_)) => FailureKind::Network,
            PipelineError::Quote(QuoteError::Auth(_)) => FailureKind::Auth,
            PipelineError::Quote(QuoteError::Schema(_)) => FailureKind::Schema,
            PipelineError::Quote(QuoteError::RateLimited(_)) => FailureKind::RateLimited,
            PipelineError::Quote(QuoteError::Provider { .. }) => FailureKind::Provider,
            PipelineError::Estimate(EstimateError::InsufficientData { .. }) => {
                FailureKind::InsufficientData
            }
            PipelineError::Estimate(EstimateError::Division) => FailureKind::Division,
            PipelineError::Estimate(EstimateError::Overflow) => FailureKind::Overflow,
            PipelineError::Timeout(_) => FailureKind::Timeout,
        }
    }
}

/// Runs one instrument for one tick. Never fails: errors become a `Failed` row.
#[instrument(
    skip(source, instrument, window, thresholds),
    fields(instrument = %instrument)
)]
pub async fn run_instrument_pipeline<S>(
    source: &S,
    instrument: &InstrumentId,
    window: &WindowSpec,
    fetch_timeout: Duration,
    thresholds: &ThresholdTable,
) -> VolatilityResult
where
    S: QuoteSource + ?Sized,
{
    match evaluate_instrument(source, instrument, window, fetch_timeout, thresholds).await {
        Ok(result) => result,
        Err(err) => {
            let kind = err.kind();
            warn!(error = %err, ?kind, "instrument pipeline failed");
            VolatilityResult::failed(instrument.clone(), kind, err.to_string())
        }
    }
}

async fn evaluate_instrument<S>(
    source: &S,
    instrument: &InstrumentId,
    window: &WindowSpec,
    fetch_timeout: Duration,
    thresholds: &ThresholdTable,
) -> Result<VolatilityResult, PipelineError>
where
    S: QuoteSource + ?Sized,
{
    let candles = tokio::time::timeout(fetch_timeout, source.fetch(instrument, window))
        .await
        .map_err(|_| PipelineError::Timeout(fetch_timeout))??;

    let closes = candles.into_oldest_first().closes();
    let est = estimate(&closes)?;

    // Read as late as possible so a fresh edit applies to this tick.
    let threshold = thresholds.get(instrument);
    let alert = is_alert(est.volatility_pct, threshold);

    debug!(
        reference_price = %est.reference_price,
        volatility_pct = %est.volatility_pct,
        threshold_pct = %threshold,
        alert,
        "instrument evaluated"
    );

    Ok(VolatilityResult::ok(
        instrument.clone(),
        est.reference_price,
        est.volatility_pct,
        alert,
    ))
}
