use async_trait::async_trait;

use crate::error::ConfigError;
use crate::market::errors::QuoteError;
use crate::market::types::{CandleWindow, InstrumentId, WindowSpec};

/// Boundary to an external candle provider.
///
/// One call performs one outbound request and never retries; the next
/// scheduler tick is the retry. Implementations hold no state shared with
/// other instruments' calls.
#[async_trait]
pub trait QuoteSource: Send + Sync + 'static {
    /// Fetches the most recent `window.size` candles, in provider order.
    async fn fetch(
        &self,
        instrument: &InstrumentId,
        window: &WindowSpec,
    ) -> Result<CandleWindow, QuoteError>;

    /// Checked once per refresh cycle before any fetch is attempted.
    fn preflight(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}
