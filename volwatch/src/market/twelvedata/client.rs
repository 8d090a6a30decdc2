use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::error::ConfigError;
use crate::market::errors::QuoteError;
use crate::market::source::QuoteSource;
use crate::market::twelvedata::errors::TwelveDataError;
use crate::market::twelvedata::types::parse_time_series;
use crate::market::types::{Candle, CandleWindow, InstrumentId, WindowSpec};

/// Where the API key comes from.
///
/// `Env` is resolved on every use so a key exported after startup is picked
/// up by the next manual retry.
#[derive(Clone, Debug)]
pub enum Credential {
    Static(String),
    Env(String),
}

impl Credential {
    pub fn resolve(&self) -> Result<String, ConfigError> {
        let (key, var) = match self {
            Credential::Static(key) => (Some(key.clone()), "api_key"),
            Credential::Env(var) => (std::env::var(var).ok(), var.as_str()),
        };

        key.map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential {
                var: var.to_string(),
            })
    }
}

#[derive(Clone)]
pub struct TwelveDataClient {
    http: Client,
    base_url: String,
    credential: Credential,
}

impl TwelveDataClient {
    pub fn new(
        base_url: String,
        credential: Credential,
        timeout: Duration,
    ) -> Result<Self, TwelveDataError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// `GET /time_series` for one instrument. Candles come back newest first.
    #[instrument(
        skip(self, window),
        fields(symbol = %instrument, interval = %window.interval, size = window.size),
        level = "debug"
    )]
    pub async fn fetch_time_series(
        &self,
        instrument: &InstrumentId,
        window: &WindowSpec,
    ) -> Result<Vec<Candle>, TwelveDataError> {
        let api_key = self.credential.resolve()?;
        let url = format!("{}/time_series", self.base_url);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("symbol", instrument.provider_symbol()),
                ("interval", window.interval.clone()),
                ("outputsize", window.size.to_string()),
                ("apikey", api_key),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        let candles = decode_response(status, &body)?;

        debug!(
            received = candles.len(),
            requested = window.size,
            "twelvedata time series fetched"
        );

        Ok(candles)
    }
}

/// An error body wins over the bare status code; a non-2xx status wins over
/// any other body.
fn decode_response(status: StatusCode, body: &[u8]) -> Result<Vec<Candle>, TwelveDataError> {
    match (status.is_success(), parse_time_series(body)) {
        (_, Err(err @ TwelveDataError::Api { .. })) => Err(err),
        (false, _) => Err(status_error(status)),
        (true, parsed) => parsed,
    }
}

fn status_error(status: StatusCode) -> TwelveDataError {
    TwelveDataError::Api {
        code: status.as_u16(),
        message: status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    }
}

#[async_trait]
impl QuoteSource for TwelveDataClient {
    async fn fetch(
        &self,
        instrument: &InstrumentId,
        window: &WindowSpec,
    ) -> Result<CandleWindow, QuoteError> {
        let candles = self.fetch_time_series(instrument, window).await?;
        Ok(CandleWindow::newest_first(candles))
    }

    fn preflight(&self) -> Result<(), ConfigError> {
        self.credential.resolve().map(|_| ())
    }
}
