use std::time::Duration;

use common::logger::LogFormat;

use crate::error::ConfigError;
use crate::market::types::{InstrumentId, WindowSpec};
use crate::scheduler::SchedulerConfig;

/// Environment variable holding the Twelve Data API key.
pub const API_KEY_VAR: &str = "TWELVE_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";
const DEFAULT_INSTRUMENTS: &str = "BTC/USD,XAU/USD,USD/JPY,GBP/CAD";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Provider base URL, without the endpoint path.
    pub base_url: String,

    /// Name of the variable the API key is read from on every cycle.
    ///
    /// The key itself is not part of the config: a missing key must not stop
    /// startup, it halts scheduling until a manual retry finds it.
    pub api_key_var: String,

    /// Tracked instruments, in display order.
    pub instruments: Vec<InstrumentId>,

    // =========================
    // Scheduler configuration
    // =========================
    /// Seconds between automatic refreshes (countdown length).
    pub refresh_interval: Duration,

    /// Bound on one instrument's fetch; expiry is reported as a failed row.
    pub fetch_timeout: Duration,

    /// Candle interval code and window length requested per instrument.
    pub window: WindowSpec,

    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("TWELVE_DATA_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let raw_instruments =
            lookup("VOLWATCH_INSTRUMENTS").unwrap_or_else(|| DEFAULT_INSTRUMENTS.to_string());
        let instruments = parse_instruments(&raw_instruments)?;

        let refresh_secs = parse_positive(&lookup, "VOLWATCH_REFRESH_SECS", 600)?;
        let timeout_secs = parse_positive(&lookup, "VOLWATCH_FETCH_TIMEOUT_SECS", 12)?;
        let window_size = parse_positive(&lookup, "VOLWATCH_WINDOW_SIZE", 5)?;
        if window_size < 2 {
            return Err(invalid("VOLWATCH_WINDOW_SIZE", window_size.to_string()));
        }

        let interval = lookup("VOLWATCH_CANDLE_INTERVAL").unwrap_or_else(|| "15min".to_string());

        Ok(Self {
            base_url,
            api_key_var: API_KEY_VAR.to_string(),
            instruments,
            refresh_interval: Duration::from_secs(refresh_secs),
            fetch_timeout: Duration::from_secs(timeout_secs),
            window: WindowSpec {
                interval,
                size: window_size as usize,
            },
            log_format: LogFormat::from_app_env(lookup("APP_ENV").as_deref()),
        })
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            refresh_interval: self.refresh_interval,
            fetch_timeout: self.fetch_timeout,
            window: self.window.clone(),
        }
    }
}

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.into(),
    }
}

fn parse_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(invalid(key, raw)),
    }
}

fn parse_instruments(raw: &str) -> Result<Vec<InstrumentId>, ConfigError> {
    let mut out: Vec<InstrumentId> = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let id = InstrumentId::new(id);
        if !out.contains(&id) {
            out.push(id);
        }
    }

    if out.is_empty() {
        return Err(invalid("VOLWATCH_INSTRUMENTS", raw));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_the_four_instrument_setup() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();

        let ids: Vec<&str> = cfg.instruments.iter().map(|i| i.as_str()).collect();
        assert_eq!(ids, ["BTC/USD", "XAU/USD", "USD/JPY", "GBP/CAD"]);
        assert_eq!(cfg.refresh_interval, Duration::from_secs(600));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(12));
        assert_eq!(cfg.window, WindowSpec::default());
        assert_eq!(cfg.api_key_var, "TWELVE_API_KEY");
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn overrides_are_applied_and_deduplicated() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("VOLWATCH_INSTRUMENTS", " ETH/USD, ETH/USD ,EUR/USD,"),
            ("VOLWATCH_REFRESH_SECS", "60"),
            ("APP_ENV", "production"),
        ]))
        .unwrap();

        assert_eq!(cfg.instruments.len(), 2);
        assert_eq!(cfg.scheduler_config().refresh_interval, Duration::from_secs(60));
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn malformed_values_are_rejected() {
        for (key, value) in [
            ("VOLWATCH_REFRESH_SECS", "soon"),
            ("VOLWATCH_FETCH_TIMEOUT_SECS", "0"),
            ("VOLWATCH_WINDOW_SIZE", "1"),
            ("VOLWATCH_INSTRUMENTS", " , "),
        ] {
            let err = AppConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(
                matches!(&err, ConfigError::Invalid { key: k, .. } if k == key),
                "{key}={value:?} gave {err:?}"
            );
        }
    }
}
