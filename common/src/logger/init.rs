use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Output format of the global subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `APP_ENV=production` selects JSON, anything else pretty output.
    pub fn from_app_env(app_env: Option<&str>) -> Self {
        match app_env {
            Some("production") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Installs the global tracing subscriber once per process.
///
/// `RUST_LOG` overrides the default `info` filter. Later calls are no-ops.
pub fn init_logger(service_name: &'static str, format: LogFormat) {
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let base = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            // Includes timing when the span closes
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        match format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(base.json())
                .init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(base.pretty())
                .init(),
        }

        tracing::info!(service = service_name, ?format, "logger initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_env_selects_json() {
        assert_eq!(LogFormat::from_app_env(Some("production")), LogFormat::Json);
        assert_eq!(LogFormat::from_app_env(Some("dev")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_app_env(None), LogFormat::Pretty);
    }
}
