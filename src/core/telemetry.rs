use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::config::LogSection;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl From<&LogSection> for LogFormat {
    fn from(cfg: &LogSection) -> Self {
        if cfg.format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// `RUST_LOG` takes precedence over the configured level.
pub fn env_filter(cfg: &LogSection) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.level.to_lowercase()))
}

/// Install the global subscriber. A second call is a no-op.
///
/// Logs go to stderr so `hwc query` output on stdout stays pure JSON.
pub fn init_tracing_with(cfg: &LogSection) {
    let base = fmt::layer()
        .with_target(true)
        .with_ansi(!cfg.no_ansi)
        .with_writer(std::io::stderr);
    let fmt_layer = match LogFormat::from(cfg) {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Text => base.boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter(cfg))
        .with(fmt_layer)
        .try_init();
}
