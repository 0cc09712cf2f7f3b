//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Core events go to stderr so that `--json` output on stdout stays
//! machine-readable.
//!
//! | Verbosity | Level |
//! |-----------|-------|
//! | (none)    | warn  |
//! | `-v`      | info  |
//! | `-vv`     | debug |
//! | `-vvv`    | trace |
//!
//! `RUST_LOG` takes precedence when no `-v` flag is given.

use std::io;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// Read the filter from `RUST_LOG` when it is set
    pub use_env_filter: bool,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: LevelFilter::WARN,
            use_env_filter: true,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        LogConfig {
            level,
            use_env_filter: verbosity == 0,
            ..Default::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::default().add_directive(self.level.into());
        if self.use_env_filter {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
        } else {
            fallback()
        }
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &LogConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(config.filter())
        .with(layer)
        .try_init()
}
