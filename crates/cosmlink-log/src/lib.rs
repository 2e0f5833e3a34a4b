//! Logging utilities for cosmlink.
//!
//! Library crates log through the re-exported `tracing` macros. Binaries and
//! tests pick a subscriber with one of the `init_*` functions; nothing here
//! installs a subscriber implicitly.

use serde::{Deserialize, Serialize};

pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};
pub use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Output format of the subscriber
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

/// Logging section of the client configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `cosmlink_client=debug`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Initialize the global subscriber with structured JSON output, filtered
/// by `RUST_LOG` and defaulting to `info`
pub fn init_tracing() -> InitResult {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    init_with(filter, LogFormat::Json)
}

/// Initialize JSON tracing with a specific level filter
pub fn init_tracing_with_level(level: &str) -> InitResult {
    init_with(EnvFilter::new(level), LogFormat::Json)
}

/// Initialize tracing from the configuration file section
pub fn init_tracing_with_config(config: &LogConfig) -> InitResult {
    init_with(EnvFilter::new(&config.level), config.format)
}

/// Initialize tracing for tests with output captured by the test harness
pub fn init_tracing_test() -> InitResult {
    tracing_subscriber::registry()
        .with(EnvFilter::new("debug"))
        .with(fmt::layer().with_test_writer())
        .try_init()?;

    Ok(())
}

fn init_with(filter: EnvFilter, format: LogFormat) -> InitResult {
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .try_init()?,
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init()?,
    }

    Ok(())
}
