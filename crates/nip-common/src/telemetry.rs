//! Tracing setup for NIP binaries.
//!
//! ```ignore
//! use nip_common::telemetry::{self, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env("nip").with_level(config.log.level.as_deref());
//! telemetry::init(config);
//! tracing::info!("ready");
//! ```

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name, attached to the root span.
    pub service_name: String,
    /// Console log level (default: INFO, DEBUG in debug builds)
    pub console_level: Level,
    /// Filter directive from the config file. `RUST_LOG` overrides it.
    pub directive: Option<String>,
}

impl TelemetryConfig {
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };

        Self {
            service_name: service_name.into(),
            console_level,
            directive: None,
        }
    }

    pub fn with_level(mut self, directive: Option<&str>) -> Self {
        self.directive = directive.map(str::to_owned);
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let fallback = self.console_level.as_str().to_lowercase();
            EnvFilter::try_new(self.directive.as_deref().unwrap_or(&fallback))
                .unwrap_or_else(|_| EnvFilter::new(fallback))
        })
    }
}

/// Install the global subscriber.
///
/// Returns `false` when one was already installed.
pub fn init(config: TelemetryConfig) -> bool {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(config.env_filter());

    let installed = tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(service = %config.service_name, "telemetry initialized");
    }
    installed
}
