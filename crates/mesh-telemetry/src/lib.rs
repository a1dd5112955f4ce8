//! # Mesh Telemetry
//!
//! Logging and metrics shared by MeshPay nodes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesh_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::for_node("auth1", "authority");
//! let _handle = init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MESHPAY_SERVICE_NAME` | `meshpay` | Service name in log lines |
//! | `MESHPAY_LOG_LEVEL` or `RUST_LOG` | `info` | Log filter |
//! | `MESHPAY_JSON_LOGS` | `false` | JSON formatted logs |
//! | `MESHPAY_METRICS` | `true` | Register Prometheus collectors |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{gather_text, register_metrics, MetricsHandle};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install log subscriber: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install logging and register metrics.
///
/// Metrics registration is skipped when `metrics_enabled` is false.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<Option<MetricsHandle>, TelemetryError> {
    init_logging(config)?;
    if config.metrics_enabled {
        register_metrics().map(Some)
    } else {
        Ok(None)
    }
}
