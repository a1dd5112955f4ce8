//! Telemetry configuration from environment variables.

use std::env;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,

    /// Node identifier, e.g. `auth1`.
    pub node_id: String,

    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    pub json_logs: bool,

    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "meshpay".to_string(),
            node_id: "node".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("MESHPAY_SERVICE_NAME").unwrap_or_else(|_| "meshpay".to_string()),

            node_id: env::var("MESHPAY_NODE_ID").unwrap_or_else(|_| "node".to_string()),

            log_level: env::var("MESHPAY_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("MESHPAY_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),

            metrics_enabled: env::var("MESHPAY_METRICS")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
        }
    }

    /// Configuration for one node, e.g. `for_node("auth1", "authority")`.
    pub fn for_node(node_id: &str, role: &str) -> Self {
        let mut config = Self::from_env();
        config.node_id = node_id.to_string();
        config.service_name = format!("meshpay-{role}");
        config
    }
}
