//! Prometheus metrics for MeshPay nodes.
//!
//! All metrics follow the naming convention: `meshpay_<area>_<metric>_<unit>`
//!
//! Collectors are created lazily and only exported once
//! [`register_metrics`] has added them to [`REGISTRY`]. Recording into an
//! unregistered collector is harmless, so library code can record
//! unconditionally.

use crate::TelemetryError;
use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};

lazy_static! {
    /// Registry the node exports.
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // AUTHORITY
    // =========================================================================

    /// Transfer orders accepted (phase one).
    pub static ref TRANSFERS_ACCEPTED: IntCounter = IntCounter::new(
        "meshpay_authority_transfers_accepted_total",
        "Transfer orders accepted and countersigned"
    ).expect("metric creation failed");

    /// Transfer orders rejected, by reason.
    pub static ref TRANSFERS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("meshpay_authority_transfers_rejected_total", "Transfer orders rejected"),
        &["reason"]
    ).expect("metric creation failed");

    /// Confirmations applied to balances.
    pub static ref CONFIRMATIONS_APPLIED: IntCounter = IntCounter::new(
        "meshpay_authority_confirmations_applied_total",
        "Confirmation orders applied"
    ).expect("metric creation failed");

    /// Confirmations rejected, by reason.
    pub static ref CONFIRMATIONS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("meshpay_authority_confirmations_rejected_total", "Confirmation orders rejected"),
        &["reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // CLIENT
    // =========================================================================

    /// Quorums assembled by clients, by rule.
    pub static ref QUORUMS_REACHED: IntCounterVec = IntCounterVec::new(
        Opts::new("meshpay_client_quorums_reached_total", "Certificate quorums assembled"),
        &["rule"]
    ).expect("metric creation failed");

    /// Time from transfer broadcast to quorum.
    pub static ref QUORUM_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "meshpay_client_quorum_latency_seconds",
            "Time from transfer broadcast to certificate quorum"
        ).buckets(exponential_buckets(0.001, 2.0, 15).unwrap_or_default())
    ).expect("metric creation failed");

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    pub static ref MESSAGES_SENT: IntCounterVec = IntCounterVec::new(
        Opts::new("meshpay_transport_messages_sent_total", "Messages handed to the transport"),
        &["message_type"]
    ).expect("metric creation failed");

    pub static ref MESSAGES_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("meshpay_transport_messages_received_total", "Messages taken from the transport"),
        &["message_type"]
    ).expect("metric creation failed");

    pub static ref SEND_FAILURES: IntCounter = IntCounter::new(
        "meshpay_transport_send_failures_total",
        "Messages the transport failed to deliver"
    ).expect("metric creation failed");
}

/// Marker returned by [`register_metrics`].
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle;

/// Register every collector with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TRANSFERS_ACCEPTED.clone()),
        Box::new(TRANSFERS_REJECTED.clone()),
        Box::new(CONFIRMATIONS_APPLIED.clone()),
        Box::new(CONFIRMATIONS_REJECTED.clone()),
        Box::new(QUORUMS_REACHED.clone()),
        Box::new(QUORUM_LATENCY.clone()),
        Box::new(MESSAGES_SENT.clone()),
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(SEND_FAILURES.clone()),
    ];
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(MetricsHandle)
}

/// Text exposition of every registered metric.
pub fn gather_text() -> Result<String, TelemetryError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

pub fn record_transfer_accepted() {
    TRANSFERS_ACCEPTED.inc();
}

pub fn record_transfer_rejected(reason: &str) {
    TRANSFERS_REJECTED.with_label_values(&[reason]).inc();
}

pub fn record_confirmation_applied() {
    CONFIRMATIONS_APPLIED.inc();
}

pub fn record_confirmation_rejected(reason: &str) {
    CONFIRMATIONS_REJECTED.with_label_values(&[reason]).inc();
}

pub fn record_quorum_reached(rule: &str, latency_seconds: f64) {
    QUORUMS_REACHED.with_label_values(&[rule]).inc();
    QUORUM_LATENCY.observe(latency_seconds);
}

pub fn record_message_sent(message_type: &str) {
    MESSAGES_SENT.with_label_values(&[message_type]).inc();
}

pub fn record_message_received(message_type: &str) {
    MESSAGES_RECEIVED.with_label_values(&[message_type]).inc();
}

pub fn record_send_failure() {
    SEND_FAILURES.inc();
}
