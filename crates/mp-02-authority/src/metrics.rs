//! # Authority Performance Metrics
//!
//! Node-local counters and link quality, reported through
//! `get_performance_stats()`. Prometheus export lives in `mesh-telemetry`;
//! this collector is what a dashboard reads from the state snapshot side.

use serde::Serialize;
use shared_types::{unix_timestamp, NetworkMetrics};
use std::collections::{BTreeMap, VecDeque};

/// Samples kept per peer link.
pub const ROLLING_WINDOW: usize = 20;

/// Mean over the most recent `capacity` samples.
#[derive(Debug, Clone)]
pub struct RollingAverage {
    values: VecDeque<f64>,
    capacity: usize,
    sum: f64,
}

impl Default for RollingAverage {
    fn default() -> Self {
        Self::new(ROLLING_WINDOW)
    }
}

impl RollingAverage {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            sum: 0.0,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.capacity {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
    }

    /// 0.0 when empty.
    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Default, Clone)]
struct PeerLink {
    latency_ms: RollingAverage,
    bandwidth_mbps: RollingAverage,
    connectivity_ratio: RollingAverage,
}

/// Averaged link quality to one peer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerLinkStats {
    pub latency_ms: f64,
    pub bandwidth_mbps: f64,
    pub connectivity_ratio: f64,
}

/// Output of [`MetricsCollector::stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub transaction_count: u64,
    pub error_count: u64,
    pub sync_count: u64,
    pub network_metrics: NetworkMetrics,
    pub peer_metrics: BTreeMap<String, PeerLinkStats>,
}

/// Collector owned by one authority node.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    network_metrics: NetworkMetrics,
    peers: BTreeMap<String, PeerLink>,
    transaction_count: u64,
    error_count: u64,
    sync_count: u64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            network_metrics: NetworkMetrics {
                last_update: unix_timestamp(),
                ..NetworkMetrics::default()
            },
            peers: BTreeMap::new(),
            transaction_count: 0,
            error_count: 0,
            sync_count: 0,
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transaction(&mut self) {
        self.transaction_count += 1;
    }

    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    pub fn record_sync(&mut self) {
        self.sync_count += 1;
    }

    pub fn update_network_metrics(&mut self, metrics: NetworkMetrics) {
        self.network_metrics = metrics;
    }

    /// Record raw samples for the link to `peer`. `None` fields are skipped.
    pub fn record_link_metrics(
        &mut self,
        peer: &str,
        latency_ms: Option<f64>,
        bandwidth_mbps: Option<f64>,
        connectivity_ratio: Option<f64>,
    ) {
        let link = self.peers.entry(peer.to_string()).or_default();
        if let Some(v) = latency_ms {
            link.latency_ms.add(v);
        }
        if let Some(v) = bandwidth_mbps {
            link.bandwidth_mbps.add(v);
        }
        if let Some(v) = connectivity_ratio {
            link.connectivity_ratio.add(v);
        }
    }

    pub fn stats(&self) -> PerformanceStats {
        PerformanceStats {
            transaction_count: self.transaction_count,
            error_count: self.error_count,
            sync_count: self.sync_count,
            network_metrics: self.network_metrics.clone(),
            peer_metrics: self
                .peers
                .iter()
                .map(|(peer, link)| {
                    (
                        peer.clone(),
                        PeerLinkStats {
                            latency_ms: link.latency_ms.average(),
                            bandwidth_mbps: link.bandwidth_mbps.average(),
                            connectivity_ratio: link.connectivity_ratio.average(),
                        },
                    )
                })
                .collect(),
        }
    }
}
