//! # Authority Node Service
//!
//! Wires the ledger to a transport and runs the single worker that owns
//! message dispatch. Listener tasks inside the transport may be many; they
//! all feed one inbox, and only the worker takes from it.
//!
//! | Inbound | Action | Reply |
//! |---------|--------|-------|
//! | `TransferRequest` | `handle_transfer_order` | `TransferResponse` to sender |
//! | `ConfirmationRequest` | `handle_confirmation_order` | `ConfirmationResponse` to sender |
//! | `SyncRequest` | summarize requested accounts | `SyncResponse` to sender |
//! | `SyncResponse` | count the sync | none |
//! | `PeerDiscovery` | remember authority peers | none |
//! | `Heartbeat` | debug log | none |
//! | anything else | debug log, drop | none |

use crate::config::AuthorityConfig;
use crate::domain::AuthorityLedger;
use crate::error::{AuthorityError, AuthorityResult};
use crate::metrics::{MetricsCollector, PerformanceStats};
use crate::ports::AuthorityApi;
use async_trait::async_trait;
use mp_01_committee::Committee;
use parking_lot::{Mutex, RwLock};
use shared_transport::NetworkTransport;
use shared_types::{
    unix_timestamp, Address, AuthorityState, ConfirmationOrder, ConfirmationResponse, Message,
    MessageBody, NodeType, SignedTransferOrder, SyncRequest, SyncResponse, TokenBalance,
    TokenRegistry, TransferOrder, TransferResponse,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// State shared between the public handle and the worker task.
struct Shared {
    address: Address,
    ledger: RwLock<AuthorityLedger>,
    metrics: Mutex<MetricsCollector>,
    peers: RwLock<BTreeMap<String, Address>>,
    transport: Arc<dyn NetworkTransport>,
}

struct Worker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// A running (or runnable) authority.
pub struct AuthorityNode {
    config: AuthorityConfig,
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl AuthorityNode {
    pub fn new(
        config: AuthorityConfig,
        transport: Arc<dyn NetworkTransport>,
        tokens: TokenRegistry,
    ) -> Self {
        let address = transport.local_address().clone();
        let mut state = AuthorityState::new(
            config.name.clone(),
            address.clone(),
            config.committee_members.iter().cloned().collect(),
        );
        state.shard_assignments = config.shard_assignments.iter().cloned().collect();

        Self {
            shared: Arc::new(Shared {
                address,
                ledger: RwLock::new(AuthorityLedger::new(state, tokens)),
                metrics: Mutex::new(MetricsCollector::new()),
                peers: RwLock::new(BTreeMap::new()),
                transport,
            }),
            config,
            worker: Mutex::new(None),
        }
    }

    /// Attach the committee; accepted transfers then carry a weighted
    /// certificate.
    pub fn with_committee(self, committee: Arc<Committee>) -> Self {
        self.shared.ledger.write().set_committee(committee);
        self
    }

    /// Push this authority's transaction and error counters into the
    /// committee, shifting everyone's voting weight. Called by whatever
    /// drives weight updates, not per transfer.
    pub fn publish_performance(&self) {
        self.shared.ledger.read().publish_performance();
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn address(&self) -> &Address {
        &self.shared.address
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map(|w| !w.handle.is_finished())
            .unwrap_or(false)
    }

    /// Owned copy of the current authority state.
    pub fn state(&self) -> AuthorityState {
        self.shared.ledger.read().state().clone()
    }

    // =========================================================================
    // ACCOUNTS
    // =========================================================================

    pub fn open_account(&self, address: &str, initial: &HashMap<String, u64>) -> AuthorityResult<()> {
        self.shared.ledger.write().open_account(address, initial)
    }

    pub fn credit_account(&self, address: &str, token: &str, amount: u64) -> AuthorityResult<()> {
        self.shared.ledger.write().credit_account(address, token, amount)
    }

    pub fn clear_pending_confirmation(
        &self,
        address: &str,
    ) -> AuthorityResult<Option<SignedTransferOrder>> {
        self.shared.ledger.write().clear_pending_confirmation(address)
    }

    pub fn get_account_balances(&self, address: &str) -> Option<HashMap<String, TokenBalance>> {
        self.shared.ledger.read().get_account_balances(address).cloned()
    }

    /// Result-returning form of [`AuthorityApi::handle_confirmation_order`].
    pub fn apply_confirmation(&self, confirmation: ConfirmationOrder) -> AuthorityResult<()> {
        self.shared.apply_confirmation(confirmation)
    }

    // =========================================================================
    // PEERS
    // =========================================================================

    pub fn add_peer(&self, peer: Address) {
        self.shared.add_peer(peer);
    }

    pub fn remove_peer(&self, name: &str) -> Option<Address> {
        let removed = self.shared.peers.write().remove(name);
        if removed.is_some() {
            info!(authority = %self.config.name, peer = name, "Peer removed");
        }
        removed
    }

    pub fn peers(&self) -> Vec<Address> {
        self.shared.peers.read().values().cloned().collect()
    }

    /// Send `body` to every known peer. Returns how many sends succeeded.
    pub async fn broadcast_to_peers(&self, body: MessageBody) -> usize {
        let peers = self.peers();
        let mut delivered = 0;
        for peer in peers {
            let message = Message::new(self.shared.address.clone(), Some(peer.clone()), body.clone());
            if self.shared.send(&message, &peer).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Ask every peer for its view of `accounts` (all accounts if empty).
    pub async fn sync_with_committee(&self, accounts: Vec<String>) -> usize {
        let last_sync_time = self.shared.ledger.read().state().last_sync_time;
        let sent = self
            .broadcast_to_peers(MessageBody::SyncRequest(SyncRequest {
                last_sync_time,
                account_addresses: accounts,
            }))
            .await;
        self.shared.ledger.write().mark_synced();
        debug!(authority = %self.config.name, peers = sent, "Sync requested");
        sent
    }

    pub fn record_link_metrics(
        &self,
        peer: &str,
        latency_ms: Option<f64>,
        bandwidth_mbps: Option<f64>,
        connectivity_ratio: Option<f64>,
    ) {
        self.shared
            .metrics
            .lock()
            .record_link_metrics(peer, latency_ms, bandwidth_mbps, connectivity_ratio);
    }

    // =========================================================================
    // WORKER
    // =========================================================================

    async fn run_worker(shared: Arc<Shared>, receive_timeout: Duration, token: CancellationToken) {
        info!(authority = %shared.address.node_id, "Authority worker started");
        loop {
            let received = tokio::select! {
                _ = token.cancelled() => break,
                received = shared.transport.receive_message(receive_timeout) => received,
            };
            if let Some(message) = received {
                shared.process_message(message).await;
            }
        }
        info!(authority = %shared.address.node_id, "Authority worker stopped");
    }
}

#[async_trait]
impl AuthorityApi for AuthorityNode {
    async fn start_fastpay_services(&self) -> bool {
        if self.is_running() {
            warn!(authority = %self.config.name, error = %AuthorityError::AlreadyRunning, "Start ignored");
            return true;
        }
        if let Err(e) = self.shared.transport.connect().await {
            error!(authority = %self.config.name, error = %e, "Failed to connect transport");
            return false;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(Self::run_worker(
            Arc::clone(&self.shared),
            self.config.receive_timeout(),
            token.clone(),
        ));
        *self.worker.lock() = Some(Worker { token, handle });
        info!(
            authority = %self.config.name,
            transport = self.shared.transport.kind_name(),
            address = %self.shared.address,
            "Authority started"
        );
        true
    }

    async fn stop_fastpay_services(&self) {
        let worker = self.worker.lock().take();
        self.shared.transport.disconnect().await;
        if let Some(Worker { token, handle }) = worker {
            token.cancel();
            if tokio::time::timeout(self.config.shutdown_timeout(), handle)
                .await
                .is_err()
            {
                warn!(authority = %self.config.name, "Worker did not stop within timeout");
            }
        }
        info!(authority = %self.config.name, "Authority stopped");
    }

    fn handle_transfer_order(&self, order: TransferOrder) -> TransferResponse {
        self.shared.handle_transfer_order(order)
    }

    fn handle_confirmation_order(&self, confirmation: ConfirmationOrder) -> bool {
        self.shared.apply_confirmation(confirmation).is_ok()
    }

    fn get_account_balance(&self, address: &str, token: &str) -> Option<u64> {
        self.shared.ledger.read().get_account_balance(address, token)
    }

    fn get_performance_stats(&self) -> PerformanceStats {
        self.shared.metrics.lock().stats()
    }

    fn state_snapshot(&self) -> AuthorityResult<serde_json::Value> {
        self.shared.ledger.read().state_snapshot()
    }
}

impl Shared {
    fn name(&self) -> &str {
        &self.address.node_id
    }

    fn handle_transfer_order(&self, order: TransferOrder) -> TransferResponse {
        let response = self.ledger.write().handle_transfer_order(order);
        let mut metrics = self.metrics.lock();
        if response.success {
            metrics.record_transaction();
        } else {
            metrics.record_error();
        }
        response
    }

    fn apply_confirmation(&self, confirmation: ConfirmationOrder) -> AuthorityResult<()> {
        let result = self.ledger.write().handle_confirmation_order(confirmation);
        if result.is_err() {
            self.metrics.lock().record_error();
        }
        result
    }

    fn add_peer(&self, peer: Address) {
        if peer.node_id == self.address.node_id {
            return;
        }
        info!(authority = %self.name(), peer = %peer, "Peer added");
        self.peers.write().insert(peer.node_id.clone(), peer);
    }

    async fn send(&self, message: &Message, target: &Address) -> AuthorityResult<()> {
        let message_type = message.message_type();
        match self.transport.send_message(message, target).await {
            Ok(()) => {
                mesh_telemetry::metrics::record_message_sent(message_type.as_str());
                Ok(())
            }
            Err(e) => {
                mesh_telemetry::metrics::record_send_failure();
                self.metrics.lock().record_error();
                warn!(
                    authority = %self.name(),
                    target = %target,
                    message_type = %message_type,
                    error = %e,
                    "Send failed"
                );
                Err(e.into())
            }
        }
    }

    async fn reply(&self, to: &Address, body: MessageBody) {
        let message = Message::new(self.address.clone(), Some(to.clone()), body);
        let _ = self.send(&message, to).await;
    }

    async fn process_message(&self, message: Message) {
        mesh_telemetry::metrics::record_message_received(message.message_type().as_str());
        let Message { sender, body, .. } = message;
        match body {
            MessageBody::TransferRequest(request) => {
                let response = self.handle_transfer_order(request.transfer_order);
                self.reply(&sender, MessageBody::TransferResponse(response)).await;
            }
            MessageBody::ConfirmationRequest(request) => {
                let order_id = request.confirmation_order.order_id;
                let result = self.apply_confirmation(request.confirmation_order);
                let response = ConfirmationResponse {
                    order_id,
                    success: result.is_ok(),
                    error_message: result.err().map(|e| e.to_string()),
                };
                self.reply(&sender, MessageBody::ConfirmationResponse(response)).await;
            }
            MessageBody::SyncRequest(request) => {
                let accounts = self.ledger.read().account_summaries(&request.account_addresses);
                let response = SyncResponse {
                    authority: self.name().to_string(),
                    accounts,
                };
                self.reply(&sender, MessageBody::SyncResponse(response)).await;
            }
            MessageBody::SyncResponse(response) => {
                self.metrics.lock().record_sync();
                self.ledger.write().mark_synced();
                debug!(
                    authority = %self.name(),
                    from = %response.authority,
                    accounts = response.accounts.len(),
                    "Sync response received"
                );
            }
            MessageBody::PeerDiscovery(discovery) => {
                if discovery.node_info.node_type == NodeType::Authority {
                    self.add_peer(discovery.node_info);
                }
            }
            MessageBody::Heartbeat(_) => {
                debug!(authority = %self.name(), from = %sender, at = unix_timestamp(), "Heartbeat");
            }
            other => {
                debug!(
                    authority = %self.name(),
                    from = %sender,
                    message_type = %other.message_type(),
                    "Unhandled message dropped"
                );
            }
        }
    }
}
