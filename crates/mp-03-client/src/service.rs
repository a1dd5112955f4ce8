//! # Client Node Service
//!
//! One worker drains the transport inbox and feeds the state machine:
//! `TransferResponse` into certificate collection, `ConfirmationRequest`
//! into recipient crediting. Everything else is logged and dropped.

use crate::config::ClientConfig;
use crate::domain::{ClientState, QuorumProgress};
use crate::error::{ClientError, ClientResult};
use crate::ports::ClientApi;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_transport::NetworkTransport;
use shared_types::{
    unix_timestamp, Address, ConfirmationOrder, ConfirmationRequest, Message, MessageBody,
    TransferRequest, TransferResponse,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const QUORUM_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct Shared {
    config: ClientConfig,
    state: RwLock<ClientState>,
    transport: Arc<dyn NetworkTransport>,
}

struct Worker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct ClientNode {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl ClientNode {
    /// Client talking to `config.committee` through `transport`.
    pub fn new(config: ClientConfig, transport: Arc<dyn NetworkTransport>) -> Self {
        let state = ClientState::new(
            config.name.clone(),
            transport.local_address().clone(),
            config.committee.clone(),
        );
        Self {
            shared: Arc::new(Shared {
                config,
                state: RwLock::new(state),
                transport,
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn address(&self) -> &Address {
        self.shared.transport.local_address()
    }

    /// Owned copy of the client state.
    pub fn state(&self) -> ClientState {
        self.shared.state.read().clone()
    }

    pub fn balance(&self) -> u64 {
        self.shared.state.read().balance
    }

    pub fn set_balance(&self, balance: u64) {
        self.shared.state.write().balance = balance;
    }

    pub fn sequence_number(&self) -> u64 {
        self.shared.state.read().sequence_number
    }

    pub fn quorum_progress(&self) -> QuorumProgress {
        self.shared.quorum_progress()
    }

    pub fn has_quorum(&self) -> bool {
        self.quorum_progress().reached()
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map(|w| !w.handle.is_finished())
            .unwrap_or(false)
    }

    /// Give up on the pending transfer. Returns the abandoned order.
    pub fn abandon_transfer(&self) -> Option<shared_types::TransferOrder> {
        let order = self.shared.state.write().abandon_transfer();
        if let Some(order) = &order {
            warn!(client = %self.name(), order_id = %order.order_id, "Pending transfer abandoned");
        }
        order
    }

    /// Feed one authority response into certificate collection.
    pub fn handle_transfer_response(&self, response: TransferResponse) -> bool {
        self.shared.handle_transfer_response(response)
    }

    /// Credit a confirmation addressed to this client.
    pub fn handle_confirmation_order(&self, confirmation: ConfirmationOrder) -> bool {
        self.shared.handle_confirmation_order(confirmation)
    }

    async fn run_worker(shared: Arc<Shared>, token: CancellationToken) {
        let receive_timeout = shared.config.receive_timeout();
        info!(client = %shared.config.name, "Client worker started");
        loop {
            let received = tokio::select! {
                _ = token.cancelled() => break,
                received = shared.transport.receive_message(receive_timeout) => received,
            };
            if let Some(message) = received {
                shared.process_message(message);
            }
        }
        info!(client = %shared.config.name, "Client worker stopped");
    }
}

#[async_trait]
impl ClientApi for ClientNode {
    async fn start_fastpay_services(&self) -> bool {
        if self.is_running() {
            return true;
        }
        if let Err(e) = self.shared.transport.connect().await {
            error!(client = %self.name(), error = %e, "Failed to connect transport");
            return false;
        }
        let token = CancellationToken::new();
        let handle = tokio::spawn(Self::run_worker(Arc::clone(&self.shared), token.clone()));
        *self.worker.lock() = Some(Worker { token, handle });
        info!(client = %self.name(), address = %self.address(), "Client started");
        true
    }

    async fn stop_fastpay_services(&self) {
        let worker = self.worker.lock().take();
        self.shared.transport.disconnect().await;
        if let Some(Worker { token, handle }) = worker {
            token.cancel();
            if tokio::time::timeout(self.shared.config.shutdown_timeout(), handle)
                .await
                .is_err()
            {
                warn!(client = %self.name(), "Worker did not stop within timeout");
            }
        }
        info!(client = %self.name(), "Client stopped");
    }

    async fn transfer(&self, recipient: &str, token_address: &str, amount: u64) -> bool {
        let (order, committee) = {
            let mut state = self.shared.state.write();
            match state.begin_transfer(recipient, token_address, amount) {
                Ok(order) => (order, state.committee.clone()),
                Err(e) => {
                    warn!(client = %self.name(), error = %e, "Transfer not started");
                    return false;
                }
            }
        };
        info!(
            client = %self.name(),
            order_id = %order.order_id,
            recipient,
            amount,
            authorities = committee.len(),
            "Broadcasting transfer request"
        );
        let order_id = order.order_id;
        let body = MessageBody::TransferRequest(TransferRequest {
            transfer_order: order,
        });
        match self.shared.broadcast(&committee, body).await {
            Ok(delivered) => {
                info!(client = %self.name(), delivered, total = committee.len(), "Transfer request delivered");
                true
            }
            Err(e) => {
                error!(client = %self.name(), error = %e, "Transfer request reached no authority");
                // No authority holds the order, so nothing blocks a new one.
                let mut state = self.shared.state.write();
                if state.pending_transfer.as_ref().map(|o| o.order_id) == Some(order_id) {
                    state.abandon_transfer();
                }
                false
            }
        }
    }

    async fn broadcast_confirmation(&self) -> ClientResult<usize> {
        let rule = self.shared.config.quorum_rule;
        let (confirmation, committee, started) = {
            let state = self.shared.state.read();
            match state.build_confirmation(rule, self.shared.config.quorum_threshold) {
                Ok(c) => (c, state.committee.clone(), state.transfer_started_at),
                Err(e) => {
                    warn!(client = %self.name(), error = %e, "Confirmation not sent");
                    return Err(e);
                }
            }
        };
        let order_id = confirmation.order_id;
        info!(
            client = %self.name(),
            %order_id,
            signatures = confirmation.authority_signatures.len(),
            "Broadcasting confirmation"
        );
        let body = MessageBody::ConfirmationRequest(ConfirmationRequest {
            confirmation_order: confirmation,
        });
        // State stays pending until some authority has the confirmation.
        let delivered = self.shared.broadcast(&committee, body).await?;

        if let Err(e) = self.shared.state.write().complete_confirmation(order_id) {
            debug!(client = %self.name(), %order_id, error = %e, "Confirmation already completed");
        }
        if let Some(started) = started {
            let rule_name = match rule {
                mp_01_committee::QuorumRule::EqualWeight => "equal_weight",
                mp_01_committee::QuorumRule::Weighted => "weighted",
            };
            mesh_telemetry::metrics::record_quorum_reached(
                rule_name,
                (unix_timestamp() - started).max(0.0),
            );
        }
        Ok(delivered)
    }

    async fn wait_for_quorum(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.has_quorum() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(QUORUM_POLL_INTERVAL).await;
        }
    }
}

impl Shared {
    fn quorum_progress(&self) -> QuorumProgress {
        self.state
            .read()
            .quorum_progress(self.config.quorum_rule, self.config.quorum_threshold)
    }

    fn handle_transfer_response(&self, response: TransferResponse) -> bool {
        let order_id = response.transfer_order.order_id;
        let result = {
            let mut state = self.state.write();
            let result = state.accept_response(response);
            if result.is_ok() && state.quorum_reached_time.is_none() {
                let progress = state.quorum_progress(self.config.quorum_rule, self.config.quorum_threshold);
                if progress.reached() {
                    state.quorum_reached_time = Some(unix_timestamp());
                    info!(client = %self.config.name, %order_id, have = progress.have, "Quorum reached");
                }
            }
            result
        };
        match result {
            Ok(()) => {
                debug!(client = %self.config.name, %order_id, "Certificate collected");
                true
            }
            Err(e) => {
                debug!(client = %self.config.name, %order_id, error = %e, "Response not counted");
                false
            }
        }
    }

    fn handle_confirmation_order(&self, confirmation: ConfirmationOrder) -> bool {
        let order_id = confirmation.order_id;
        let sender = confirmation.transfer_order.sender.clone();
        match self.state.write().receive_confirmation(confirmation) {
            Ok(amount) => {
                info!(client = %self.config.name, %order_id, %sender, amount, "Incoming transfer confirmed");
                true
            }
            Err(e) => {
                debug!(client = %self.config.name, %order_id, error = %e, "Confirmation ignored");
                false
            }
        }
    }

    /// Send `body` to every authority; error only if none was reached.
    async fn broadcast(&self, committee: &[Address], body: MessageBody) -> ClientResult<usize> {
        let sender = self.transport.local_address().clone();
        let mut delivered = 0;
        let mut last_error = None;
        for authority in committee {
            let message = Message::new(sender.clone(), Some(authority.clone()), body.clone());
            match self.transport.send_message(&message, authority).await {
                Ok(()) => {
                    mesh_telemetry::metrics::record_message_sent(message.message_type().as_str());
                    delivered += 1;
                }
                Err(e) => {
                    mesh_telemetry::metrics::record_send_failure();
                    warn!(client = %self.config.name, authority = %authority.node_id, error = %e, "Send failed");
                    last_error = Some(e.to_string());
                }
            }
        }
        if delivered == 0 {
            return Err(ClientError::Delivery(
                last_error.unwrap_or_else(|| "empty committee".to_string()),
            ));
        }
        Ok(delivered)
    }

    fn process_message(&self, message: Message) {
        mesh_telemetry::metrics::record_message_received(message.message_type().as_str());
        match message.body {
            MessageBody::TransferResponse(response) => {
                self.handle_transfer_response(response);
            }
            MessageBody::ConfirmationRequest(request) => {
                self.handle_confirmation_order(request.confirmation_order);
            }
            MessageBody::ConfirmationResponse(ack) => {
                debug!(
                    client = %self.config.name,
                    order_id = %ack.order_id,
                    from = %message.sender.node_id,
                    success = ack.success,
                    "Confirmation acknowledged"
                );
            }
            other => {
                debug!(
                    client = %self.config.name,
                    from = %message.sender,
                    message_type = %other.message_type(),
                    "Unhandled message dropped"
                );
            }
        }
    }
}
