//! # Inbound Port - AuthorityApi
//!
//! What outside collaborators (a gateway, a dashboard, the CLI) may call on
//! a running authority. Everything else arrives over the transport.

use crate::error::AuthorityResult;
use crate::metrics::PerformanceStats;
use async_trait::async_trait;
use shared_types::{ConfirmationOrder, TransferOrder, TransferResponse};

#[async_trait]
pub trait AuthorityApi: Send + Sync {
    /// Bind the transport and spawn the worker. `false` if the transport
    /// cannot be brought up.
    async fn start_fastpay_services(&self) -> bool;

    /// Cancel the worker, disconnect, and wait a bounded time for exit.
    async fn stop_fastpay_services(&self);

    /// Phase one of a transfer.
    fn handle_transfer_order(&self, order: TransferOrder) -> TransferResponse;

    /// Phase two. `true` if the confirmation was applied.
    fn handle_confirmation_order(&self, confirmation: ConfirmationOrder) -> bool;

    /// MeshPay balance of `token` for `address`, if tracked.
    fn get_account_balance(&self, address: &str, token: &str) -> Option<u64>;

    fn get_performance_stats(&self) -> PerformanceStats;

    /// Read-only JSON view of the authority state.
    fn state_snapshot(&self) -> AuthorityResult<serde_json::Value>;
}
