//! # Inbound Port - ClientApi
//!
//! The calls a wallet front-end or benchmark driver makes on a client.
//! Delivery failure and quorum failure are reported separately: `transfer`
//! fails fast when no authority is reachable, while a missing quorum only
//! shows up in `broadcast_confirmation` or `wait_for_quorum`.

use crate::error::ClientResult;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait ClientApi: Send + Sync {
    async fn start_fastpay_services(&self) -> bool;

    async fn stop_fastpay_services(&self);

    /// Broadcast a new transfer order. `true` if at least one authority
    /// accepted delivery.
    async fn transfer(&self, recipient: &str, token_address: &str, amount: u64) -> bool;

    /// Send the confirmation once quorum holds. Returns the number of
    /// authorities it was delivered to.
    async fn broadcast_confirmation(&self) -> ClientResult<usize>;

    /// Poll until the pending transfer reaches quorum or `timeout` expires.
    async fn wait_for_quorum(&self, timeout: Duration) -> bool;
}
