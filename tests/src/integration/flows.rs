//! # Transfer Flows
//!
//! A client and a committee of authorities on one in-memory mesh:
//!
//! ```text
//! alice ──TransferRequest──► auth1..authN
//! alice ◄─TransferResponse── auth1..authN     (certificates)
//! alice ──ConfirmationRequest──► auth1..authN (debit alice, credit bob)
//! ```

#[cfg(test)]
mod tests {
    use crate::harness::{eventually, transfer_and_confirm, Cluster, STEP_TIMEOUT, XTZ};
    use mp_01_committee::QuorumRule;
    use mp_02_authority::AuthorityApi;
    use mp_03_client::ClientApi;

    #[tokio::test]
    async fn test_transfer_end_to_end() {
        let cluster = Cluster::start(4, &[("alice", 100)]).await;
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;

        assert_eq!(transfer_and_confirm(&alice, "bob", 30).await, 4);

        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob") == vec![Some(30); 4]).await);
        assert_eq!(cluster.balances("alice"), vec![Some(70); 4]);
        assert_eq!(alice.balance(), 70);
        assert_eq!(alice.sequence_number(), 2);

        for authority in &cluster.authorities {
            let state = authority.state();
            let account = &state.accounts["alice"];
            assert_eq!(account.sequence_number, 1);
            assert!(account.pending_confirmation.is_none());
            assert_eq!(account.confirmed_transfers.len(), 1);
            assert_eq!(state.transaction_count, 1);
            assert_eq!(state.error_count, 0);
        }

        alice.stop_fastpay_services().await;
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_sequential_transfers_advance_sequence() {
        let cluster = Cluster::start(3, &[("alice", 100)]).await;
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;

        transfer_and_confirm(&alice, "bob", 30).await;
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob") == vec![Some(30); 3]).await);

        transfer_and_confirm(&alice, "carol", 20).await;
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("carol") == vec![Some(20); 3]).await);

        assert_eq!(cluster.balances("alice"), vec![Some(50); 3]);
        assert_eq!(alice.sequence_number(), 3);
        for authority in &cluster.authorities {
            assert_eq!(authority.state().accounts["alice"].sequence_number, 2);
        }
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_balance_conserved_across_committee() {
        let cluster = Cluster::start(3, &[("alice", 100), ("bob", 40)]).await;
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;
        let bob = cluster.client("bob", 9002, QuorumRule::EqualWeight, 40).await;

        transfer_and_confirm(&alice, "bob", 25).await;
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob") == vec![Some(65); 3]).await);
        transfer_and_confirm(&bob, "alice", 5).await;
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("alice") == vec![Some(80); 3]).await);

        for authority in &cluster.authorities {
            let total: u64 = ["alice", "bob"]
                .iter()
                .filter_map(|a| authority.get_account_balance(a, XTZ))
                .sum();
            assert_eq!(total, 140);
        }
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_recipient_client_credited_once() {
        let cluster = Cluster::start(3, &[("alice", 100)]).await;
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;
        let bob = cluster.client("bob", 9002, QuorumRule::EqualWeight, 0).await;

        transfer_and_confirm(&alice, "bob", 30).await;
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob") == vec![Some(30); 3]).await);

        let confirmation = cluster.authorities[0].state().accounts["alice"]
            .confirmed_transfers
            .values()
            .next()
            .cloned()
            .unwrap();
        assert!(bob.handle_confirmation_order(confirmation.clone()));
        assert_eq!(bob.balance(), 30);
        assert!(!bob.handle_confirmation_order(confirmation));
        assert_eq!(bob.balance(), 30);
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_sync_between_authorities() {
        let cluster = Cluster::start(3, &[("alice", 100)]).await;
        assert_eq!(cluster.authorities[0].sync_with_committee(vec!["alice".into()]).await, 2);

        let requester = &cluster.authorities[0];
        assert!(eventually(STEP_TIMEOUT, || requester.get_performance_stats().sync_count >= 2).await);
        cluster.stop().await;
    }
}
