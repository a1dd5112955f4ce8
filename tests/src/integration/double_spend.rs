//! # Double-Spend Defences
//!
//! | Attack | Stopped by |
//! |--------|------------|
//! | replaying a confirmation | `confirmed_transfers` lookup before re-validation |
//! | two orders for one sequence number | one pending order per account |
//! | spending the same funds twice in sequence | balance check at phase one |
//! | reusing an old sequence number | stale-sequence check |

#[cfg(test)]
mod tests {
    use crate::harness::{eventually, transfer_and_confirm, Cluster, STEP_TIMEOUT, XTZ};
    use mp_01_committee::QuorumRule;
    use mp_02_authority::{AuthorityApi, AuthorityError};
    use mp_03_client::{ClientApi, ClientError};
    use shared_types::TransferOrder;
    use std::time::Duration;

    #[tokio::test]
    async fn test_replayed_confirmation_applied_once() {
        let cluster = Cluster::start(3, &[("alice", 100)]).await;
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;
        transfer_and_confirm(&alice, "bob", 40).await;
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob") == vec![Some(40); 3]).await);

        for authority in &cluster.authorities {
            let confirmation = authority.state().accounts["alice"]
                .confirmed_transfers
                .values()
                .next()
                .cloned()
                .unwrap();
            let order_id = confirmation.order_id;
            assert_eq!(
                authority.apply_confirmation(confirmation),
                Err(AuthorityError::AlreadyConfirmed(order_id))
            );
            assert!(!authority.handle_confirmation_order(
                authority.state().accounts["alice"].confirmed_transfers[&order_id].clone()
            ));
        }
        assert_eq!(cluster.balances("alice"), vec![Some(60); 3]);
        assert_eq!(cluster.balances("bob"), vec![Some(40); 3]);
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_conflicting_order_rejected_while_pending() {
        let cluster = Cluster::start(3, &[("alice", 100)]).await;
        let to_bob = TransferOrder::new("alice", "bob", XTZ, 60, 1);
        let to_carol = TransferOrder::new("alice", "carol", XTZ, 60, 1);

        for authority in &cluster.authorities {
            assert!(authority.handle_transfer_order(to_bob.clone()).success);

            let response = authority.handle_transfer_order(to_carol.clone());
            assert!(!response.success);
            assert!(response
                .error_message
                .unwrap()
                .contains("awaiting confirmation"));

            // Re-sending the pending order itself is harmless.
            assert!(authority.handle_transfer_order(to_bob.clone()).success);
        }
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_spending_confirmed_funds_again_fails() {
        let cluster = Cluster::start(3, &[("alice", 100)]).await;
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;
        transfer_and_confirm(&alice, "bob", 60).await;
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob") == vec![Some(60); 3]).await);

        assert!(alice.transfer("carol", XTZ, 60).await);
        assert!(!alice.wait_for_quorum(Duration::from_millis(300)).await);
        assert!(matches!(
            alice.broadcast_confirmation().await,
            Err(ClientError::QuorumNotReached { .. })
        ));

        assert_eq!(cluster.balances("alice"), vec![Some(40); 3]);
        assert_eq!(cluster.balances("carol"), vec![None; 3]);
        for authority in &cluster.authorities {
            assert_eq!(authority.state().error_count, 1);
        }
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_stale_sequence_rejected() {
        let cluster = Cluster::start(3, &[("alice", 100)]).await;
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;
        transfer_and_confirm(&alice, "bob", 10).await;
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob") == vec![Some(10); 3]).await);

        let stale = TransferOrder::new("alice", "mallory", XTZ, 10, 0);
        for authority in &cluster.authorities {
            let response = authority.handle_transfer_order(stale.clone());
            assert!(!response.success);
            assert!(response.error_message.unwrap().contains("Stale sequence"));
        }
        cluster.stop().await;
    }
}
