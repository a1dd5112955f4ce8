//! # Quorum Rules
//!
//! Equal-weight counts distinct certificates against `2/3·n + 1`; weighted
//! sums the weights authorities froze into their certificates.

#[cfg(test)]
mod tests {
    use crate::harness::{eventually, transfer_and_confirm, Cluster, STEP_TIMEOUT, XTZ};
    use mp_01_committee::QuorumRule;
    use mp_02_authority::AuthorityApi;
    use mp_03_client::ClientApi;
    use shared_types::TransferOrder;
    use std::time::Duration;

    #[tokio::test]
    async fn test_equal_weight_needs_all_four_of_four() {
        let cluster = Cluster::start(4, &[("alice", 100)]).await;
        cluster.take_link_down(3);
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;

        assert!(alice.transfer("bob", XTZ, 10).await);
        assert!(eventually(STEP_TIMEOUT, || alice.state().sent_certificates.len() == 3).await);
        assert!(!alice.wait_for_quorum(Duration::from_millis(200)).await);

        let progress = alice.quorum_progress();
        assert_eq!(progress.have, 3.0);
        assert!(progress.need > 3.0 && progress.need < 4.0);
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_weighted_tolerates_one_silent_authority() {
        let cluster = Cluster::start_weighted(4, &[("alice", 100)]).await;
        cluster.take_link_down(3);
        let alice = cluster.client("alice", 9001, QuorumRule::Weighted, 100).await;

        assert_eq!(transfer_and_confirm(&alice, "bob", 10).await, 3);
        assert!(eventually(STEP_TIMEOUT, || {
            cluster.balances("bob")[..3] == [Some(10), Some(10), Some(10)]
        })
        .await);
        assert_eq!(cluster.balances("alice")[3], Some(100));
        assert_eq!(cluster.balances("bob")[3], None);
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_weights_follow_published_performance() {
        let cluster = Cluster::start_weighted(3, &[("alice", 100)]).await;
        let committee = cluster.committee.clone().unwrap();
        let alice = cluster.client("alice", 9001, QuorumRule::Weighted, 100).await;

        transfer_and_confirm(&alice, "bob", 10).await;
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob") == vec![Some(10); 3]).await);

        // auth3 rejects two bad orders: one accepted, two errors, net zero.
        let bad = TransferOrder::new("alice", "alice", XTZ, 1, 2);
        for _ in 0..2 {
            assert!(!cluster.authorities[2].handle_transfer_order(bad.clone()).success);
        }
        for authority in &cluster.authorities {
            authority.publish_performance();
        }
        assert!((committee.get_authority_weight("auth1") - 0.5).abs() < 1e-9);
        assert!((committee.get_authority_weight("auth3")).abs() < 1e-9);

        assert!(alice.transfer("bob", XTZ, 10).await);
        assert!(eventually(STEP_TIMEOUT, || alice.state().weighted_certificates.len() == 3).await);
        let progress = alice.quorum_progress();
        assert!((progress.have - 1.0).abs() < 1e-9);
        assert!(alice.has_quorum());
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_weighted_quorum_not_reached_below_threshold() {
        let cluster = Cluster::start_weighted(4, &[("alice", 100)]).await;
        cluster.take_link_down(2);
        cluster.take_link_down(3);
        let alice = cluster.client("alice", 9001, QuorumRule::Weighted, 100).await;

        assert!(alice.transfer("bob", XTZ, 10).await);
        assert!(eventually(STEP_TIMEOUT, || alice.state().weighted_certificates.len() == 2).await);
        assert!(!alice.has_quorum());
        assert!((alice.quorum_progress().have - 0.5).abs() < 1e-9);
        cluster.stop().await;
    }
}
