//! # Link Failures
//!
//! Mesh links drop without warning. A transfer only fails outright when no
//! authority can be reached; everything else degrades to a missing quorum.

#[cfg(test)]
mod tests {
    use crate::harness::{eventually, transfer_and_confirm, Cluster, STEP_TIMEOUT, XTZ};
    use mp_01_committee::QuorumRule;
    use mp_02_authority::AuthorityApi;
    use mp_03_client::ClientApi;

    #[tokio::test]
    async fn test_transfer_fails_when_committee_unreachable() {
        let cluster = Cluster::start(3, &[("alice", 100)]).await;
        for i in 0..3 {
            cluster.take_link_down(i);
        }
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;

        let dropped_before = cluster.mesh.messages_dropped();
        assert!(!alice.transfer("bob", XTZ, 10).await);
        assert_eq!(cluster.mesh.messages_dropped(), dropped_before + 3);
        assert_eq!(cluster.balances("alice"), vec![Some(100); 3]);
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_stopped_authority_is_unreachable() {
        let cluster = Cluster::start(3, &[("alice", 100)]).await;
        cluster.authorities[2].stop_fastpay_services().await;
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;

        assert!(alice.transfer("bob", XTZ, 10).await);
        assert!(eventually(STEP_TIMEOUT, || alice.state().sent_certificates.len() == 2).await);
        assert!(!alice.has_quorum());
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_confirmation_applies_at_authority_that_missed_the_order() {
        let cluster = Cluster::start_weighted(4, &[("alice", 100)]).await;
        cluster.take_link_down(3);
        let alice = cluster.client("alice", 9001, QuorumRule::Weighted, 100).await;

        assert!(alice.transfer("bob", XTZ, 25).await);
        assert!(alice.wait_for_quorum(STEP_TIMEOUT).await);
        assert!(cluster.authorities[3].state().accounts["alice"]
            .pending_confirmation
            .is_none());

        // Link back before phase two: the certificate carries the quorum.
        cluster.mesh.set_link_down(cluster.authorities[3].address(), false);
        assert_eq!(alice.broadcast_confirmation().await, Ok(4));

        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob") == vec![Some(25); 4]).await);
        assert_eq!(cluster.balances("alice"), vec![Some(75); 4]);
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_confirmation_resent_after_client_link_returns() {
        let cluster = Cluster::start(3, &[("alice", 100)]).await;
        let alice = cluster.client("alice", 9001, QuorumRule::EqualWeight, 100).await;

        assert!(alice.transfer("bob", XTZ, 30).await);
        assert!(alice.wait_for_quorum(STEP_TIMEOUT).await);

        cluster.mesh.set_link_down(alice.address(), true);
        assert!(alice.broadcast_confirmation().await.is_err());
        assert_eq!(alice.sequence_number(), 1);
        assert_eq!(cluster.balances("alice"), vec![Some(100); 3]);

        cluster.mesh.set_link_down(alice.address(), false);
        assert_eq!(alice.broadcast_confirmation().await, Ok(3));
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob") == vec![Some(30); 3]).await);

        // The account is not stuck: the next order goes through.
        assert_eq!(transfer_and_confirm(&alice, "bob", 10).await, 3);
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("alice") == vec![Some(60); 3]).await);
        cluster.stop().await;
    }

    #[tokio::test]
    async fn test_partitioned_authority_catches_up_on_next_transfer() {
        let cluster = Cluster::start_weighted(4, &[("alice", 100)]).await;
        cluster.take_link_down(3);
        let alice = cluster.client("alice", 9001, QuorumRule::Weighted, 100).await;

        transfer_and_confirm(&alice, "bob", 10).await;
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob")[0] == Some(10)).await);
        assert_eq!(cluster.balances("alice")[3], Some(100));

        // auth4 is one sequence number behind but still accepts the next order.
        cluster.mesh.set_link_down(cluster.authorities[3].address(), false);
        assert_eq!(transfer_and_confirm(&alice, "bob", 10).await, 4);
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob")[..3] == [Some(20); 3]).await);
        assert!(eventually(STEP_TIMEOUT, || cluster.balances("bob")[3] == Some(10)).await);
        cluster.stop().await;
    }
}
