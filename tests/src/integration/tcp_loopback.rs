//! # TCP Loopback
//!
//! The same two-phase flow over real sockets: length-prefixed JSON frames,
//! ACK per frame, one listener per node.

#[cfg(test)]
mod tests {
    use crate::harness::{authority_config, eventually, transfer_and_confirm, STEP_TIMEOUT, XTZ};
    use mp_01_committee::QuorumRule;
    use mp_02_authority::{AuthorityApi, AuthorityNode};
    use mp_03_client::{ClientApi, ClientConfig, ClientNode};
    use shared_transport::{build_transport, StreamOptions, TransportKind};
    use shared_types::TokenRegistry;
    use std::collections::{BTreeSet, HashMap};

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    fn tcp() -> TransportKind {
        TransportKind::Tcp(StreamOptions::default())
    }

    async fn tcp_authorities(n: usize) -> Vec<AuthorityNode> {
        let members: BTreeSet<String> = (1..=n).map(|i| format!("auth{}", i)).collect();
        let mut nodes = Vec::new();
        for i in 1..=n {
            let mut config = authority_config(i, &members);
            config.ip_address = "127.0.0.1".to_string();
            config.port = free_port();
            config.transport = tcp();
            let transport = build_transport(&config.transport, config.address(), None).unwrap();
            let node = AuthorityNode::new(config, transport, TokenRegistry::default());
            node.open_account("alice", &HashMap::from([(XTZ.to_string(), 100)]))
                .unwrap();
            assert!(node.start_fastpay_services().await);
            nodes.push(node);
        }
        nodes
    }

    async fn tcp_client(authorities: &[AuthorityNode]) -> ClientNode {
        let config = ClientConfig {
            name: "alice".to_string(),
            ip_address: "127.0.0.1".to_string(),
            port: free_port(),
            receive_timeout_ms: 50,
            shutdown_timeout_ms: 500,
            quorum_rule: QuorumRule::EqualWeight,
            transport: tcp(),
            committee: authorities.iter().map(|a| a.address().clone()).collect(),
            ..ClientConfig::default()
        };
        let transport = build_transport(&config.transport, config.address(), None).unwrap();
        let client = ClientNode::new(config, transport);
        client.set_balance(100);
        assert!(client.start_fastpay_services().await);
        client
    }

    #[tokio::test]
    async fn test_transfer_over_tcp() {
        let authorities = tcp_authorities(3).await;
        let alice = tcp_client(&authorities).await;

        assert_eq!(transfer_and_confirm(&alice, "bob", 35).await, 3);
        assert!(eventually(STEP_TIMEOUT, || {
            authorities
                .iter()
                .all(|a| a.get_account_balance("bob", XTZ) == Some(35))
        })
        .await);
        for authority in &authorities {
            assert_eq!(authority.get_account_balance("alice", XTZ), Some(65));
        }

        alice.stop_fastpay_services().await;
        for authority in &authorities {
            authority.stop_fastpay_services().await;
        }
    }

    #[tokio::test]
    async fn test_stopped_tcp_authority_refuses_connections() {
        let authorities = tcp_authorities(3).await;
        authorities[0].stop_fastpay_services().await;
        let alice = tcp_client(&authorities).await;

        assert!(alice.transfer("bob", XTZ, 10).await);
        assert!(eventually(STEP_TIMEOUT, || alice.state().sent_certificates.len() == 2).await);
        assert!(!alice.has_quorum());

        alice.stop_fastpay_services().await;
        for authority in &authorities[1..] {
            authority.stop_fastpay_services().await;
        }
    }
}
