//! Fixtures: a committee of running authorities and clients sharing one
//! in-memory mesh.

use mp_01_committee::{Committee, QuorumRule};
use mp_02_authority::{AuthorityApi, AuthorityConfig, AuthorityNode};
use mp_03_client::{ClientApi, ClientConfig, ClientNode};
use shared_transport::{InMemoryTransport, MeshNetwork};
use shared_types::{Address, AuthorityState, TokenRegistry, NATIVE_TOKEN_ADDRESS};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

pub const XTZ: &str = NATIVE_TOKEN_ADDRESS;

/// Upper bound for any single protocol step in tests.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(3);

pub fn authority_config(i: usize, members: &BTreeSet<String>) -> AuthorityConfig {
    AuthorityConfig {
        name: format!("auth{}", i),
        ip_address: "10.0.0.1".to_string(),
        port: 8000 + i as u16,
        committee_members: members.clone(),
        receive_timeout_ms: 50,
        shutdown_timeout_ms: 500,
        ..AuthorityConfig::default()
    }
}

pub struct Cluster {
    pub mesh: Arc<MeshNetwork>,
    pub authorities: Vec<AuthorityNode>,
    pub committee: Option<Arc<Committee>>,
}

impl Cluster {
    /// `size` running authorities, each with `accounts` funded in XTZ.
    pub async fn start(size: usize, accounts: &[(&str, u64)]) -> Self {
        Self::build(size, accounts, false).await
    }

    /// Same, with a shared committee so responses carry weighted certificates.
    pub async fn start_weighted(size: usize, accounts: &[(&str, u64)]) -> Self {
        Self::build(size, accounts, true).await
    }

    async fn build(size: usize, accounts: &[(&str, u64)], weighted: bool) -> Self {
        let mesh = MeshNetwork::new();
        let members: BTreeSet<String> = (1..=size).map(|i| format!("auth{}", i)).collect();
        let configs: Vec<AuthorityConfig> =
            (1..=size).map(|i| authority_config(i, &members)).collect();

        let committee = weighted.then(|| {
            let names: HashSet<String> = members.iter().cloned().collect();
            let states = configs
                .iter()
                .map(|c| AuthorityState::new(c.name.clone(), c.address(), names.clone()))
                .collect();
            Arc::new(Committee::new(states).expect("valid committee"))
        });

        let mut authorities = Vec::new();
        for config in &configs {
            let transport = Arc::new(InMemoryTransport::new(config.address(), Arc::clone(&mesh)));
            let mut node = AuthorityNode::new(config.clone(), transport, TokenRegistry::default());
            if let Some(committee) = &committee {
                node = node.with_committee(Arc::clone(committee));
            }
            for (account, amount) in accounts {
                let balances = HashMap::from([(XTZ.to_string(), *amount)]);
                node.open_account(account, &balances).expect("fresh account");
            }
            for peer in &configs {
                node.add_peer(peer.address());
            }
            assert!(node.start_fastpay_services().await, "authority failed to start");
            authorities.push(node);
        }

        Self {
            mesh,
            authorities,
            committee,
        }
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.authorities.iter().map(|a| a.address().clone()).collect()
    }

    /// Running client for `name` that believes it holds `balance`.
    pub async fn client(&self, name: &str, port: u16, rule: QuorumRule, balance: u64) -> ClientNode {
        let config = ClientConfig {
            name: name.to_string(),
            ip_address: "10.0.1.1".to_string(),
            port,
            receive_timeout_ms: 50,
            shutdown_timeout_ms: 500,
            quorum_rule: rule,
            committee: self.addresses(),
            ..ClientConfig::default()
        };
        let transport = Arc::new(InMemoryTransport::new(config.address(), Arc::clone(&self.mesh)));
        let client = ClientNode::new(config, transport);
        client.set_balance(balance);
        assert!(client.start_fastpay_services().await, "client failed to start");
        client
    }

    /// XTZ balance of `account` at every authority, in committee order.
    pub fn balances(&self, account: &str) -> Vec<Option<u64>> {
        self.authorities
            .iter()
            .map(|a| a.get_account_balance(account, XTZ))
            .collect()
    }

    pub fn take_link_down(&self, index: usize) {
        self.mesh.set_link_down(self.authorities[index].address(), true);
    }

    pub async fn stop(&self) {
        for authority in &self.authorities {
            authority.stop_fastpay_services().await;
        }
    }
}

/// Poll `check` every 10ms until it holds or `timeout` passes.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// One full transfer: order, quorum, confirmation, applied everywhere reachable.
pub async fn transfer_and_confirm(client: &ClientNode, recipient: &str, amount: u64) -> usize {
    assert!(client.transfer(recipient, XTZ, amount).await, "transfer not delivered");
    assert!(client.wait_for_quorum(STEP_TIMEOUT).await, "quorum not reached");
    client
        .broadcast_confirmation()
        .await
        .expect("confirmation delivered")
}
