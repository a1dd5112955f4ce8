pub mod agreement;
pub mod double_spend;
pub mod flows;
pub mod link_failure;
pub mod quorum_rules;
pub mod tcp_loopback;
