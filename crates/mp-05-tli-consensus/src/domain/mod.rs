pub mod config;
pub mod types;

pub use config::{TliConfig, DEFAULT_MAX_ROUND_SKIPS};
pub use types::{hash_payload, Ballot, CommitCertificate, Proposal, RoundState, Vote, VoteKind};
