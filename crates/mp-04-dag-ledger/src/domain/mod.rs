pub mod block;
pub mod ledger;

pub use block::{DagBlock, QuorumCertificate};
pub use ledger::{DagLedger, GENESIS_AUTHOR};
