//! Committee domain logic.

pub mod committee;
pub mod quorum;
