//! ballotbox - Off-chain voting registry
//!
//! Simulates and validates a token-weighted voting contract without a node.
//!
//! Key principles:
//! - Deterministic state machine (time and balances are inputs, never read implicitly)
//! - One vote per voter per topic, only before the deadline
//! - Tallies stay zero until a one-time, token-weighted finalization
//! - Every rejected call leaves state untouched
//!
//! The ledger (block time, token balances) is reached through the
//! [`ledger::LedgerClient`] trait; [`service::RegistryService`] wires the two.

pub mod address;
pub mod ledger;
pub mod registry;
pub mod serialization;
pub mod service;

pub use address::Address;
pub use registry::{CreateTopic, RegistryError, VotingRegistry};
pub use service::{RegistryService, ServiceError};
