//! Multi-chain settlement claims: signing, verification, monotonicity
//! enforcement, storage, and submission dispatch.

pub mod chain;
pub mod claim;
pub mod error;
pub mod manager;
pub mod provider;
pub mod store;
pub mod submitter;

pub use chain::{canonicalize_channel_id, AptosClaimProvider, EvmClaimProvider, XrpClaimProvider};
pub use claim::{Chain, Claim};
pub use error::ClaimError;
pub use manager::{ClaimManager, ClaimRequest, ProcessResult, ReceivedClaimEvent, SettlementOutcome};
pub use provider::ChainClaimProvider;
pub use store::{ClaimStore, MemoryClaimStore};
pub use submitter::{ChainSubmitter, FailingSubmitter, StubSubmitter};
