//! One module per chain family, each behind the shared [`crate::provider::ChainClaimProvider`] trait.

pub mod aptos;
pub mod evm;
pub mod xrp;

pub use aptos::AptosClaimProvider;
pub use evm::EvmClaimProvider;
pub use xrp::{canonicalize_channel_id, XrpClaimProvider};
