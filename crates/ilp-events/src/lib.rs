//! Claim event envelope codec and subscription matching for the optional
//! private-messaging gateway.

pub mod envelope;
pub mod event;
pub mod filter;
pub mod subscription;

pub use envelope::{ClaimEventEnvelope, EnvelopeError};
pub use event::{NostrEvent, Tag};
pub use filter::Filter;
pub use subscription::{Subscription, SubscriptionError, SubscriptionManager, DEFAULT_PER_PEER_CAP};
