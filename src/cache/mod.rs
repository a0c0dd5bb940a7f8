//! Query cache layer: one process-wide cache of server resources.
//!
//! This module is domain-agnostic. It provides:
//! - structured resource keys with prefix matching ([`ResourceKey`]);
//! - request deduplication, staleness windows, and stale-while-revalidate;
//! - key-prefix invalidation with eager refetch for subscribed consumers;
//! - subscription-gated periodic polling and idle-entry garbage collection.
//!
//! The cache holds no authoritative state: every entry is a disposable,
//! re-fetchable projection of a server resource.

mod key;
mod store;

pub use key::ResourceKey;
pub use store::{CacheSnapshot, QueryCache, QueryOptions, Subscription};
