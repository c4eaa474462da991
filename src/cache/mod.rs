//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → key.rs (fingerprint: method, URL as received, peer address)
//!     → store.rs lookup
//!         hit  → replay cached status + headers, no upstream contact
//!         miss → proxy round trip → snapshot.rs capture → store.rs put
//! ```
//!
//! # Design Decisions
//! - Only the response head is cached, never the body
//! - Entries never expire and are never evicted; the store grows with the
//!   number of distinct fingerprints (known limitation)
//! - Concurrent access goes through a sharded concurrent map

pub mod key;
pub mod snapshot;
pub mod store;

pub use key::CacheKey;
pub use snapshot::CachedResponse;
pub use store::CacheStore;
