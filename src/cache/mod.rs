//! Response cache for CMS reads.
//!
//! Gateway reads are stored as serialized payloads under keys derived from
//! the operation and its parameters:
//!
//! ```toml
//! [cache]
//! duration_seconds = 3600
//! capacity = 1024
//! warm_on_startup = false
//! ```

mod config;
mod keys;
mod store;

pub use config::{CacheConfig, ttl_from_seconds};
pub use keys::CacheKey;
pub use store::{CacheStore, MemoryCacheStore};
