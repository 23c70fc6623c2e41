//! Things Cache — backends for the `things-core` cache traits.
//!
//! - [`MemoryCache`]: single-process keyspace behind one lock
//! - [`RedisCache`]: shared Redis keyspace with atomic pipelines
//!
//! Both use the key schema in [`keys`].

mod config;
mod error;
pub mod keys;
mod memory;
mod redis_cache;

pub use config::{CacheBackend, CacheConfig};
pub use error::CacheError;
pub use memory::{MemoryCache, MemoryGroupCache, MemoryProfileCache, MemoryThingCache};
pub use redis_cache::{RedisCache, RedisGroupCache, RedisProfileCache, RedisThingCache};
