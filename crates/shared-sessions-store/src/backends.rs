//! Distributed cache backends

pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use self::memory::InMemoryDistributedCache;
#[cfg(feature = "redis-backend")]
pub use self::redis::RedisDistributedCache;
