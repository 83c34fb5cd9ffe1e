//! Distributed cache capability
//!
//! Sessions persist one record per key in a [`DistributedCache`]. Entries
//! expire after a sliding window: every `get` or `refresh` pushes the
//! deadline out again.

use async_trait::async_trait;
use std::time::Duration;

/// Cache backend error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
	/// Backend could not be reached
	#[error("Connection error: {0}")]
	Connection(String),

	/// Backend rejected or failed the command
	#[error("Backend error: {0}")]
	Backend(String),

	/// A stored value could not be interpreted
	#[error("Corrupt entry: {0}")]
	Corrupt(String),
}

/// Byte-valued cache with sliding expiration
#[async_trait]
pub trait DistributedCache: Send + Sync {
	/// Read an entry, sliding its expiration
	async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

	/// Write an entry that expires `sliding_expiration` after its last access
	async fn set(
		&self,
		key: &str,
		value: Vec<u8>,
		sliding_expiration: Duration,
	) -> Result<(), CacheError>;

	/// Slide the expiration of an entry without reading it
	async fn refresh(&self, key: &str) -> Result<(), CacheError>;

	/// Remove an entry. Removing a missing entry succeeds.
	async fn remove(&self, key: &str) -> Result<(), CacheError>;
}
