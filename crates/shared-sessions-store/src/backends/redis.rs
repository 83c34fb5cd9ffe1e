//! Redis distributed cache
//!
//! Lets a farm of servers share sessions. Redis only knows absolute TTLs, so
//! each value is stored behind an 8-byte big-endian header holding its
//! sliding window in seconds; reads and refreshes re-arm the TTL from it.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

use crate::cache::{CacheError, DistributedCache};

const HEADER_LEN: usize = 8;

/// Redis-backed cache with sliding expiration
#[derive(Clone)]
pub struct RedisDistributedCache {
	connection: ConnectionManager,
	key_prefix: String,
}

impl RedisDistributedCache {
	/// Connect to Redis
	///
	/// # Examples
	///
	/// ```no_run
	/// use shared_sessions_store::backends::RedisDistributedCache;
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let cache = RedisDistributedCache::new("redis://localhost:6379")
	///     .await?
	///     .with_key_prefix("sessions");
	/// # Ok(())
	/// # }
	/// ```
	pub async fn new(url: &str) -> Result<Self, CacheError> {
		let client = redis::Client::open(url)
			.map_err(|e| CacheError::Connection(format!("Invalid Redis URL: {}", e)))?;
		let connection = ConnectionManager::new(client)
			.await
			.map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

		tracing::info!(url = %url, "connected to redis session cache");

		Ok(Self {
			connection,
			key_prefix: String::new(),
		})
	}

	/// Namespace every key as `prefix:key`
	pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.key_prefix = prefix.into();
		self
	}

	fn build_key(&self, key: &str) -> String {
		if self.key_prefix.is_empty() {
			key.to_string()
		} else {
			format!("{}:{}", self.key_prefix, key)
		}
	}

	async fn rearm(&self, key: &str, window_secs: u64) -> Result<(), CacheError> {
		let mut conn = self.connection.clone();
		let _: bool = conn
			.expire(key, window_secs as i64)
			.await
			.map_err(backend_error)?;
		Ok(())
	}
}

fn backend_error(error: redis::RedisError) -> CacheError {
	CacheError::Backend(error.to_string())
}

fn split_header(raw: &[u8]) -> Result<(u64, &[u8]), CacheError> {
	if raw.len() < HEADER_LEN {
		return Err(CacheError::Corrupt(format!(
			"entry of {} bytes is shorter than its header",
			raw.len()
		)));
	}
	let (header, value) = raw.split_at(HEADER_LEN);
	let mut window = [0u8; HEADER_LEN];
	window.copy_from_slice(header);
	Ok((u64::from_be_bytes(window), value))
}

#[async_trait]
impl DistributedCache for RedisDistributedCache {
	async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
		let full_key = self.build_key(key);
		let mut conn = self.connection.clone();

		let raw: Option<Vec<u8>> = conn.get(&full_key).await.map_err(backend_error)?;
		let Some(raw) = raw else {
			return Ok(None);
		};

		let (window_secs, value) = split_header(&raw)?;
		self.rearm(&full_key, window_secs).await?;
		Ok(Some(value.to_vec()))
	}

	async fn set(
		&self,
		key: &str,
		value: Vec<u8>,
		sliding_expiration: Duration,
	) -> Result<(), CacheError> {
		let full_key = self.build_key(key);
		// Redis rejects a zero TTL
		let window_secs = sliding_expiration.as_secs().max(1);

		let mut stored = Vec::with_capacity(HEADER_LEN + value.len());
		stored.extend_from_slice(&window_secs.to_be_bytes());
		stored.extend_from_slice(&value);

		let mut conn = self.connection.clone();
		let _: () = conn
			.set_ex(&full_key, stored, window_secs)
			.await
			.map_err(backend_error)?;
		Ok(())
	}

	async fn refresh(&self, key: &str) -> Result<(), CacheError> {
		let full_key = self.build_key(key);
		let mut conn = self.connection.clone();

		let header: Vec<u8> = conn
			.getrange(&full_key, 0, (HEADER_LEN - 1) as isize)
			.await
			.map_err(backend_error)?;
		if header.is_empty() {
			return Ok(());
		}

		let (window_secs, _) = split_header(&header)?;
		self.rearm(&full_key, window_secs).await
	}

	async fn remove(&self, key: &str) -> Result<(), CacheError> {
		let full_key = self.build_key(key);
		let mut conn = self.connection.clone();
		let _: () = conn.del(&full_key).await.map_err(backend_error)?;
		Ok(())
	}
}
