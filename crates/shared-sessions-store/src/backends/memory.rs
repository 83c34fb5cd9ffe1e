//! In-process distributed cache
//!
//! Suitable for a single server and for tests. Entries are kept under one
//! lock and expire lazily.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::cache::{CacheError, DistributedCache};

#[derive(Debug, Clone)]
struct CacheEntry {
	value: Vec<u8>,
	sliding_expiration: Duration,
	last_accessed: Instant,
}

impl CacheEntry {
	fn is_expired(&self, now: Instant) -> bool {
		now.duration_since(self.last_accessed) >= self.sliding_expiration
	}
}

/// In-memory cache with sliding expiration and lazy eviction
///
/// Expired entries are never returned. They are dropped when touched, and
/// all of them are swept when the entry count exceeds the cleanup threshold.
///
/// # Examples
///
/// ```
/// use shared_sessions_store::{DistributedCache, InMemoryDistributedCache};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let cache = InMemoryDistributedCache::new();
/// cache.set("k", b"v".to_vec(), Duration::from_secs(60)).await.unwrap();
/// assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
/// # });
/// ```
#[derive(Debug)]
pub struct InMemoryDistributedCache {
	entries: Mutex<HashMap<String, CacheEntry>>,
	cleanup_threshold: AtomicUsize,
}

impl Default for InMemoryDistributedCache {
	fn default() -> Self {
		Self::new()
	}
}

impl InMemoryDistributedCache {
	/// Default cleanup threshold: sweep when more than 10,000 entries are held
	pub const DEFAULT_CLEANUP_THRESHOLD: usize = 10_000;

	pub fn new() -> Self {
		Self {
			entries: Mutex::new(HashMap::new()),
			cleanup_threshold: AtomicUsize::new(Self::DEFAULT_CLEANUP_THRESHOLD),
		}
	}

	/// Set the entry count above which expired entries are swept on write
	pub fn with_cleanup_threshold(self, threshold: usize) -> Self {
		self.cleanup_threshold.store(threshold, Ordering::Relaxed);
		self
	}

	/// Remove every expired entry
	pub fn cleanup(&self) {
		let now = Instant::now();
		let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
		entries.retain(|_, entry| !entry.is_expired(now));
	}

	/// Number of entries held, expired ones included
	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Run `f` on a live entry after sliding it, dropping it if expired
	fn touch<T>(&self, key: &str, f: impl FnOnce(&CacheEntry) -> T) -> Option<T> {
		let now = Instant::now();
		let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

		let expired = entries.get(key)?.is_expired(now);
		if expired {
			entries.remove(key);
			return None;
		}

		let entry = entries.get_mut(key)?;
		entry.last_accessed = now;
		Some(f(entry))
	}
}

#[async_trait]
impl DistributedCache for InMemoryDistributedCache {
	async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
		Ok(self.touch(key, |entry| entry.value.clone()))
	}

	async fn set(
		&self,
		key: &str,
		value: Vec<u8>,
		sliding_expiration: Duration,
	) -> Result<(), CacheError> {
		let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
		entries.insert(
			key.to_string(),
			CacheEntry {
				value,
				sliding_expiration,
				last_accessed: Instant::now(),
			},
		);

		if entries.len() > self.cleanup_threshold.load(Ordering::Relaxed) {
			let now = Instant::now();
			entries.retain(|_, entry| !entry.is_expired(now));
			tracing::debug!(remaining = entries.len(), "swept expired cache entries");
		}

		Ok(())
	}

	async fn refresh(&self, key: &str) -> Result<(), CacheError> {
		self.touch(key, |_| ());
		Ok(())
	}

	async fn remove(&self, key: &str) -> Result<(), CacheError> {
		let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
		entries.remove(key);
		Ok(())
	}
}
