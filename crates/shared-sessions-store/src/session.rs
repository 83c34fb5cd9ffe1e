//! Byte-valued session backed by a distributed cache
//!
//! A [`Session`] holds its entries in memory between [`Session::load`] and
//! [`Session::commit`]. Nothing reaches the cache until commit.

use indexmap::IndexMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheError, DistributedCache};
use crate::error::{Result, SessionError};
use crate::key::key_prefix;
use crate::record::{self, MAX_ENTRIES};

/// Called before the first write; returning `false` refuses the write
pub type EstablishCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// An establish check that always accepts
pub fn always_establish() -> EstablishCheck {
	Arc::new(|| true)
}

/// Session state for one key
pub struct Session {
	key: String,
	cache: Arc<dyn DistributedCache>,
	idle_timeout: Duration,
	io_timeout: Duration,
	try_establish: EstablishCheck,
	is_new: bool,
	loaded: bool,
	load_failed: bool,
	modified: bool,
	entries: IndexMap<String, Vec<u8>>,
}

impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("key", &key_prefix(&self.key))
			.field("is_new", &self.is_new)
			.field("loaded", &self.loaded)
			.field("modified", &self.modified)
			.field("entries", &self.entries.len())
			.finish()
	}
}

impl Session {
	/// Create a session handle
	///
	/// `is_new` marks a key that has never been stored; such a session skips
	/// loading.
	pub fn new(
		key: impl Into<String>,
		cache: Arc<dyn DistributedCache>,
		idle_timeout: Duration,
		io_timeout: Duration,
		try_establish: EstablishCheck,
		is_new: bool,
	) -> Self {
		Self {
			key: key.into(),
			cache,
			idle_timeout,
			io_timeout,
			try_establish,
			is_new,
			loaded: false,
			load_failed: false,
			modified: false,
			entries: IndexMap::new(),
		}
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn is_new(&self) -> bool {
		self.is_new
	}

	/// Whether the session loaded successfully and accepts writes
	pub fn is_available(&self) -> bool {
		self.loaded && !self.load_failed
	}

	/// Load the stored record, if any
	///
	/// Loading twice is a no-op. A failed load leaves the session empty and
	/// read-only.
	pub async fn load(&mut self) -> Result<()> {
		if self.loaded {
			return Ok(());
		}
		self.loaded = true;
		if self.is_new {
			return Ok(());
		}

		let result = self.read_record().await;
		match result {
			Ok(Some(entries)) => {
				self.entries = entries;
				Ok(())
			}
			Ok(None) => {
				tracing::debug!(key = %key_prefix(&self.key), "no stored session record");
				Ok(())
			}
			Err(e) => {
				self.load_failed = true;
				Err(e)
			}
		}
	}

	async fn read_record(&self) -> Result<Option<IndexMap<String, Vec<u8>>>> {
		let data = with_timeout(self.io_timeout, self.cache.get(&self.key))
			.await?
			.map_err(SessionError::from)?;
		data.map(|bytes| record::deserialize(&bytes)).transpose()
	}

	/// Entry names in store order
	pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
		self.entries.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn try_get(&self, name: &str) -> Option<&[u8]> {
		self.entries.get(name).map(Vec::as_slice)
	}

	/// Write an entry
	///
	/// # Errors
	///
	/// [`SessionError::InvalidArgument`] when the name or value is longer
	/// than the record allows, [`SessionError::Unavailable`] when the session failed
	/// to load or the establish check refuses.
	pub fn set(&mut self, name: impl Into<String>, value: Vec<u8>) -> Result<()> {
		let name = name.into();
		record::check_entry_size(name.len(), value.len())?;
		if self.entries.len() >= MAX_ENTRIES && !self.entries.contains_key(&name) {
			return Err(SessionError::InvalidArgument(format!(
				"session already holds {} entries",
				MAX_ENTRIES
			)));
		}
		if self.load_failed {
			return Err(SessionError::Unavailable(
				"session failed to load".to_string(),
			));
		}
		if !(self.try_establish)() {
			return Err(SessionError::Unavailable(
				"session cannot be established after the response has started".to_string(),
			));
		}

		self.entries.insert(name, value);
		self.modified = true;
		Ok(())
	}

	/// Remove an entry, returning whether it existed
	pub fn remove(&mut self, name: &str) -> bool {
		let removed = self.entries.shift_remove(name).is_some();
		self.modified |= removed;
		removed
	}

	pub fn clear(&mut self) {
		if !self.entries.is_empty() {
			self.entries.clear();
			self.modified = true;
		}
	}

	pub fn is_modified(&self) -> bool {
		self.modified
	}

	/// Persist changes, or slide the idle timer of an unchanged session
	///
	/// A session that failed to load leaves the stored record untouched.
	pub async fn commit(&mut self) -> Result<()> {
		if self.modified {
			let data = record::serialize(&self.entries);
			with_timeout(
				self.io_timeout,
				self.cache.set(&self.key, data, self.idle_timeout),
			)
			.await?
			.map_err(commit_error)?;
			self.modified = false;

			tracing::debug!(
				key = %key_prefix(&self.key),
				entries = self.entries.len(),
				"session committed"
			);
		} else if !self.is_new && !self.load_failed {
			with_timeout(self.io_timeout, self.cache.refresh(&self.key))
				.await?
				.map_err(commit_error)?;
		}
		Ok(())
	}
}

fn commit_error(error: CacheError) -> SessionError {
	SessionError::Commit(error.to_string())
}

async fn with_timeout<T>(limit: Duration, future: impl Future<Output = T>) -> Result<T> {
	tokio::time::timeout(limit, future)
		.await
		.map_err(|_| SessionError::Timeout(limit))
}
