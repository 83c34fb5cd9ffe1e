//! Session store capability

use std::sync::Arc;
use std::time::Duration;

use crate::cache::DistributedCache;
use crate::session::{EstablishCheck, Session};

/// Opens sessions by key
pub trait SessionStore: Send + Sync {
	/// Open the session for `key`
	///
	/// The returned session is not loaded yet. With `is_new` set, loading is
	/// skipped and any stored data under the key is ignored.
	fn create(
		&self,
		key: &str,
		idle_timeout: Duration,
		io_timeout: Duration,
		try_establish: EstablishCheck,
		is_new: bool,
	) -> Session;
}

/// Store whose sessions persist in a [`DistributedCache`]
///
/// # Examples
///
/// ```
/// use shared_sessions_store::{
///     DistributedSessionStore, InMemoryDistributedCache, SessionStore, always_establish,
/// };
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let store = DistributedSessionStore::new(Arc::new(InMemoryDistributedCache::new()));
/// let session = store.create(
///     "key",
///     Duration::from_secs(1200),
///     Duration::from_secs(60),
///     always_establish(),
///     true,
/// );
/// assert!(session.is_new());
/// ```
#[derive(Clone)]
pub struct DistributedSessionStore {
	cache: Arc<dyn DistributedCache>,
}

impl DistributedSessionStore {
	pub fn new(cache: Arc<dyn DistributedCache>) -> Self {
		Self { cache }
	}

	pub fn cache(&self) -> &Arc<dyn DistributedCache> {
		&self.cache
	}
}

impl SessionStore for DistributedSessionStore {
	fn create(
		&self,
		key: &str,
		idle_timeout: Duration,
		io_timeout: Duration,
		try_establish: EstablishCheck,
		is_new: bool,
	) -> Session {
		Session::new(
			key,
			Arc::clone(&self.cache),
			idle_timeout,
			io_timeout,
			try_establish,
			is_new,
		)
	}
}
