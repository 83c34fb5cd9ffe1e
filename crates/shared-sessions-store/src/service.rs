//! Shared session service
//!
//! Application-facing operations over the session store: create a session
//! from JSON values and hand out its key, read it back, merge more values
//! into it, and delete it.
//!
//! ## Example
//!
//! ```rust
//! use shared_sessions_store::{
//!     DistributedSessionService, DistributedSessionStore, InMemoryDistributedCache,
//!     SessionKeyJsonValue, SessionOptions, SessionService,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let cache = Arc::new(InMemoryDistributedCache::new());
//! let store = Arc::new(DistributedSessionStore::new(cache.clone()));
//! let service = DistributedSessionService::new(store, cache, SessionOptions::default());
//!
//! let cart = json!({"items": 3}).as_object().unwrap().clone();
//! let values = vec![SessionKeyJsonValue::new("cart", cart)];
//! let key = service.create(Some(&values)).await.unwrap();
//!
//! assert_eq!(service.get(&key).await.unwrap(), Some(values));
//! # });
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::DistributedCache;
use crate::codec::{self, SessionKeyJsonValue};
use crate::error::{Result, SessionError};
use crate::key::{generate_session_key, key_prefix};
use crate::session::{Session, always_establish};
use crate::store::SessionStore;

/// Timeouts applied to sessions opened by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
	/// Time without access after which a session expires
	pub idle_timeout: Duration,
	/// Limit for a single load or commit
	pub io_timeout: Duration,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			idle_timeout: Duration::from_secs(20 * 60),
			io_timeout: Duration::from_secs(60),
		}
	}
}

/// Create, read, merge and delete shared sessions by key
#[async_trait]
pub trait SessionService: Send + Sync {
	/// Store `values` in a brand-new session and return its key
	///
	/// # Errors
	///
	/// [`SessionError::InvalidArgument`] when `values` is `None`.
	async fn create(&self, values: Option<&[SessionKeyJsonValue]>) -> Result<String>;

	/// Values of the session, or `None` when it has no entries
	async fn get(&self, key: &str) -> Result<Option<Vec<SessionKeyJsonValue>>>;

	/// Merge `values` into an existing session
	///
	/// A session without entries is left alone.
	async fn save(&self, key: &str, values: &[SessionKeyJsonValue]) -> Result<()>;

	/// Clear the session and remove its stored record, present or not
	///
	/// A record that cannot be loaded is still removed; only a failure to
	/// remove it is reported.
	async fn delete(&self, key: &str) -> Result<()>;
}

/// [`SessionService`] over a [`SessionStore`] and its [`DistributedCache`]
pub struct DistributedSessionService {
	store: Arc<dyn SessionStore>,
	cache: Arc<dyn DistributedCache>,
	options: SessionOptions,
}

impl DistributedSessionService {
	pub fn new(
		store: Arc<dyn SessionStore>,
		cache: Arc<dyn DistributedCache>,
		options: SessionOptions,
	) -> Self {
		Self {
			store,
			cache,
			options,
		}
	}

	pub fn options(&self) -> SessionOptions {
		self.options
	}

	fn open(&self, key: &str, is_new: bool) -> Session {
		self.store.create(
			key,
			self.options.idle_timeout,
			self.options.io_timeout,
			always_establish(),
			is_new,
		)
	}

	async fn open_existing(&self, key: &str) -> Result<Session> {
		let mut session = self.open(key, false);
		session.load().await?;
		Ok(session)
	}
}

fn apply(session: &mut Session, values: &[SessionKeyJsonValue]) -> Result<()> {
	for (name, bytes) in codec::encode_all(values) {
		session.set(name, bytes)?;
	}
	Ok(())
}

#[async_trait]
impl SessionService for DistributedSessionService {
	async fn create(&self, values: Option<&[SessionKeyJsonValue]>) -> Result<String> {
		let values = values.ok_or_else(|| {
			SessionError::InvalidArgument("session values must not be null".to_string())
		})?;

		let key = generate_session_key();
		let mut session = self.open(&key, true);
		session.load().await?;
		apply(&mut session, values)?;
		session.commit().await?;

		tracing::info!(
			key = %key_prefix(&key),
			entries = session.len(),
			"created shared session"
		);
		Ok(key)
	}

	async fn get(&self, key: &str) -> Result<Option<Vec<SessionKeyJsonValue>>> {
		let session = self.open_existing(key).await?;
		if session.is_empty() {
			return Ok(None);
		}

		let values = session
			.keys()
			.map(|name| {
				let bytes = session.try_get(name).unwrap_or_default();
				codec::decode_entry(name, bytes)
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(Some(values))
	}

	async fn save(&self, key: &str, values: &[SessionKeyJsonValue]) -> Result<()> {
		let mut session = self.open_existing(key).await?;
		if session.is_empty() {
			tracing::debug!(key = %key_prefix(key), "save skipped for empty session");
			return Ok(());
		}

		apply(&mut session, values)?;
		session.commit().await
	}

	async fn delete(&self, key: &str) -> Result<()> {
		match self.open_existing(key).await {
			Ok(mut session) => session.clear(),
			Err(e) => tracing::warn!(
				key = %key_prefix(key),
				error = %e,
				"failed to load session before delete"
			),
		}

		tokio::time::timeout(self.options.io_timeout, self.cache.remove(key))
			.await
			.map_err(|_| SessionError::Timeout(self.options.io_timeout))??;

		tracing::info!(key = %key_prefix(key), "deleted shared session");
		Ok(())
	}
}
