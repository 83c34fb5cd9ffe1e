//! Request-scoped session context
//!
//! [`SessionMiddleware`](crate::SessionMiddleware) stores a [`SessionContext`]
//! in the request extensions. Handlers resolve the active session through it
//! and never learn whether it is the request's own session or a shared one
//! installed for the duration of the request.

use shared_sessions_http::Request;
use shared_sessions_store::Session;
use std::sync::{Arc, Mutex};

/// A session that middleware and handlers of one request can lock in turn
pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

struct Slots {
	default: SharedSession,
	active_override: Option<SharedSession>,
}

/// Default session of a request plus an optional override
///
/// Clones share the same slots.
///
/// # Examples
///
/// ```
/// use shared_sessions_middleware::SessionContext;
/// use shared_sessions_store::{InMemoryDistributedCache, Session, always_establish};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let cache = Arc::new(InMemoryDistributedCache::new());
/// let open = |key: &str| {
///     Arc::new(tokio::sync::Mutex::new(Session::new(
///         key,
///         cache.clone(),
///         Duration::from_secs(60),
///         Duration::from_secs(5),
///         always_establish(),
///         true,
///     )))
/// };
///
/// let context = SessionContext::new(open("own"));
/// context.install_override(open("shared"));
/// assert_eq!(context.session().try_lock().unwrap().key(), "shared");
///
/// context.take_override();
/// assert_eq!(context.session().try_lock().unwrap().key(), "own");
/// ```
#[derive(Clone)]
pub struct SessionContext {
	slots: Arc<Mutex<Slots>>,
}

impl SessionContext {
	pub fn new(default: SharedSession) -> Self {
		Self {
			slots: Arc::new(Mutex::new(Slots {
				default,
				active_override: None,
			})),
		}
	}

	/// The active session: the override when installed, else the default
	pub fn session(&self) -> SharedSession {
		let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
		slots
			.active_override
			.as_ref()
			.unwrap_or(&slots.default)
			.clone()
	}

	/// The request's own session, ignoring any override
	pub fn default_session(&self) -> SharedSession {
		let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
		slots.default.clone()
	}

	/// Replace the active session, returning the previous override
	pub fn install_override(&self, session: SharedSession) -> Option<SharedSession> {
		let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
		slots.active_override.replace(session)
	}

	/// Detach the override, restoring the default session
	pub fn take_override(&self) -> Option<SharedSession> {
		let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
		slots.active_override.take()
	}

	pub fn has_override(&self) -> bool {
		let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
		slots.active_override.is_some()
	}

	/// Context stored in the request by the session middleware
	pub fn from_request(request: &Request) -> Option<Self> {
		request.extensions.get::<SessionContext>()
	}
}
