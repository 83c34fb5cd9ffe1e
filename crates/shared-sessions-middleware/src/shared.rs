//! Shared session adoption
//!
//! A request carrying `?sessionid=<key>` takes over the stored session for
//! that key. Downstream handlers read and write the shared session through
//! the request's [`SessionContext`], the client receives a cookie for the key
//! so later direct visits resolve to the same session, and the session is
//! committed once the request is over, whatever the outcome.

use async_trait::async_trait;
use futures::FutureExt;
use shared_sessions_http::{Handler, Middleware, Request, Response, Result};
use shared_sessions_store::key::key_prefix;
use shared_sessions_store::{
	DataProtectionProvider, DataProtector, ProtectionError, SESSION_COOKIE_PURPOSE, SessionStore,
	always_establish,
};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::context::SessionContext;
use crate::session::write_session_cookie;

/// Query parameter that names the shared session to adopt
pub const SESSION_ID_QUERY_KEY: &str = "sessionid";

/// Adopts the session named in the query string for one request
///
/// Install it inside [`SessionMiddleware`](crate::SessionMiddleware), with
/// the same [`SessionConfig`] and a protector for the same purpose.
pub struct SharedSessionMiddleware {
	config: SessionConfig,
	store: Arc<dyn SessionStore>,
	protector: Arc<dyn DataProtector>,
}

impl SharedSessionMiddleware {
	pub fn new(
		config: SessionConfig,
		store: Arc<dyn SessionStore>,
		protector: Arc<dyn DataProtector>,
	) -> Self {
		Self {
			config,
			store,
			protector,
		}
	}

	/// Create with a protector for [`SESSION_COOKIE_PURPOSE`]
	pub fn from_provider(
		config: SessionConfig,
		store: Arc<dyn SessionStore>,
		provider: &dyn DataProtectionProvider,
	) -> std::result::Result<Self, ProtectionError> {
		let protector = provider.create_protector(SESSION_COOKIE_PURPOSE)?;
		Ok(Self::new(config, store, protector))
	}
}

#[async_trait]
impl Middleware for SharedSessionMiddleware {
	async fn process(&self, mut request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let Some(session_key) = request.query_param(SESSION_ID_QUERY_KEY) else {
			return next.handle(request).await;
		};
		request.remove_query_param(SESSION_ID_QUERY_KEY)?;

		if session_key.is_empty() {
			return next.handle(request).await;
		}
		let Some(context) = SessionContext::from_request(&request) else {
			tracing::warn!("no session context on request; SessionMiddleware must run first");
			return next.handle(request).await;
		};

		let mut session = self.store.create(
			&session_key,
			self.config.idle_timeout,
			self.config.io_timeout,
			always_establish(),
			false,
		);
		if let Err(e) = session.load().await {
			tracing::warn!(
				key = %key_prefix(&session_key),
				error = %e,
				"failed to load shared session"
			);
			return next.handle(request).await;
		}
		if session.is_empty() {
			tracing::debug!(key = %key_prefix(&session_key), "shared session is empty");
			return next.handle(request).await;
		}

		tracing::debug!(
			key = %key_prefix(&session_key),
			entries = session.len(),
			"adopting shared session"
		);

		context.install_override(Arc::new(tokio::sync::Mutex::new(session)));
		let guard = AdoptionGuard::new(context, &session_key);

		let outcome = AssertUnwindSafe(next.handle(request)).catch_unwind().await;
		guard.finish().await;

		// Failed pages still carry the adoption cookie
		let mut response = match outcome {
			Ok(Ok(response)) => response,
			Ok(Err(e)) => {
				tracing::debug!(
					key = %key_prefix(&session_key),
					error = %e,
					"request failed while holding a shared session"
				);
				Response::from(e)
			}
			Err(panic) => std::panic::resume_unwind(panic),
		};
		write_session_cookie(
			&mut response,
			&self.config,
			self.protector.as_ref(),
			&session_key,
		)?;
		Ok(response)
	}
}

/// Detaches and commits an adopted session when the request ends
///
/// [`AdoptionGuard::finish`] covers completion, errors and panics. If the
/// request future is dropped first, the guard hands the commit to the
/// runtime.
struct AdoptionGuard {
	context: SessionContext,
	key_prefix: String,
	armed: bool,
}

impl AdoptionGuard {
	fn new(context: SessionContext, session_key: &str) -> Self {
		Self {
			context,
			key_prefix: key_prefix(session_key).to_string(),
			armed: true,
		}
	}

	async fn finish(mut self) {
		self.armed = false;
		detach_and_commit(&self.context, &self.key_prefix).await;
	}
}

impl Drop for AdoptionGuard {
	fn drop(&mut self) {
		if !self.armed {
			return;
		}

		let context = self.context.clone();
		let key_prefix = std::mem::take(&mut self.key_prefix);
		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				tracing::debug!(key = %key_prefix, "request cancelled, committing shared session");
				handle.spawn(async move {
					detach_and_commit(&context, &key_prefix).await;
				});
			}
			Err(_) => {
				context.take_override();
				tracing::warn!(key = %key_prefix, "no runtime to commit shared session");
			}
		}
	}
}

async fn detach_and_commit(context: &SessionContext, key_prefix: &str) {
	let Some(session) = context.take_override() else {
		return;
	};

	let mut session = session.lock().await;
	match session.commit().await {
		Ok(()) => tracing::debug!(key = %key_prefix, "shared session committed"),
		Err(e) => tracing::error!(
			key = %key_prefix,
			error = %e,
			"failed to commit shared session"
		),
	}
}
