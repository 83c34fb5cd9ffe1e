//! Session Middleware
//!
//! Gives every request a session, keyed by a signed cookie. The session is
//! stored in the request extensions as a [`SessionContext`] and committed
//! once the rest of the chain has run.

use async_trait::async_trait;
use hyper::header::{CACHE_CONTROL, EXPIRES, HeaderValue, PRAGMA, SET_COOKIE};
use shared_sessions_http::cookie::set_cookie_header;
use shared_sessions_http::{Handler, Middleware, Request, Response, Result};
use shared_sessions_store::key::key_prefix;
use shared_sessions_store::protection::{protect_cookie_value, unprotect_cookie_value};
use shared_sessions_store::{
	DataProtectionProvider, DataProtector, EstablishCheck, ProtectionError,
	SESSION_COOKIE_PURPOSE, SessionStore, generate_session_key,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::SessionConfig;
use crate::context::SessionContext;

/// Append the signed session cookie and disable caching of the response
pub(crate) fn write_session_cookie(
	response: &mut Response,
	config: &SessionConfig,
	protector: &dyn DataProtector,
	session_key: &str,
) -> Result<()> {
	let value = protect_cookie_value(protector, session_key);
	let cookie = set_cookie_header(&config.cookie_name, &value, &config.cookie_options())?;

	response.headers.append(SET_COOKIE, cookie);
	response
		.headers
		.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
	response
		.headers
		.insert(PRAGMA, HeaderValue::from_static("no-cache"));
	response
		.headers
		.insert(EXPIRES, HeaderValue::from_static("-1"));
	Ok(())
}

/// Session middleware
///
/// Must run outside every component that reads the session, including
/// [`SharedSessionMiddleware`](crate::SharedSessionMiddleware).
///
/// # Examples
///
/// ```
/// use shared_sessions_http::{Handler, Middleware, Request, Response, Result};
/// use shared_sessions_middleware::{SessionConfig, SessionContext, SessionMiddleware};
/// use shared_sessions_store::{
///     DistributedSessionStore, HmacProtectionProvider, InMemoryDistributedCache,
/// };
/// use std::sync::Arc;
///
/// struct Visit;
///
/// #[async_trait::async_trait]
/// impl Handler for Visit {
///     async fn handle(&self, request: Request) -> Result<Response> {
///         let context = SessionContext::from_request(&request).unwrap();
///         let session = context.session();
///         session.lock().await.set("visited", b"{}".to_vec()).unwrap();
///         Ok(Response::ok())
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let store = Arc::new(DistributedSessionStore::new(Arc::new(InMemoryDistributedCache::new())));
/// let provider = HmacProtectionProvider::new("0123456789abcdef0123456789abcdef").unwrap();
/// let middleware =
///     SessionMiddleware::from_provider(SessionConfig::default(), store, &provider).unwrap();
///
/// let request = Request::builder().uri("/").build().unwrap();
/// let response = middleware.process(request, Arc::new(Visit)).await.unwrap();
/// assert!(response.headers.get("set-cookie").is_some());
/// # });
/// ```
pub struct SessionMiddleware {
	config: SessionConfig,
	store: Arc<dyn SessionStore>,
	protector: Arc<dyn DataProtector>,
}

impl SessionMiddleware {
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

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Session key from the request cookie, if it carries a valid one
	fn session_key(&self, request: &Request) -> Option<String> {
		let cookie = request.cookie(&self.config.cookie_name)?;
		match unprotect_cookie_value(self.protector.as_ref(), &cookie) {
			Ok(key) if !key.is_empty() => Some(key),
			Ok(_) => None,
			Err(e) => {
				tracing::warn!(error = %e, "rejected session cookie");
				None
			}
		}
	}
}

#[async_trait]
impl Middleware for SessionMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let (session_key, is_new) = match self.session_key(&request) {
			Some(key) => (key, false),
			None => (generate_session_key(), true),
		};

		let established = Arc::new(AtomicBool::new(false));
		let try_establish: EstablishCheck = {
			let established = Arc::clone(&established);
			Arc::new(move || {
				established.store(true, Ordering::SeqCst);
				true
			})
		};

		let mut session = self.store.create(
			&session_key,
			self.config.idle_timeout,
			self.config.io_timeout,
			try_establish,
			is_new,
		);
		if let Err(e) = session.load().await {
			tracing::warn!(
				key = %key_prefix(&session_key),
				error = %e,
				"failed to load session"
			);
		}

		let session = Arc::new(tokio::sync::Mutex::new(session));
		request
			.extensions
			.insert(SessionContext::new(Arc::clone(&session)));

		let result = next.handle(request).await;

		if let Err(e) = session.lock().await.commit().await {
			tracing::error!(
				key = %key_prefix(&session_key),
				error = %e,
				"failed to commit session"
			);
		}

		let mut response = result?;
		if is_new && established.load(Ordering::SeqCst) {
			write_session_cookie(
				&mut response,
				&self.config,
				self.protector.as_ref(),
				&session_key,
			)?;
		}
		Ok(response)
	}
}
