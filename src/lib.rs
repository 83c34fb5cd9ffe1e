//! # Shared Sessions
//!
//! One server-side session shared by several web applications.
//!
//! A web application stores values in a new session through the session API
//! and passes the returned key to a consumer, typically in a link such as
//! `https://consumer.example/checkout?sessionid=<key>`. The consumer runs the
//! same session middleware against the same distributed cache; on seeing the
//! key it adopts the stored session for that request and hands the browser a
//! cookie, so later visits keep resolving to the shared session.
//!
//! ## Crates
//!
//! - [`http`]: request, response, handler and middleware primitives
//! - [`conf`]: settings from files and the environment
//! - [`store`]: distributed cache, sessions, value codec, cookie protection
//!   and the shared session service
//! - [`middleware`]: per-request sessions and shared session adoption
//! - [`api`] (feature `server`): HTTP routes, wiring and the server
//!
//! ## Feature Flags
//!
//! - `server` (default): HTTP API and server
//! - `redis-backend`: Redis distributed cache
//! - `full`: everything
//!
//! ## Quick Example
//!
//! ```rust
//! use shared_sessions::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let cache = Arc::new(InMemoryDistributedCache::new());
//! let store = Arc::new(DistributedSessionStore::new(cache.clone()));
//! let service = DistributedSessionService::new(store, cache, SessionOptions::default());
//!
//! let profile = json!({"name": "ana"}).as_object().unwrap().clone();
//! let key = service
//!     .create(Some(&[SessionKeyJsonValue::new("profile", profile)]))
//!     .await
//!     .unwrap();
//!
//! let values = service.get(&key).await.unwrap().unwrap();
//! assert_eq!(values[0].key, "profile");
//! # });
//! ```

pub use shared_sessions_conf as conf;
pub use shared_sessions_http as http;
pub use shared_sessions_middleware as middleware;
pub use shared_sessions_store as store;

#[cfg(feature = "server")]
pub use shared_sessions_api as api;

/// Commonly used types
pub mod prelude {
	pub use shared_sessions_conf::Settings;
	pub use shared_sessions_http::{
		Error, Handler, Middleware, MiddlewareChain, Request, Response, Result,
	};
	pub use shared_sessions_middleware::{
		SESSION_ID_QUERY_KEY, SessionConfig, SessionContext, SessionMiddleware,
		SharedSessionMiddleware,
	};
	pub use shared_sessions_store::{
		DataProtectionProvider, DataProtector, DistributedCache, DistributedSessionService,
		DistributedSessionStore, HmacProtectionProvider, InMemoryDistributedCache,
		SESSION_COOKIE_PURPOSE, Session, SessionError, SessionKeyJsonValue, SessionOptions,
		SessionService, SessionStore,
	};

	#[cfg(feature = "server")]
	pub use shared_sessions_api::{App, HttpServer, build_app};
}
