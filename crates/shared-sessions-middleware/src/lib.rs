//! Session middleware for shared-sessions
//!
//! Two middleware work together:
//!
//! - [`SessionMiddleware`] gives each request a cookie-keyed session and
//!   exposes it through a [`SessionContext`] request extension.
//! - [`SharedSessionMiddleware`] lets a request carrying
//!   `?sessionid=<key>` adopt a shared session in its place.
//!
//! `SessionMiddleware` must be the outer one:
//!
//! ```rust
//! use shared_sessions_http::{Handler, MiddlewareChain, Request, Response, Result};
//! use shared_sessions_middleware::{SessionConfig, SessionMiddleware, SharedSessionMiddleware};
//! use shared_sessions_store::{
//!     DistributedSessionStore, HmacProtectionProvider, InMemoryDistributedCache,
//! };
//! use std::sync::Arc;
//!
//! struct Page;
//!
//! #[async_trait::async_trait]
//! impl Handler for Page {
//!     async fn handle(&self, _request: Request) -> Result<Response> {
//!         Ok(Response::ok())
//!     }
//! }
//!
//! let store = Arc::new(DistributedSessionStore::new(Arc::new(InMemoryDistributedCache::new())));
//! let provider = HmacProtectionProvider::new("0123456789abcdef0123456789abcdef").unwrap();
//! let config = SessionConfig::default();
//!
//! let chain = MiddlewareChain::new(Arc::new(Page))
//!     .with_middleware(Arc::new(
//!         SessionMiddleware::from_provider(config.clone(), store.clone(), &provider).unwrap(),
//!     ))
//!     .with_middleware(Arc::new(
//!         SharedSessionMiddleware::from_provider(config, store, &provider).unwrap(),
//!     ));
//! ```

pub mod config;
pub mod context;
pub mod session;
pub mod shared;

pub use config::SessionConfig;
pub use context::{SessionContext, SharedSession};
pub use session::SessionMiddleware;
pub use shared::{SESSION_ID_QUERY_KEY, SharedSessionMiddleware};
