//! Handler and middleware traits
//!
//! A [`Handler`] turns a request into a response. A [`Middleware`] wraps the
//! next handler to run code around it; [`MiddlewareChain`] nests a list of
//! middleware around a final handler, outermost first.
//!
//! ```rust
//! use shared_sessions_http::{Handler, Middleware, Request, Response, Result};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct NoStore;
//!
//! #[async_trait]
//! impl Middleware for NoStore {
//!     async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
//!         let response = next.handle(request).await?;
//!         Ok(response.with_header("Cache-Control", "no-store"))
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::exception::Result;
use crate::{Request, Response};

/// Processes a request into a response
#[async_trait]
pub trait Handler: Send + Sync {
	/// Handles an HTTP request and produces a response.
	///
	/// # Errors
	///
	/// Returns an error if the request cannot be processed.
	async fn handle(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Runs around the next handler in the chain
#[async_trait]
pub trait Middleware: Send + Sync {
	/// Processes a request through this middleware.
	///
	/// # Errors
	///
	/// Returns an error if the middleware or next handler fails.
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;
}

/// Composes middleware around a final handler
///
/// Middleware added first runs outermost: it sees the request first and the
/// response last.
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	/// Add a middleware inside the ones already added
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	/// Fold the chain into a single handler
	pub fn build(&self) -> Arc<dyn Handler> {
		self.middlewares
			.iter()
			.rev()
			.fold(Arc::clone(&self.handler), |next, middleware| {
				Arc::new(ComposedHandler {
					middleware: Arc::clone(middleware),
					next,
				})
			})
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.build().handle(request).await
	}
}

struct ComposedHandler {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for ComposedHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.middleware
			.process(request, Arc::clone(&self.next))
			.await
	}
}
