//! Routing for the shared session API
//!
//! | Method | Path | View |
//! |---|---|---|
//! | POST | `/api/session` | [`SessionApiViews::create`] |
//! | GET | `/api/session/{key}` | [`SessionApiViews::retrieve`] |
//! | DELETE | `/api/session/{key}` | [`SessionApiViews::destroy`] |
//! | GET | `/session` | [`active_session`] |

use async_trait::async_trait;
use hyper::Method;
use shared_sessions_http::{Error, Handler, Request, Response, Result};
use shared_sessions_store::SessionService;
use std::sync::Arc;

use crate::consumer::active_session;
use crate::views::SessionApiViews;

enum Route {
	Sessions,
	Session(String),
	ActiveSession,
}

impl Route {
	fn resolve(path: &str) -> Option<Self> {
		let segments: Vec<&str> = path
			.split('/')
			.filter(|segment| !segment.is_empty())
			.collect();

		match segments.as_slice() {
			["api", "session"] => Some(Route::Sessions),
			["api", "session", key] => Some(Route::Session((*key).to_string())),
			["session"] => Some(Route::ActiveSession),
			_ => None,
		}
	}

	fn allowed_methods(&self) -> &'static str {
		match self {
			Route::Sessions => "POST",
			Route::Session(_) => "GET, DELETE",
			Route::ActiveSession => "GET",
		}
	}
}

/// Top-level handler of the service
pub struct SessionRouter {
	views: SessionApiViews,
}

impl SessionRouter {
	pub fn new(service: Arc<dyn SessionService>) -> Self {
		Self {
			views: SessionApiViews::new(service),
		}
	}
}

#[async_trait]
impl Handler for SessionRouter {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		let Some(route) = Route::resolve(request.path()) else {
			return Ok(Error::NotFound(request.path().to_string()).into());
		};

		let response = match (&request.method, &route) {
			(&Method::POST, Route::Sessions) => self.views.create(&request).await,
			(&Method::GET, Route::Session(key)) => {
				request.path_params.insert("key".to_string(), key.clone());
				self.views.retrieve(key).await
			}
			(&Method::DELETE, Route::Session(key)) => {
				request.path_params.insert("key".to_string(), key.clone());
				self.views.destroy(key).await
			}
			(&Method::GET, Route::ActiveSession) => active_session(&request).await?,
			(method, route) => {
				tracing::debug!(method = %method, path = request.path(), "method not allowed");
				Response::from(Error::MethodNotAllowed(method.to_string()))
					.with_header("Allow", route.allowed_methods())
			}
		};
		Ok(response)
	}
}
