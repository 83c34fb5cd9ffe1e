//! Session API views
//!
//! Every service failure is logged and answered with an empty `200 OK`;
//! clients never see error detail.

use shared_sessions_http::{Request, Response};
use shared_sessions_store::key::key_prefix;
use shared_sessions_store::{SessionKeyJsonValue, SessionService};
use std::sync::Arc;

/// Handlers for `/api/session` and `/api/session/{key}`
#[derive(Clone)]
pub struct SessionApiViews {
	service: Arc<dyn SessionService>,
}

impl SessionApiViews {
	pub fn new(service: Arc<dyn SessionService>) -> Self {
		Self { service }
	}

	/// `POST /api/session`: store the submitted values, answer with the key
	///
	/// A body that is not JSON is a `400`. A `null` or empty body is refused
	/// by the service and answered like any other failure.
	pub async fn create(&self, request: &Request) -> Response {
		let values: Option<Vec<SessionKeyJsonValue>> = if request.body.is_empty() {
			None
		} else {
			match request.json() {
				Ok(values) => values,
				Err(e) => return e.into(),
			}
		};

		match self.service.create(values.as_deref()).await {
			Ok(key) => Response::ok().with_text(key),
			Err(e) => {
				tracing::error!(error = %e, "failed to create shared session");
				Response::ok()
			}
		}
	}

	/// `GET /api/session/{key}`: the session's values, or `404`
	pub async fn retrieve(&self, key: &str) -> Response {
		match self.service.get(key).await {
			Ok(Some(values)) => Response::ok().with_json(&values).unwrap_or_else(|e| {
				tracing::error!(key = %key_prefix(key), error = %e, "failed to serialize session");
				Response::ok()
			}),
			Ok(None) => Response::not_found(),
			Err(e) => {
				tracing::error!(key = %key_prefix(key), error = %e, "failed to read shared session");
				Response::ok()
			}
		}
	}

	/// `DELETE /api/session/{key}`
	pub async fn destroy(&self, key: &str) -> Response {
		if let Err(e) = self.service.delete(key).await {
			tracing::error!(key = %key_prefix(key), error = %e, "failed to delete shared session");
		}
		Response::ok()
	}
}
