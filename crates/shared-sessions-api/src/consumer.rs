//! Consumer page
//!
//! Shows what a consuming application sees: the entries of whichever session
//! is active for the request, shared or not.

use shared_sessions_http::{Request, Response, Result};
use shared_sessions_middleware::SessionContext;
use shared_sessions_store::codec::decode_entry;
use shared_sessions_store::key::key_prefix;
use shared_sessions_store::SessionKeyJsonValue;

/// `GET /session`: JSON array of the active session's entries
///
/// Entries that do not hold a JSON object are left out.
pub async fn active_session(request: &Request) -> Result<Response> {
	let Some(context) = SessionContext::from_request(request) else {
		tracing::warn!("no session context on request");
		return Response::ok().with_json(&Vec::<SessionKeyJsonValue>::new());
	};

	let session = context.session();
	let session = session.lock().await;
	let values: Vec<SessionKeyJsonValue> = session
		.keys()
		.filter_map(|name| {
			let bytes = session.try_get(name).unwrap_or_default();
			decode_entry(name, bytes)
				.inspect_err(|e| {
					tracing::warn!(
						key = %key_prefix(session.key()),
						entry = name,
						error = %e,
						"skipping undecodable session entry"
					);
				})
				.ok()
		})
		.collect();

	Response::ok().with_json(&values)
}
