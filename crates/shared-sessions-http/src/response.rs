use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

use crate::exception::{Error, Result};

/// HTTP response representation
#[derive(Debug)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a response with the given status and an empty body
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn method_not_allowed() -> Self {
		Self::new(StatusCode::METHOD_NOT_ALLOWED)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Set the response body
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Set a header, replacing existing values
	///
	/// Names or values that are not valid header text are ignored.
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Response;
	///
	/// let response = Response::ok().with_header("Cache-Control", "no-cache");
	/// assert_eq!(response.headers.get("cache-control").unwrap(), "no-cache");
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Plain text body with a `text/plain` content type
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Response;
	///
	/// let response = Response::ok().with_text("3f2a");
	/// assert_eq!(response.body, "3f2a");
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap(),
	///     "text/plain; charset=utf-8"
	/// );
	/// ```
	pub fn with_text(mut self, text: impl Into<String>) -> Self {
		self.body = Bytes::from(text.into());
		self.headers.insert(
			hyper::header::CONTENT_TYPE,
			HeaderValue::from_static("text/plain; charset=utf-8"),
		);
		self
	}

	/// Serialize `data` as the JSON body
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Response;
	/// use serde_json::json;
	///
	/// let response = Response::ok().with_json(&json!([{"key": "cart"}])).unwrap();
	/// assert_eq!(response.body, r#"[{"key":"cart"}]"#);
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap(),
	///     "application/json"
	/// );
	/// ```
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
		let json = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers.insert(
			hyper::header::CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);
		Ok(self)
	}
}

impl From<Error> for Response {
	fn from(error: Error) -> Self {
		// Server errors carry no detail to the client
		match error.status_code() {
			status if status.is_server_error() => Response::new(status),
			status => Response::new(status).with_text(error.to_string()),
		}
	}
}
