//! HTTP request representation

mod params;

use crate::exception::{Error, Result};
use crate::extensions::Extensions;
use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri, Version};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;

/// HTTP request as seen by handlers and middleware
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	/// Peer address of the connection, when known
	pub remote_addr: Option<SocketAddr>,
	/// Parameters captured from the route pattern (e.g. `{key}`)
	pub path_params: HashMap<String, String>,
	/// Request-scoped typed state shared between middleware and handlers
	pub extensions: Extensions,
}

impl Request {
	/// Create a request from its raw parts
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			remote_addr: None,
			path_params: HashMap::new(),
			extensions: Extensions::new(),
		}
	}

	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/api/session/abc")
	///     .build()
	///     .unwrap();
	/// assert_eq!(request.path(), "/api/session/abc");
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Request path without the query string
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Raw query string, if any
	pub fn query_string(&self) -> Option<&str> {
		self.uri.query()
	}

	/// Value captured for a route parameter
	pub fn path_param(&self, name: &str) -> Option<&str> {
		self.path_params.get(name).map(String::as_str)
	}

	/// Value of the named cookie from the `Cookie` header
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Request;
	///
	/// let request = Request::builder()
	///     .uri("/")
	///     .header("cookie", "theme=dark; sessionid=abc")
	///     .build()
	///     .unwrap();
	/// assert_eq!(request.cookie("sessionid").as_deref(), Some("abc"));
	/// assert_eq!(request.cookie("missing"), None);
	/// ```
	pub fn cookie(&self, name: &str) -> Option<String> {
		self.headers
			.get_all(hyper::header::COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.find_map(|header| crate::cookie::find_cookie(header, name))
	}

	/// Deserialize the body as JSON
	///
	/// A malformed body is reported as [`Error::BadRequest`].
	pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
		serde_json::from_slice(&self.body)
			.map_err(|e| Error::BadRequest(format!("Invalid JSON body: {}", e)))
	}
}

/// Builder for [`Request`]
#[derive(Default)]
pub struct RequestBuilder {
	method: Method,
	uri: Option<String>,
	version: Version,
	headers: HeaderMap,
	body: Bytes,
	remote_addr: Option<SocketAddr>,
	header_error: Option<String>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Append a single header
	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (
			hyper::header::HeaderName::from_bytes(name.as_bytes()),
			hyper::header::HeaderValue::from_str(value),
		) {
			(Ok(name), Ok(value)) => {
				self.headers.append(name, value);
			}
			_ => self.header_error = Some(format!("Invalid header {}: {}", name, value)),
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	/// Build the request
	///
	/// Fails when the URI does not parse or a header was invalid.
	pub fn build(self) -> Result<Request> {
		if let Some(message) = self.header_error {
			return Err(Error::BadRequest(message));
		}
		let uri = self.uri.as_deref().unwrap_or("/");
		let uri: Uri = uri
			.parse()
			.map_err(|e| Error::BadRequest(format!("Invalid URI {}: {}", uri, e)))?;

		let mut request = Request::new(self.method, uri, self.version, self.headers, self.body);
		request.remote_addr = self.remote_addr;
		Ok(request)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::Deserialize;

	#[rstest]
	fn test_builder_defaults() {
		let request = Request::builder().build().unwrap();

		assert_eq!(request.method, Method::GET);
		assert_eq!(request.path(), "/");
		assert_eq!(request.query_string(), None);
		assert!(request.body.is_empty());
	}

	#[rstest]
	fn test_builder_rejects_invalid_uri() {
		let result = Request::builder().uri("http://[::1").build();

		assert!(matches!(result, Err(Error::BadRequest(_))));
	}

	#[rstest]
	fn test_cookie_lookup_across_headers() {
		let request = Request::builder()
			.header("cookie", "a=1")
			.header("cookie", "sessionid=xyz")
			.build()
			.unwrap();

		assert_eq!(request.cookie("sessionid").as_deref(), Some("xyz"));
		assert_eq!(request.cookie("a").as_deref(), Some("1"));
	}

	#[derive(Debug, Deserialize, PartialEq)]
	struct Payload {
		name: String,
	}

	#[rstest]
	fn test_json_body() {
		let request = Request::builder()
			.method(Method::POST)
			.body(r#"{"name":"cart"}"#)
			.build()
			.unwrap();

		let payload: Payload = request.json().unwrap();
		assert_eq!(
			payload,
			Payload {
				name: "cart".to_string()
			}
		);
	}

	#[rstest]
	fn test_json_body_malformed_is_bad_request() {
		let request = Request::builder().body("{not json").build().unwrap();

		let result: Result<Payload> = request.json();
		assert!(matches!(result, Err(Error::BadRequest(_))));
	}
}
