//! Query string access and rewriting

use super::Request;
use crate::exception::{Error, Result};
use hyper::Uri;
use hyper::http::uri::PathAndQuery;
use url::form_urlencoded;

/// Decoded name of a single `name=value` query segment
fn segment_name(segment: &str) -> Option<String> {
	form_urlencoded::parse(segment.as_bytes())
		.next()
		.map(|(name, _)| name.into_owned())
}

impl Request {
	/// First value of a query parameter, matching the name ASCII
	/// case-insensitively
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Request;
	///
	/// let request = Request::builder()
	///     .uri("/page?SessionId=abc&sessionid=def")
	///     .build()
	///     .unwrap();
	/// assert_eq!(request.query_param("sessionid").as_deref(), Some("abc"));
	/// assert_eq!(request.query_param("other"), None);
	/// ```
	pub fn query_param(&self, name: &str) -> Option<String> {
		let query = self.uri.query()?;
		form_urlencoded::parse(query.as_bytes())
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.into_owned())
	}

	/// Remove every occurrence of a query parameter from the request URI
	///
	/// Other parameters keep their original encoding. Returns the first
	/// removed value, or `None` when the parameter was absent (in which case
	/// the URI is untouched).
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Request;
	///
	/// let mut request = Request::builder()
	///     .uri("/page?tab=2&sessionid=abc")
	///     .build()
	///     .unwrap();
	/// let removed = request.remove_query_param("sessionid").unwrap();
	/// assert_eq!(removed.as_deref(), Some("abc"));
	/// assert_eq!(request.uri.to_string(), "/page?tab=2");
	/// ```
	pub fn remove_query_param(&mut self, name: &str) -> Result<Option<String>> {
		let Some(value) = self.query_param(name) else {
			return Ok(None);
		};
		let query = self.uri.query().unwrap_or_default();

		let kept: Vec<&str> = query
			.split('&')
			.filter(|segment| !segment.is_empty())
			.filter(|segment| {
				segment_name(segment).is_none_or(|key| !key.eq_ignore_ascii_case(name))
			})
			.collect();

		let path_and_query = if kept.is_empty() {
			self.uri.path().to_string()
		} else {
			format!("{}?{}", self.uri.path(), kept.join("&"))
		};

		let mut parts = self.uri.clone().into_parts();
		parts.path_and_query = Some(
			PathAndQuery::try_from(path_and_query)
				.map_err(|e| Error::Internal(format!("Failed to rewrite URI: {}", e)))?,
		);
		self.uri = Uri::from_parts(parts)
			.map_err(|e| Error::Internal(format!("Failed to rewrite URI: {}", e)))?;

		Ok(Some(value))
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use crate::Request;

	fn request(uri: &str) -> Request {
		Request::builder().uri(uri).build().unwrap()
	}

	#[rstest]
	#[case("/a?sessionid=k1", "/a")]
	#[case("/a?x=1&sessionid=k1&y=2", "/a?x=1&y=2")]
	#[case("/a?SESSIONID=k1&x=%20", "/a?x=%20")]
	#[case("/a?sessionid=k1&sessionid=k2", "/a")]
	fn test_remove_query_param(#[case] uri: &str, #[case] expected: &str) {
		// Arrange
		let mut request = request(uri);

		// Act
		let removed = request.remove_query_param("sessionid").unwrap();

		// Assert
		assert_eq!(removed.as_deref(), Some("k1"));
		assert_eq!(request.uri.to_string(), expected);
	}

	#[rstest]
	fn test_remove_absent_param_leaves_uri() {
		let mut request = request("/a?x=1");

		let removed = request.remove_query_param("sessionid").unwrap();

		assert_eq!(removed, None);
		assert_eq!(request.uri.to_string(), "/a?x=1");
	}

	#[rstest]
	fn test_remove_keeps_absolute_form() {
		let mut request = request("http://example.com/a?sessionid=k1&x=1");

		request.remove_query_param("sessionid").unwrap();

		assert_eq!(request.uri.to_string(), "http://example.com/a?x=1");
	}

	#[rstest]
	fn test_query_param_decodes_value() {
		let request = request("/a?sessionid=a%2Bb");

		assert_eq!(request.query_param("sessionid").as_deref(), Some("a+b"));
	}

	#[rstest]
	fn test_query_param_without_value() {
		let request = request("/a?sessionid");

		assert_eq!(request.query_param("sessionid").as_deref(), Some(""));
	}
}
