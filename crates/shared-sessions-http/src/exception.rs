//! Framework error type
//!
//! Errors produced while routing or handling a request. Views that must
//! never leak failure detail catch these themselves; anything that escapes
//! the handler chain is turned into a bare `500` by the server.

use hyper::StatusCode;

/// Result alias used by handlers and middleware
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while processing a request
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The request could not be understood (malformed body, bad header)
	#[error("Bad request: {0}")]
	BadRequest(String),

	/// No route matched the request path
	#[error("Not found: {0}")]
	NotFound(String),

	/// A route matched the path but not the method
	#[error("Method not allowed: {0}")]
	MethodNotAllowed(String),

	/// A value could not be serialized into the response
	#[error("Serialization error: {0}")]
	Serialization(String),

	/// Any other failure
	#[error("Internal error: {0}")]
	Internal(String),
}

impl Error {
	/// HTTP status code that corresponds to this error
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Error;
	/// use hyper::StatusCode;
	///
	/// let error = Error::NotFound("/missing".to_string());
	/// assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
	/// ```
	pub fn status_code(&self) -> StatusCode {
		match self {
			Error::BadRequest(_) => StatusCode::BAD_REQUEST,
			Error::NotFound(_) => StatusCode::NOT_FOUND,
			Error::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
			Error::Serialization(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(error: serde_json::Error) -> Self {
		Error::Serialization(error.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Error::BadRequest("x".into()), StatusCode::BAD_REQUEST)]
	#[case(Error::NotFound("x".into()), StatusCode::NOT_FOUND)]
	#[case(Error::MethodNotAllowed("x".into()), StatusCode::METHOD_NOT_ALLOWED)]
	#[case(Error::Serialization("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
	#[case(Error::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
	fn test_status_code_mapping(#[case] error: Error, #[case] expected: StatusCode) {
		assert_eq!(error.status_code(), expected);
	}

	#[rstest]
	fn test_from_serde_json_error() {
		// Arrange
		let parse_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

		// Act
		let error: Error = parse_error.into();

		// Assert
		assert!(matches!(error, Error::Serialization(_)));
	}
}
