//! Error types for the session store and service

use std::time::Duration;

use crate::cache::CacheError;

/// Result alias used across the store
pub type Result<T> = std::result::Result<T, SessionError>;

/// Failure of a session operation
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
	/// A required argument was missing or malformed
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// No session for the key
	///
	/// The service reports absence as `Ok(None)`; this variant is for store
	/// implementations that have to fail on a missing session.
	#[error("Session not found: {0}")]
	NotFound(String),

	/// Stored bytes were not a UTF-8 JSON object
	#[error("Parse error: {0}")]
	Parse(String),

	/// Cache unavailable or record corrupt
	#[error("Store error: {0}")]
	Store(String),

	#[error("Session operation timed out after {0:?}")]
	Timeout(Duration),

	/// The session refused to be established
	#[error("Session unavailable: {0}")]
	Unavailable(String),

	#[error("Commit failed: {0}")]
	Commit(String),
}

impl From<CacheError> for SessionError {
	fn from(error: CacheError) -> Self {
		SessionError::Store(error.to_string())
	}
}

impl From<serde_json::Error> for SessionError {
	fn from(error: serde_json::Error) -> Self {
		SessionError::Parse(error.to_string())
	}
}
