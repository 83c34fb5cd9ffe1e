//! Cookie header parsing and `Set-Cookie` construction

use hyper::header::HeaderValue;

use crate::exception::{Error, Result};

/// Find a cookie value in a `Cookie` header
pub(crate) fn find_cookie(header: &str, name: &str) -> Option<String> {
	header.split(';').find_map(|pair| {
		let (key, value) = pair.trim().split_once('=')?;
		(key == name).then(|| value.to_string())
	})
}

/// Attributes applied to an outgoing cookie
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct CookieOptions {
	pub path: String,
	pub domain: Option<String>,
	pub secure: bool,
	pub http_only: bool,
	pub same_site: Option<String>,
	/// `Max-Age` in seconds; `None` makes it a browser-session cookie
	pub max_age: Option<u64>,
}

impl Default for CookieOptions {
	fn default() -> Self {
		Self {
			path: "/".to_string(),
			domain: None,
			secure: false,
			http_only: true,
			same_site: Some("Lax".to_string()),
			max_age: None,
		}
	}
}

/// Build a `Set-Cookie` header value
///
/// # Examples
///
/// ```
/// use shared_sessions_http::cookie::{CookieOptions, set_cookie_header};
///
/// let value = set_cookie_header("sessionid", "abc", &CookieOptions::default()).unwrap();
/// assert_eq!(value.to_str().unwrap(), "sessionid=abc; Path=/; HttpOnly; SameSite=Lax");
/// ```
pub fn set_cookie_header(name: &str, value: &str, options: &CookieOptions) -> Result<HeaderValue> {
	let mut parts = vec![format!("{}={}", name, value)];

	parts.push(format!("Path={}", options.path));

	if let Some(domain) = &options.domain {
		parts.push(format!("Domain={}", domain));
	}

	if options.http_only {
		parts.push("HttpOnly".to_string());
	}

	if options.secure {
		parts.push("Secure".to_string());
	}

	if let Some(same_site) = &options.same_site {
		parts.push(format!("SameSite={}", same_site));
	}

	if let Some(max_age) = options.max_age {
		parts.push(format!("Max-Age={}", max_age));
	}

	HeaderValue::from_str(&parts.join("; "))
		.map_err(|e| Error::Internal(format!("Failed to create cookie header: {}", e)))
}
