//! Session middleware configuration

use shared_sessions_conf::Settings;
use shared_sessions_http::cookie::CookieOptions;
use shared_sessions_store::SessionOptions;
use std::time::Duration;

/// Cookie and timeout settings shared by the session middleware
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct SessionConfig {
	/// Cookie name
	pub cookie_name: String,
	/// Path
	pub path: String,
	/// Domain
	pub domain: Option<String>,
	/// HTTPS-only cookie
	pub secure: bool,
	/// HttpOnly flag
	pub http_only: bool,
	/// SameSite attribute
	pub same_site: Option<String>,
	/// Time without access after which a session expires
	pub idle_timeout: Duration,
	/// Limit for loading or committing a session
	pub io_timeout: Duration,
}

impl SessionConfig {
	/// Create a new configuration
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_middleware::SessionConfig;
	/// use std::time::Duration;
	///
	/// let config = SessionConfig::new("sessionid")
	///     .with_idle_timeout(Duration::from_secs(600))
	///     .with_secure(true);
	/// assert_eq!(config.cookie_name, "sessionid");
	/// assert!(config.secure);
	/// ```
	pub fn new(cookie_name: impl Into<String>) -> Self {
		Self {
			cookie_name: cookie_name.into(),
			path: "/".to_string(),
			domain: None,
			secure: false,
			http_only: true,
			same_site: Some("Lax".to_string()),
			idle_timeout: Duration::from_secs(20 * 60),
			io_timeout: Duration::from_secs(60),
		}
	}

	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();
		self
	}

	pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
		self.domain = Some(domain.into());
		self
	}

	pub fn with_secure(mut self, secure: bool) -> Self {
		self.secure = secure;
		self
	}

	pub fn with_http_only(mut self, http_only: bool) -> Self {
		self.http_only = http_only;
		self
	}

	pub fn with_same_site(mut self, same_site: impl Into<String>) -> Self {
		self.same_site = Some(same_site.into());
		self
	}

	pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
		self.idle_timeout = timeout;
		self
	}

	pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
		self.io_timeout = timeout;
		self
	}

	/// Create a `SessionConfig` from application `Settings`
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_conf::Settings;
	/// use shared_sessions_middleware::SessionConfig;
	///
	/// let config = SessionConfig::from_settings(&Settings::default());
	/// assert_eq!(config.same_site.as_deref(), Some("Lax"));
	/// assert_eq!(config.idle_timeout.as_secs(), 1200);
	/// ```
	pub fn from_settings(settings: &Settings) -> Self {
		let session = &settings.session;
		Self {
			cookie_name: session.cookie_name.clone(),
			path: session.cookie_path.clone(),
			domain: session.cookie_domain.clone(),
			secure: session.cookie_secure,
			http_only: session.cookie_httponly,
			same_site: same_site_attribute(&session.cookie_samesite),
			idle_timeout: settings.idle_timeout(),
			io_timeout: settings.io_timeout(),
		}
	}

	/// Attributes of the session cookie
	///
	/// The cookie has no `Max-Age`; the server-side idle timeout bounds the
	/// session instead.
	pub fn cookie_options(&self) -> CookieOptions {
		let mut options = CookieOptions::default();
		options.path = self.path.clone();
		options.domain = self.domain.clone();
		options.secure = self.secure;
		options.http_only = self.http_only;
		options.same_site = self.same_site.clone();
		options
	}

	pub fn session_options(&self) -> SessionOptions {
		SessionOptions {
			idle_timeout: self.idle_timeout,
			io_timeout: self.io_timeout,
		}
	}
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self::new("sessionid")
	}
}

fn same_site_attribute(value: &str) -> Option<String> {
	match value.to_ascii_lowercase().as_str() {
		"strict" => Some("Strict".to_string()),
		"lax" => Some("Lax".to_string()),
		"none" => Some("None".to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("strict", Some("Strict"))]
	#[case("LAX", Some("Lax"))]
	#[case("None", Some("None"))]
	#[case("", None)]
	fn test_same_site_attribute(#[case] value: &str, #[case] expected: Option<&str>) {
		assert_eq!(same_site_attribute(value).as_deref(), expected);
	}

	#[rstest]
	fn test_cookie_options_follow_config() {
		let config = SessionConfig::new("sid")
			.with_path("/app")
			.with_domain("example.com")
			.with_secure(true);

		let options = config.cookie_options();

		assert_eq!(options.path, "/app");
		assert_eq!(options.domain.as_deref(), Some("example.com"));
		assert!(options.secure);
		assert!(options.http_only);
		assert_eq!(options.max_age, None);
	}

	#[rstest]
	fn test_from_settings() {
		let mut settings = Settings::default();
		settings.session.cookie_name = "shared".to_string();
		settings.session.io_timeout_secs = 5;

		let config = SessionConfig::from_settings(&settings);

		assert_eq!(config.cookie_name, "shared");
		assert_eq!(config.io_timeout, Duration::from_secs(5));
		assert_eq!(config.session_options().io_timeout, Duration::from_secs(5));
	}
}
