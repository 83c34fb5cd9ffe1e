//! Application settings
//!
//! Settings can be loaded from a TOML or JSON file, from environment
//! variables prefixed with `SHARED_SESSIONS_`, or built in code. Environment
//! variables are applied on top of file values by [`Settings::load`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_SECRET_KEY: &str = "change-me-in-production";

/// Main application settings
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
	/// Debug mode
	#[serde(default)]
	pub debug: bool,

	/// Secret key for cookie protection when no key file is configured
	#[serde(default = "default_secret_key")]
	pub secret_key: String,

	/// Address the HTTP server binds to
	#[serde(default = "default_bind_address")]
	pub bind_address: String,

	/// Session configuration
	#[serde(default)]
	pub session: SessionSettings,

	/// Distributed cache configuration
	#[serde(default)]
	pub cache: CacheSettings,

	/// Cookie protection key configuration
	#[serde(default)]
	pub data_protection: DataProtectionSettings,

	/// Logging configuration
	#[serde(default)]
	pub logging: LoggingSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			debug: false,
			secret_key: default_secret_key(),
			bind_address: default_bind_address(),
			session: SessionSettings::default(),
			cache: CacheSettings::default(),
			data_protection: DataProtectionSettings::default(),
			logging: LoggingSettings::default(),
		}
	}
}

impl Settings {
	/// Create new settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Validate settings
	///
	/// The secret key is only checked when it is actually used, i.e. when no
	/// key file is configured.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.data_protection.key_path.is_none() && !self.debug {
			if self.secret_key == DEFAULT_SECRET_KEY {
				return Err(SettingsError::ValidationError(
					"SECRET_KEY must be changed in production".to_string(),
				));
			}
			if self.secret_key.len() < 32 {
				return Err(SettingsError::ValidationError(
					"SECRET_KEY must be at least 32 characters".to_string(),
				));
			}
		}

		if self.session.idle_timeout_secs == 0 || self.session.io_timeout_secs == 0 {
			return Err(SettingsError::ValidationError(
				"Session timeouts must be greater than zero".to_string(),
			));
		}

		if self.session.cookie_name.is_empty() {
			return Err(SettingsError::ValidationError(
				"Session cookie name must not be empty".to_string(),
			));
		}

		match self.cache.backend.as_str() {
			"memory" => {}
			"redis" if self.cache.location.is_some() => {}
			"redis" => {
				return Err(SettingsError::ValidationError(
					"The redis cache backend requires cache.location".to_string(),
				));
			}
			other => {
				return Err(SettingsError::ValidationError(format!(
					"Unknown cache backend: {}",
					other
				)));
			}
		}

		if !matches!(self.logging.format.as_str(), "text" | "json") {
			return Err(SettingsError::ValidationError(format!(
				"Unknown logging format: {}",
				self.logging.format
			)));
		}

		Ok(())
	}

	/// Load settings from environment variables on top of the defaults
	pub fn from_env() -> Result<Self, SettingsError> {
		let mut settings = Self::default();
		settings.apply_env()?;
		Ok(settings)
	}

	/// Load settings from an optional file, then apply environment overrides
	pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
		let mut settings = match path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		settings.apply_env()?;
		Ok(settings)
	}

	/// Load settings from a configuration file
	///
	/// The format is picked from the extension: `.toml` or `.json`.
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path).map_err(|e| {
			SettingsError::FileError(format!("Failed to read {}: {}", path.display(), e))
		})?;

		let settings: Settings = match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => toml::from_str(&contents)
				.map_err(|e| SettingsError::ParseError(format!("TOML parse error: {}", e)))?,
			Some("json") => serde_json::from_str(&contents)
				.map_err(|e| SettingsError::ParseError(format!("JSON parse error: {}", e)))?,
			_ => {
				return Err(SettingsError::UnsupportedFormat(
					"Supported formats: .toml, .json".to_string(),
				));
			}
		};

		Ok(settings)
	}

	/// Idle timeout of a session as a duration
	pub fn idle_timeout(&self) -> Duration {
		Duration::from_secs(self.session.idle_timeout_secs)
	}

	/// I/O timeout for a single store operation as a duration
	pub fn io_timeout(&self) -> Duration {
		Duration::from_secs(self.session.io_timeout_secs)
	}

	fn apply_env(&mut self) -> Result<(), SettingsError> {
		if let Some(debug) = env_var("DEBUG") {
			self.debug = debug.to_lowercase() == "true" || debug == "1";
		}
		if let Some(secret) = env_var("SECRET_KEY") {
			self.secret_key = secret;
		}
		if let Some(bind) = env_var("BIND_ADDRESS") {
			self.bind_address = bind;
		}

		// Session
		if let Some(name) = env_var("COOKIE_NAME") {
			self.session.cookie_name = name;
		}
		if let Some(secure) = env_var("COOKIE_SECURE") {
			self.session.cookie_secure = secure.to_lowercase() == "true" || secure == "1";
		}
		if let Some(secs) = env_var("IDLE_TIMEOUT") {
			self.session.idle_timeout_secs = parse_secs("IDLE_TIMEOUT", &secs)?;
		}
		if let Some(secs) = env_var("IO_TIMEOUT") {
			self.session.io_timeout_secs = parse_secs("IO_TIMEOUT", &secs)?;
		}

		// Cache
		if let Some(backend) = env_var("CACHE_BACKEND") {
			self.cache.backend = backend;
		}
		if let Some(location) = env_var("CACHE_LOCATION") {
			self.cache.location = Some(location);
		}

		if let Some(path) = env_var("KEY_PATH") {
			self.data_protection.key_path = Some(PathBuf::from(path));
		}

		// Logging
		if let Some(level) = env_var("LOG_LEVEL") {
			self.logging.level = level;
		}
		if let Some(format) = env_var("LOG_FORMAT") {
			self.logging.format = format;
		}

		Ok(())
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(format!("SHARED_SESSIONS_{}", name)).ok()
}

fn parse_secs(name: &str, value: &str) -> Result<u64, SettingsError> {
	value.trim().parse().map_err(|e| {
		SettingsError::ParseError(format!(
			"SHARED_SESSIONS_{} must be a number of seconds: {}",
			name, e
		))
	})
}

/// Session settings
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
	pub cookie_name: String,
	pub cookie_path: String,
	pub cookie_domain: Option<String>,
	pub cookie_secure: bool,
	pub cookie_httponly: bool,
	pub cookie_samesite: String,
	/// Seconds without access before a session expires
	pub idle_timeout_secs: u64,
	/// Seconds allowed for a single load or commit
	pub io_timeout_secs: u64,
}

impl Default for SessionSettings {
	fn default() -> Self {
		Self {
			cookie_name: "sessionid".to_string(),
			cookie_path: "/".to_string(),
			cookie_domain: None,
			cookie_secure: false,
			cookie_httponly: true,
			cookie_samesite: "lax".to_string(),
			idle_timeout_secs: 1200, // 20 minutes
			io_timeout_secs: 60,
		}
	}
}

/// Cache settings
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
	/// `memory` or `redis`
	pub backend: String,
	/// Connection URL for network backends
	pub location: Option<String>,
	/// Entry count that triggers a sweep of expired in-memory entries
	pub cleanup_threshold: usize,
}

impl Default for CacheSettings {
	fn default() -> Self {
		Self {
			backend: "memory".to_string(),
			location: None,
			cleanup_threshold: 10_000,
		}
	}
}

/// Cookie protection key settings
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataProtectionSettings {
	/// File holding the shared master key; created when missing
	pub key_path: Option<PathBuf>,
}

/// Logging settings
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	/// `text` or `json`
	pub format: String,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: "text".to_string(),
		}
	}
}

fn default_secret_key() -> String {
	DEFAULT_SECRET_KEY.to_string()
}

fn default_bind_address() -> String {
	"127.0.0.1:8000".to_string()
}

/// Settings error
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("File error: {0}")]
	FileError(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Unsupported format: {0}")]
	UnsupportedFormat(String),
}
