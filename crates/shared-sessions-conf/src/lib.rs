//! Configuration for shared-sessions
//!
//! ## Example
//!
//! ```rust
//! use shared_sessions_conf::Settings;
//!
//! let mut settings = Settings::new();
//! settings.debug = true;
//! assert!(settings.validate().is_ok());
//! assert_eq!(settings.session.cookie_name, "sessionid");
//! ```

pub mod settings;

pub use settings::{
	CacheSettings, DataProtectionSettings, LoggingSettings, SessionSettings, Settings,
	SettingsError,
};
