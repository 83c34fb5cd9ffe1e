//! Application wiring
//!
//! Builds the cache, store, cookie protection, service and middleware chain
//! from [`Settings`]. Everything is constructed here once and injected.

use shared_sessions_conf::{Settings, SettingsError};
use shared_sessions_http::{Handler, MiddlewareChain};
use shared_sessions_middleware::{SessionConfig, SessionMiddleware, SharedSessionMiddleware};
#[cfg(feature = "redis-backend")]
use shared_sessions_store::RedisDistributedCache;
use shared_sessions_store::{
	CacheError, DistributedCache, DistributedSessionService,
	DistributedSessionStore, HmacProtectionProvider, InMemoryDistributedCache, ProtectionError,
	SessionService, SessionStore,
};
use std::sync::Arc;

use crate::router::SessionRouter;

/// Failure to assemble the application
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error(transparent)]
	Settings(#[from] SettingsError),

	#[error("Cache setup failed: {0}")]
	Cache(#[from] CacheError),

	#[error("Cookie protection setup failed: {0}")]
	Protection(#[from] ProtectionError),

	#[error("Unsupported cache backend: {0}")]
	UnsupportedBackend(String),
}

/// The assembled service
pub struct App {
	/// Router wrapped in the session middleware
	pub handler: Arc<dyn Handler>,
	pub service: Arc<dyn SessionService>,
}

/// Build the application from validated settings
///
/// # Examples
///
/// ```
/// use shared_sessions_api::build_app;
/// use shared_sessions_conf::Settings;
///
/// # tokio_test::block_on(async {
/// let mut settings = Settings::default();
/// settings.debug = true;
/// let app = build_app(&settings).await.unwrap();
/// assert!(app.service.get("missing").await.unwrap().is_none());
/// # });
/// ```
pub async fn build_app(settings: &Settings) -> Result<App, AppError> {
	settings.validate()?;

	let cache = build_cache(settings).await?;
	let store: Arc<dyn SessionStore> = Arc::new(DistributedSessionStore::new(Arc::clone(&cache)));
	let provider = build_protection(settings)?;
	let config = SessionConfig::from_settings(settings);

	let service: Arc<dyn SessionService> = Arc::new(DistributedSessionService::new(
		Arc::clone(&store),
		cache,
		config.session_options(),
	));

	let handler = MiddlewareChain::new(Arc::new(SessionRouter::new(Arc::clone(&service))))
		.with_middleware(Arc::new(SessionMiddleware::from_provider(
			config.clone(),
			Arc::clone(&store),
			&provider,
		)?))
		.with_middleware(Arc::new(SharedSessionMiddleware::from_provider(
			config, store, &provider,
		)?))
		.build();

	Ok(App { handler, service })
}

async fn build_cache(settings: &Settings) -> Result<Arc<dyn DistributedCache>, AppError> {
	match settings.cache.backend.as_str() {
		"memory" => {
			tracing::info!("using in-memory session cache");
			Ok(Arc::new(
				InMemoryDistributedCache::new()
					.with_cleanup_threshold(settings.cache.cleanup_threshold),
			))
		}
		#[cfg(feature = "redis-backend")]
		"redis" => {
			let location = settings.cache.location.as_deref().ok_or_else(|| {
				AppError::UnsupportedBackend("redis without cache.location".to_string())
			})?;
			let cache = RedisDistributedCache::new(location)
				.await?
				.with_key_prefix("shared-sessions");
			Ok(Arc::new(cache))
		}
		other => Err(AppError::UnsupportedBackend(other.to_string())),
	}
}

fn build_protection(settings: &Settings) -> Result<HmacProtectionProvider, AppError> {
	let provider = match &settings.data_protection.key_path {
		Some(path) => HmacProtectionProvider::from_key_file(path)?,
		None => HmacProtectionProvider::new(settings.secret_key.as_bytes())?,
	};
	Ok(provider)
}
