//! Integration tests for shared session adoption
//!
//! Runs `SessionMiddleware` and `SharedSessionMiddleware` in their production
//! order around test handlers, against one in-memory cache.

use async_trait::async_trait;
use hyper::StatusCode;
use hyper::header::SET_COOKIE;
use rstest::{fixture, rstest};
use serde_json::json;
use shared_sessions_http::{
	Error, Handler, MiddlewareChain, Request, Response, Result,
};
use shared_sessions_middleware::{
	SessionConfig, SessionContext, SessionMiddleware, SharedSessionMiddleware,
};
use shared_sessions_store::codec::encode;
use shared_sessions_store::protection::unprotect_cookie_value;
use shared_sessions_store::{
	CacheError, DataProtectionProvider, DistributedCache, DistributedSessionService,
	DistributedSessionStore, HmacProtectionProvider, InMemoryDistributedCache,
	SESSION_COOKIE_PURPOSE, SessionKeyJsonValue, SessionOptions, SessionService, SessionStore,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a handler observed about its request
#[derive(Debug, Default, Clone)]
struct Observed {
	uri: String,
	session_key: String,
	entries: Vec<String>,
}

#[derive(Clone, Copy)]
enum Outcome {
	Succeed,
	Fail,
	Panic,
	Hang,
}

/// Records the request, writes a `visit` entry, then ends as told
struct ConsumerPage {
	observed: Arc<Mutex<Observed>>,
	outcome: Outcome,
}

#[async_trait]
impl Handler for ConsumerPage {
	async fn handle(&self, request: Request) -> Result<Response> {
		let context = SessionContext::from_request(&request).unwrap();
		let session = context.session();
		{
			let mut session = session.lock().await;
			*self.observed.lock().unwrap() = Observed {
				uri: request.uri.to_string(),
				session_key: session.key().to_string(),
				entries: session.keys().map(str::to_string).collect(),
			};
			let visit = json!({"page": request.path()});
			session
				.set("visit", encode(visit.as_object().unwrap()))
				.unwrap();
		}

		match self.outcome {
			Outcome::Succeed => Ok(Response::ok()),
			Outcome::Fail => Err(Error::Internal("consumer page failed".to_string())),
			Outcome::Panic => panic!("consumer page panicked"),
			Outcome::Hang => {
				std::future::pending::<()>().await;
				Ok(Response::ok())
			}
		}
	}
}

/// In-memory cache whose reads of one key fail
struct UnreadableKeyCache {
	inner: InMemoryDistributedCache,
	unreadable: String,
}

#[async_trait]
impl DistributedCache for UnreadableKeyCache {
	async fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, CacheError> {
		if key == self.unreadable {
			return Err(CacheError::Connection("connection reset".to_string()));
		}
		self.inner.get(key).await
	}

	async fn set(
		&self,
		key: &str,
		value: Vec<u8>,
		sliding_expiration: Duration,
	) -> std::result::Result<(), CacheError> {
		self.inner.set(key, value, sliding_expiration).await
	}

	async fn refresh(&self, key: &str) -> std::result::Result<(), CacheError> {
		self.inner.refresh(key).await
	}

	async fn remove(&self, key: &str) -> std::result::Result<(), CacheError> {
		self.inner.remove(key).await
	}
}

struct Harness {
	service: Arc<DistributedSessionService>,
	store: Arc<dyn SessionStore>,
	provider: HmacProtectionProvider,
	observed: Arc<Mutex<Observed>>,
}

impl Harness {
	fn chain(&self, outcome: Outcome) -> Arc<dyn Handler> {
		let config = SessionConfig::default();
		let page = ConsumerPage {
			observed: Arc::clone(&self.observed),
			outcome,
		};
		MiddlewareChain::new(Arc::new(page))
			.with_middleware(Arc::new(
				SessionMiddleware::from_provider(
					config.clone(),
					Arc::clone(&self.store),
					&self.provider,
				)
				.unwrap(),
			))
			.with_middleware(Arc::new(
				SharedSessionMiddleware::from_provider(
					config,
					Arc::clone(&self.store),
					&self.provider,
				)
				.unwrap(),
			))
			.build()
	}

	async fn create_shared_session(&self) -> String {
		let cart = json!({"items": 2}).as_object().cloned().unwrap();
		self.service
			.create(Some(&[SessionKeyJsonValue::new("cart", cart)]))
			.await
			.unwrap()
	}

	async fn entry_names(&self, key: &str) -> Vec<String> {
		self.service
			.get(key)
			.await
			.unwrap()
			.unwrap_or_default()
			.into_iter()
			.map(|value| value.key)
			.collect()
	}

	fn observed(&self) -> Observed {
		self.observed.lock().unwrap().clone()
	}

	/// Session key carried by the response's session cookie
	fn cookie_key(&self, response: &Response) -> Option<String> {
		let config = SessionConfig::default();
		let protector = self
			.provider
			.create_protector(SESSION_COOKIE_PURPOSE)
			.unwrap();
		response
			.headers
			.get_all(SET_COOKIE)
			.iter()
			.filter_map(|header| header.to_str().ok())
			.filter_map(|header| header.split(';').next())
			.filter_map(|pair| pair.split_once('='))
			.find(|(name, _)| *name == config.cookie_name)
			.map(|(_, value)| unprotect_cookie_value(protector.as_ref(), value).unwrap())
	}
}

#[fixture]
fn harness() -> Harness {
	harness_over(Arc::new(InMemoryDistributedCache::new()))
}

fn harness_over(cache: Arc<dyn DistributedCache>) -> Harness {
	let store: Arc<dyn SessionStore> = Arc::new(DistributedSessionStore::new(cache.clone()));
	let service = Arc::new(DistributedSessionService::new(
		store.clone(),
		cache,
		SessionOptions::default(),
	));
	Harness {
		service,
		store,
		provider: HmacProtectionProvider::new("0123456789abcdef0123456789abcdef").unwrap(),
		observed: Arc::new(Mutex::new(Observed::default())),
	}
}

fn get(uri: &str) -> Request {
	Request::builder().uri(uri).build().unwrap()
}

#[rstest]
#[tokio::test]
async fn test_adopts_shared_session(harness: Harness) {
	// Arrange
	let key = harness.create_shared_session().await;
	let chain = harness.chain(Outcome::Succeed);

	// Act
	let response = chain
		.handle(get(&format!("/shop?tab=1&sessionid={}", key)))
		.await
		.unwrap();

	// Assert
	let observed = harness.observed();
	assert_eq!(observed.uri, "/shop?tab=1");
	assert_eq!(observed.session_key, key);
	assert_eq!(observed.entries, vec!["cart"]);
	assert_eq!(harness.entry_names(&key).await, vec!["cart", "visit"]);
	assert!(response.headers.get(SET_COOKIE).is_some());
	assert_eq!(response.headers.get("cache-control").unwrap(), "no-cache");
}

#[rstest]
#[tokio::test]
async fn test_query_key_is_case_insensitive(harness: Harness) {
	let key = harness.create_shared_session().await;
	let chain = harness.chain(Outcome::Succeed);

	chain
		.handle(get(&format!("/shop?SessionId={}", key)))
		.await
		.unwrap();

	let observed = harness.observed();
	assert_eq!(observed.uri, "/shop");
	assert_eq!(observed.session_key, key);
}

#[rstest]
#[tokio::test]
async fn test_cookie_resolves_to_shared_session_on_next_visit(harness: Harness) {
	// Arrange
	let key = harness.create_shared_session().await;
	let chain = harness.chain(Outcome::Succeed);
	let first = chain
		.handle(get(&format!("/shop?sessionid={}", key)))
		.await
		.unwrap();
	let set_cookie = first.headers.get(SET_COOKIE).unwrap().to_str().unwrap();
	let cookie = set_cookie.split(';').next().unwrap();

	// Act
	let second = Request::builder()
		.uri("/checkout")
		.header("cookie", cookie)
		.build()
		.unwrap();
	let response = chain.handle(second).await.unwrap();

	// Assert
	let observed = harness.observed();
	assert_eq!(observed.session_key, key);
	assert_eq!(observed.entries, vec!["cart", "visit"]);
	assert!(response.headers.get(SET_COOKIE).is_none());
}

#[rstest]
#[tokio::test]
async fn test_unknown_key_behaves_like_plain_request(harness: Harness) {
	// Arrange
	let chain = harness.chain(Outcome::Succeed);
	let unknown = "00000000-0000-4000-8000-000000000000";

	// Act
	chain
		.handle(get(&format!("/shop?sessionid={}&tab=1", unknown)))
		.await
		.unwrap();

	// Assert
	let observed = harness.observed();
	assert_eq!(observed.uri, "/shop?tab=1");
	assert_ne!(observed.session_key, unknown);
	assert!(observed.entries.is_empty());
	assert!(harness.entry_names(unknown).await.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_unreadable_shared_session_falls_back_to_own_session() {
	// Arrange
	let shared_key = "11111111-1111-4111-8111-111111111111";
	let harness = harness_over(Arc::new(UnreadableKeyCache {
		inner: InMemoryDistributedCache::new(),
		unreadable: shared_key.to_string(),
	}));
	let chain = harness.chain(Outcome::Succeed);

	// Act
	let response = chain
		.handle(get(&format!("/shop?tab=1&sessionid={}", shared_key)))
		.await
		.unwrap();

	// Assert
	let observed = harness.observed();
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(observed.uri, "/shop?tab=1");
	assert_ne!(observed.session_key, shared_key);
	assert!(observed.entries.is_empty());
	assert_eq!(harness.cookie_key(&response), Some(observed.session_key));
}

#[rstest]
#[tokio::test]
async fn test_request_without_key_is_untouched(harness: Harness) {
	let chain = harness.chain(Outcome::Succeed);

	chain.handle(get("/shop?tab=1")).await.unwrap();

	assert_eq!(harness.observed().uri, "/shop?tab=1");
}

#[rstest]
#[tokio::test]
async fn test_commits_when_handler_fails(harness: Harness) {
	// Arrange
	let key = harness.create_shared_session().await;
	let chain = harness.chain(Outcome::Fail);

	// Act
	let response = chain
		.handle(get(&format!("/shop?sessionid={}", key)))
		.await
		.unwrap();

	// Assert
	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(response.body.is_empty());
	assert_eq!(harness.cookie_key(&response).as_deref(), Some(key.as_str()));
	assert_eq!(harness.entry_names(&key).await, vec!["cart", "visit"]);
}

#[rstest]
#[tokio::test]
async fn test_commits_when_handler_panics(harness: Harness) {
	// Arrange
	let key = harness.create_shared_session().await;
	let chain = harness.chain(Outcome::Panic);
	let request = get(&format!("/shop?sessionid={}", key));

	// Act
	let joined = tokio::spawn(async move { chain.handle(request).await }).await;

	// Assert
	assert!(joined.unwrap_err().is_panic());
	assert_eq!(harness.entry_names(&key).await, vec!["cart", "visit"]);
}

#[rstest]
#[tokio::test]
async fn test_commits_when_request_is_cancelled(harness: Harness) {
	// Arrange
	let key = harness.create_shared_session().await;
	let chain = harness.chain(Outcome::Hang);
	let request = get(&format!("/shop?sessionid={}", key));

	// Act
	let timed_out = tokio::time::timeout(Duration::from_millis(50), chain.handle(request)).await;
	tokio::time::sleep(Duration::from_millis(50)).await;

	// Assert
	assert!(timed_out.is_err());
	assert_eq!(harness.entry_names(&key).await, vec!["cart", "visit"]);
}
