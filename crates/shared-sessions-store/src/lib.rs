//! Session storage for shared-sessions
//!
//! This crate holds everything below the HTTP layer:
//!
//! - [`DistributedCache`]: byte-valued cache with sliding expiration, with
//!   an in-memory backend and a Redis backend (`redis-backend` feature)
//! - [`SessionStore`] and [`Session`]: a session of named byte entries that
//!   persists as one record per key
//! - [`codec`]: JSON objects to and from entry bytes
//! - [`protection`]: signing of session keys carried in cookies
//! - [`SessionService`]: create, get, save and delete shared sessions by key

pub mod backends;
pub mod cache;
pub mod codec;
pub mod error;
pub mod key;
pub mod protection;
pub mod record;
pub mod service;
pub mod session;
pub mod store;

pub use backends::InMemoryDistributedCache;
#[cfg(feature = "redis-backend")]
pub use backends::RedisDistributedCache;
pub use cache::{CacheError, DistributedCache};
pub use codec::{JsonObject, SessionKeyJsonValue};
pub use error::{Result, SessionError};
pub use key::generate_session_key;
pub use protection::{
	DataProtectionProvider, DataProtector, HmacProtectionProvider, ProtectionError,
	SESSION_COOKIE_PURPOSE,
};
pub use service::{DistributedSessionService, SessionOptions, SessionService};
pub use session::{EstablishCheck, Session, always_establish};
pub use store::{DistributedSessionStore, SessionStore};
