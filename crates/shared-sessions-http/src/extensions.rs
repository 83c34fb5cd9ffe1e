//! Typed per-request storage
//!
//! Middleware attaches request-scoped state (such as the session context)
//! here so that handlers further down the chain can pick it up by type.
//! Clones share the same underlying map.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type AnyMap = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

/// Type-keyed extension map attached to every [`Request`](crate::Request)
#[derive(Clone, Default)]
pub struct Extensions {
	map: Arc<Mutex<AnyMap>>,
}

impl Extensions {
	/// Create an empty extension map
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a value, replacing any previous value of the same type
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Extensions;
	///
	/// #[derive(Clone)]
	/// struct RequestTag(&'static str);
	///
	/// let extensions = Extensions::new();
	/// extensions.insert(RequestTag("shared"));
	/// assert!(extensions.contains::<RequestTag>());
	/// ```
	pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
		let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.insert(TypeId::of::<T>(), Box::new(value));
	}

	/// Get a clone of the stored value of type `T`
	///
	/// # Examples
	///
	/// ```
	/// use shared_sessions_http::Extensions;
	///
	/// let extensions = Extensions::new();
	/// extensions.insert(7u8);
	/// assert_eq!(extensions.get::<u8>(), Some(7));
	/// assert_eq!(extensions.get::<u16>(), None);
	/// ```
	pub fn get<T>(&self) -> Option<T>
	where
		T: Clone + Send + Sync + 'static,
	{
		let map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.get(&TypeId::of::<T>())
			.and_then(|boxed| boxed.downcast_ref::<T>())
			.cloned()
	}

	/// Whether a value of type `T` is stored
	pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
		let map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.contains_key(&TypeId::of::<T>())
	}

	/// Take the stored value of type `T` out of the map
	pub fn remove<T>(&self) -> Option<T>
	where
		T: Send + Sync + 'static,
	{
		let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		let boxed = map.remove(&TypeId::of::<T>())?;
		boxed.downcast::<T>().ok().map(|value| *value)
	}
}
