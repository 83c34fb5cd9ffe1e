//! HTTP primitives for shared-sessions
//!
//! A small request/response model over `hyper` types, plus the
//! [`Handler`]/[`Middleware`] traits that the session middleware and the
//! session API are written against.

pub mod cookie;
pub mod exception;
pub mod extensions;
pub mod middleware;
pub mod request;
pub mod response;

pub use exception::{Error, Result};
pub use extensions::Extensions;
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuilder};
pub use response::Response;
