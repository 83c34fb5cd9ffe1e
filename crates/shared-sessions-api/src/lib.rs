//! HTTP surface of shared-sessions
//!
//! - `POST /api/session` stores a JSON array of `{"key", "jsonValue"}`
//!   entries in a new session and answers with its key as plain text
//! - `GET /api/session/{key}` returns the entries, or `404`
//! - `DELETE /api/session/{key}` deletes the session
//! - `GET /session` shows the session active for the request; visit it with
//!   `?sessionid={key}` to adopt a shared session
//!
//! [`build_app`] wires everything from settings and [`HttpServer`] serves it.

pub mod app;
pub mod consumer;
pub mod router;
pub mod server;
pub mod views;

pub use app::{App, AppError, build_app};
pub use router::SessionRouter;
pub use server::{HttpServer, shutdown_signal};
pub use views::SessionApiViews;
