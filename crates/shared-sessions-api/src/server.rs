//! HTTP/1.1 server
//!
//! One task per connection. On shutdown the server stops accepting and waits
//! for in-flight connections to finish, up to [`SHUTDOWN_GRACE_PERIOD`].

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use shared_sessions_http::{Handler, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// How long shutdown waits for open connections
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// HTTP server around a single handler
pub struct HttpServer {
	handler: Arc<dyn Handler>,
}

impl HttpServer {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self { handler }
	}

	/// Bind `addr` and serve until `shutdown` completes
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		shutdown: impl Future<Output = ()>,
	) -> Result<(), Box<dyn std::error::Error>> {
		let listener = TcpListener::bind(addr).await?;
		self.serve(listener, shutdown).await
	}

	/// Serve connections from an already bound listener until `shutdown`
	/// completes, then drain open connections
	pub async fn serve(
		self,
		listener: TcpListener,
		shutdown: impl Future<Output = ()>,
	) -> Result<(), Box<dyn std::error::Error>> {
		tracing::info!(address = %listener.local_addr()?, "server listening");

		let graceful = GracefulShutdown::new();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				accepted = listener.accept() => {
					let (stream, remote_addr) = match accepted {
						Ok(accepted) => accepted,
						Err(e) => {
							tracing::warn!(error = %e, "failed to accept connection");
							continue;
						}
					};
					let service = RequestService {
						handler: Arc::clone(&self.handler),
						remote_addr,
					};
					let connection = http1::Builder::new()
						.serve_connection(TokioIo::new(stream), service);
					let connection = graceful.watch(connection);

					tokio::spawn(async move {
						if let Err(e) = connection.await {
							tracing::debug!(remote = %remote_addr, error = %e, "connection error");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("shutdown signal received, draining connections");
					break;
				}
			}
		}

		tokio::select! {
			_ = graceful.shutdown() => tracing::info!("all connections closed"),
			_ = tokio::time::sleep(SHUTDOWN_GRACE_PERIOD) => {
				tracing::warn!("timed out waiting for connections to close");
			}
		}
		Ok(())
	}
}

/// Resolves on Ctrl-C
///
/// If the signal handler cannot be installed, this never resolves.
pub async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "failed to listen for shutdown signal");
		std::future::pending::<()>().await;
	}
}

struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = Arc::clone(&self.handler);
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body = body.collect().await?.to_bytes();

			let mut request = Request::new(
				parts.method,
				parts.uri,
				parts.version,
				parts.headers,
				body,
			);
			request.remote_addr = Some(remote_addr);

			let method = request.method.clone();
			let path = request.path().to_string();
			let response = handler.handle(request).await.unwrap_or_else(|e| {
				tracing::error!(method = %method, path = %path, error = %e, "request failed");
				Response::from(e)
			});
			tracing::debug!(
				method = %method,
				path = %path,
				status = response.status.as_u16(),
				"request handled"
			);

			let mut builder = hyper::Response::builder().status(response.status);
			if let Some(headers) = builder.headers_mut() {
				headers.extend(response.headers);
			}
			Ok(builder.body(Full::new(response.body))?)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use http_body_util::Empty;
	use hyper::StatusCode;
	use hyper::client::conn::http1 as client;
	use rstest::rstest;
	use shared_sessions_http::{Error, Result};
	use tokio::net::TcpStream;
	use tokio::sync::oneshot;

	struct Echo;

	#[async_trait]
	impl Handler for Echo {
		async fn handle(&self, request: Request) -> Result<Response> {
			match request.path() {
				"/fail" => Err(Error::Internal("boom".to_string())),
				path => Ok(Response::ok()
					.with_header("x-path", path)
					.with_text("hello")),
			}
		}
	}

	async fn get(addr: SocketAddr, path: &str) -> hyper::Response<Incoming> {
		let stream = TcpStream::connect(addr).await.unwrap();
		let (mut sender, connection) = client::handshake(TokioIo::new(stream)).await.unwrap();
		tokio::spawn(connection);

		let request = hyper::Request::builder()
			.uri(path)
			.header("host", addr.to_string())
			.body(Empty::<Bytes>::new())
			.unwrap();
		sender.send_request(request).await.unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_serves_until_shutdown() {
		// Arrange
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let (stop, stopped) = oneshot::channel::<()>();
		let server = tokio::spawn(async move {
			HttpServer::new(Arc::new(Echo))
				.serve(listener, async {
					let _ = stopped.await;
				})
				.await
				.map_err(|e| e.to_string())
		});

		// Act
		let ok = get(addr, "/hello").await;
		let ok_status = ok.status();
		let ok_path = ok.headers().get("x-path").cloned();
		let ok_body = ok.into_body().collect().await.unwrap().to_bytes();
		let failed = get(addr, "/fail").await;
		let failed_status = failed.status();
		let failed_body = failed.into_body().collect().await.unwrap().to_bytes();
		stop.send(()).unwrap();

		// Assert
		assert_eq!(ok_status, StatusCode::OK);
		assert_eq!(ok_path.unwrap(), "/hello");
		assert_eq!(ok_body, "hello");
		assert_eq!(failed_status, StatusCode::INTERNAL_SERVER_ERROR);
		assert!(failed_body.is_empty());
		assert!(server.await.unwrap().is_ok());
	}
}
