//! Transport primitives for token requests.
//!
//! The module exposes [`TokenHttpClient`], the cache's only dependency on an HTTP stack, and
//! the [`pool`] registry that hands out one pooled client per [`ConnectionProfile`]. Custom
//! transports implement [`TokenHttpClient`] and return handles that speak
//! [`oauth2::AsyncHttpClient`], so requests and responses stay plain
//! [`HttpRequest`]/[`HttpResponse`] values regardless of the client underneath.

pub mod pool;

pub use pool::*;

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use tokio::sync::Semaphore;
// self
use crate::_prelude::*;

/// Abstraction over HTTP transports capable of executing token requests.
///
/// Implementations must be `Send + Sync + 'static` so one pooled client can be shared by every
/// cache entry and by prefetch workers. The handles they return must own whatever state is
/// required so their request futures remain `Send` for the lifetime of the in-flight request.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single token request.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for one request.
	fn handle(&self) -> Self::Handle;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token endpoints return results directly, so clients built by [`ReqwestPoolRegistry`]
/// never follow redirects. Configure any custom [`ReqwestClient`] the same way.
///
/// Reqwest only bounds idle connections, so an optional connection limit caps the number of
/// requests in flight across every handle of this client. Excess requests wait for a slot.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	limit: Option<Arc<Semaphore>>,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`] without a connection limit.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, limit: None }
	}

	/// Caps concurrent requests at `max` (never below 1).
	pub fn with_connection_limit(mut self, max: usize) -> Self {
		self.limit = Some(Arc::new(Semaphore::new(max.max(1))));

		self
	}

	/// Free request slots, or `None` when the client is unbounded.
	pub fn available_connections(&self) -> Option<usize> {
		self.limit.as_ref().map(|limit| limit.available_permits())
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle { client: self.client.clone(), limit: self.limit.clone() }
	}
}

/// Request handle returned by [`ReqwestHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle {
	client: ReqwestClient,
	limit: Option<Arc<Semaphore>>,
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.client.clone();
		let limit = self.limit.clone();

		Box::pin(async move {
			// Held until the body is read.
			let _slot = match limit {
				Some(limit) => Some(
					limit
						.acquire_owned()
						.await
						.map_err(|e| HttpClientError::Other(e.to_string()))?,
				),
				None => None,
			};
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
