//! Convenience re-exports and fixtures for unit tests.

pub use crate::_prelude::*;

// std
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicUsize, Ordering},
};
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode};
use tokio::sync::Semaphore;
// self
use crate::{auth::ClientCredentials, http::TokenHttpClient};

/// Token endpoint used by every fixture.
pub fn auth_server() -> Url {
	Url::parse("https://my.oauth.club/token").expect("Authorization server fixture should parse.")
}

/// Plain credentials matching every audience.
pub fn credentials(client_id: &str) -> ClientCredentials {
	ClientCredentials::builder(client_id, "abc", auth_server()).build()
}

/// Token payload with a 60 second lifetime.
pub fn sparkpost_body() -> String {
	token_body("sparkpost-token", 60)
}

/// Token payload with the given value and lifetime.
pub fn token_body(access_token: &str, expires_in: i64) -> String {
	format!(r#"{{"access_token":"{access_token}","token_type":"Bearer","expires_in":{expires_in}}}"#)
}

/// Transport failure produced by [`ScriptedHttpClient::failing`].
#[derive(Debug)]
pub struct ScriptedError(String);
impl Display for ScriptedError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Scripted transport failure: {}.", self.0)
	}
}
impl StdError for ScriptedError {}

/// Parts of the last request seen by a [`ScriptedHttpClient`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: String,
	pub uri: String,
	pub content_type: Option<String>,
	pub accept: Option<String>,
	pub body: String,
}

#[derive(Clone, Debug)]
enum Scripted {
	Respond { status: u16, body: String },
	Fail(String),
}

#[derive(Debug)]
struct Script {
	calls: AtomicUsize,
	queued: Mutex<VecDeque<Scripted>>,
	fallback: Scripted,
	last_request: Mutex<Option<RecordedRequest>>,
	gate: Option<Semaphore>,
}

/// In-process [`TokenHttpClient`] replaying scripted responses.
///
/// Queued responses are served first, then the fallback forever. A gated client parks every
/// request until [`ScriptedHttpClient::release`] hands out a permit.
#[derive(Clone, Debug)]
pub struct ScriptedHttpClient(Arc<Script>);
impl ScriptedHttpClient {
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self::with_fallback(Scripted::Respond { status, body: body.into() }, false)
	}

	pub fn failing(message: &str) -> Self {
		Self::with_fallback(Scripted::Fail(message.into()), false)
	}

	pub fn gated(status: u16, body: impl Into<String>) -> Self {
		Self::with_fallback(Scripted::Respond { status, body: body.into() }, true)
	}

	fn with_fallback(fallback: Scripted, gated: bool) -> Self {
		Self(Arc::new(Script {
			calls: AtomicUsize::new(0),
			queued: Mutex::new(VecDeque::new()),
			fallback,
			last_request: Mutex::new(None),
			gate: gated.then(|| Semaphore::new(0)),
		}))
	}

	/// Serves `body` with `status` before any fallback response.
	pub fn queue(self, status: u16, body: impl Into<String>) -> Self {
		self.0.queued.lock().push_back(Scripted::Respond { status, body: body.into() });

		self
	}

	/// Lets `requests` parked requests proceed.
	pub fn release(&self, requests: usize) {
		if let Some(gate) = &self.0.gate {
			gate.add_permits(requests);
		}
	}

	/// Requests received so far, including parked ones.
	pub fn calls(&self) -> usize {
		self.0.calls.load(Ordering::SeqCst)
	}

	pub fn last_request(&self) -> Option<RecordedRequest> {
		self.0.last_request.lock().clone()
	}

	/// Polls until at least `calls` requests arrived.
	pub async fn wait_for_calls(&self, calls: usize) {
		tokio::time::timeout(std::time::Duration::from_secs(2), async {
			while self.calls() < calls {
				tokio::time::sleep(std::time::Duration::from_millis(5)).await;
			}
		})
		.await
		.expect("Scripted client should receive the expected requests in time.");
	}
}
impl TokenHttpClient for ScriptedHttpClient {
	type Handle = ScriptedHandle;
	type TransportError = ScriptedError;

	fn handle(&self) -> Self::Handle {
		ScriptedHandle(self.0.clone())
	}
}

/// Request handle returned by [`ScriptedHttpClient`].
#[derive(Debug)]
pub struct ScriptedHandle(Arc<Script>);
impl<'c> AsyncHttpClient<'c> for ScriptedHandle {
	type Error = HttpClientError<ScriptedError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let script = self.0.clone();

		Box::pin(async move {
			let header = |name| {
				request
					.headers()
					.get(name)
					.and_then(|value| value.to_str().ok())
					.map(ToOwned::to_owned)
			};
			let recorded = RecordedRequest {
				method: request.method().to_string(),
				uri: request.uri().to_string(),
				content_type: header(oauth2::http::header::CONTENT_TYPE),
				accept: header(oauth2::http::header::ACCEPT),
				body: String::from_utf8_lossy(request.body()).into_owned(),
			};

			*script.last_request.lock() = Some(recorded);
			script.calls.fetch_add(1, Ordering::SeqCst);

			if let Some(gate) = &script.gate {
				gate.acquire().await.expect("Scripted gate should stay open.").forget();
			}

			let next = script.queued.lock().pop_front().unwrap_or_else(|| script.fallback.clone());

			match next {
				Scripted::Respond { status, body } => {
					let mut response = HttpResponse::new(body.into_bytes());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Scripted status should be valid.");

					Ok(response)
				},
				Scripted::Fail(message) =>
					Err(HttpClientError::Reqwest(Box::new(ScriptedError(message)))),
			}
		})
	}
}
