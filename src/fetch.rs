//! One client-credentials round trip against an authorization server.
//!
//! [`TokenFetcher`] resolves the client secret, posts the form-encoded grant to the
//! credentials' `auth_server`, and turns the JSON answer into a [`Token`]. It performs exactly
//! one attempt; retries, caching, and single-flight coordination belong to
//! [`TokenCache`](crate::cache::TokenCache).

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use serde::{
	Deserializer,
	de::{Error as DeError, Unexpected, Visitor},
};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, Token},
	error::{ConfigError, FetchError, TransportError},
	http::TokenHttpClient,
	obs::{self, FetchMode, FlowOutcome, FlowSpan},
	resolver::SecretResolver,
};

/// Boxed future returned by [`TokenFetcher::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Token>> + 'a + Send>>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_ACCEPT: &str = "application/json";
const BODY_PREVIEW_LIMIT: usize = 256;

/// Successful token endpoint payload.
#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	token_type: String,
	#[serde(deserialize_with = "lifetime_seconds")]
	expires_in: i64,
}

/// Accepts `expires_in` as any JSON number; fractional seconds are truncated.
fn lifetime_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: Deserializer<'de>,
{
	struct LifetimeVisitor;
	impl Visitor<'_> for LifetimeVisitor {
		type Value = i64;

		fn expecting(&self, f: &mut Formatter) -> FmtResult {
			f.write_str("a number of seconds")
		}

		fn visit_i64<E>(self, value: i64) -> Result<i64, E>
		where
			E: DeError,
		{
			Ok(value)
		}

		fn visit_u64<E>(self, value: u64) -> Result<i64, E>
		where
			E: DeError,
		{
			i64::try_from(value).map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
		}

		fn visit_f64<E>(self, value: f64) -> Result<i64, E>
		where
			E: DeError,
		{
			if !value.is_finite() || value.abs() >= i64::MAX as f64 {
				return Err(E::invalid_value(Unexpected::Float(value), &self));
			}

			Ok(value.trunc() as i64)
		}
	}

	deserializer.deserialize_any(LifetimeVisitor)
}

/// Performs token requests over a shared [`TokenHttpClient`].
pub struct TokenFetcher<C>
where
	C: ?Sized + TokenHttpClient,
{
	http_client: Arc<C>,
	secrets: Arc<dyn SecretResolver>,
}
impl<C> TokenFetcher<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a fetcher over the provided transport and secret resolver.
	pub fn new(http_client: impl Into<Arc<C>>, secrets: Arc<dyn SecretResolver>) -> Self {
		Self { http_client: http_client.into(), secrets }
	}

	/// Requests a fresh token for `credentials`.
	///
	/// The future owns no lock; callers decide where the result is stored.
	pub fn fetch<'a>(
		&'a self,
		credentials: &'a ClientCredentials,
		mode: FetchMode,
	) -> FetchFuture<'a> {
		let span = FlowSpan::fetch(mode);

		Box::pin(async move {
			obs::record_fetch_outcome(mode, FlowOutcome::Attempt);

			let result = span.instrument(self.fetch_once(credentials)).await;

			match &result {
				Ok(_) => obs::record_fetch_outcome(mode, FlowOutcome::Success),
				Err(_) => obs::record_fetch_outcome(mode, FlowOutcome::Failure),
			}

			result
		})
	}

	async fn fetch_once(&self, credentials: &ClientCredentials) -> Result<Token> {
		let secret = self.secrets.resolve(credentials).await?;
		let request = build_request(credentials, secret.expose())?;
		let handle = self.http_client.handle();
		let response = handle.call(request).await.map_err(map_transport_error)?;

		parse_response(response)
	}
}
impl<C> Debug for TokenFetcher<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenFetcher").finish_non_exhaustive()
	}
}

fn build_request(credentials: &ClientCredentials, client_secret: &str) -> Result<HttpRequest> {
	let body = Serializer::new(String::new())
		.append_pair("grant_type", credentials.grant_type())
		.append_pair("client_id", credentials.client_id())
		.append_pair("client_secret", client_secret)
		.finish();
	let request = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(credentials.auth_server().as_str())
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, JSON_ACCEPT)
		.body(body.into_bytes())
		.map_err(ConfigError::from)?;

	Ok(request)
}

fn parse_response(response: HttpResponse) -> Result<Token> {
	let status = response.status();

	if !status.is_success() {
		return Err(FetchError::Status {
			status: status.as_u16(),
			body: body_preview(response.body()),
		}
		.into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let payload: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| FetchError::Parse { source })?;

	Ok(Token::new(payload.access_token, payload.token_type, payload.expires_in))
}

fn body_preview(body: &[u8]) -> Option<String> {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return None;
	}

	Some(trimmed.chars().take(BODY_PREVIEW_LIMIT).collect())
}

fn map_transport_error<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let transport = match err {
		HttpClientError::Reqwest(inner) => TransportError::Network { source: inner },
		HttpClientError::Http(inner) => return ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner),
		HttpClientError::Other(message) => TransportError::Other { message },
		other => TransportError::Other { message: other.to_string() },
	};

	FetchError::from(transport).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, error::SecretError, resolver::DefaultSecretResolver};

	fn fetcher(client: ScriptedHttpClient) -> TokenFetcher<ScriptedHttpClient> {
		TokenFetcher::new(client, Arc::new(DefaultSecretResolver::default()))
	}

	#[tokio::test]
	async fn posts_form_encoded_grant() {
		let client = ScriptedHttpClient::new(200, sparkpost_body());
		let fetcher = fetcher(client.clone());
		let credentials = ClientCredentials::builder("xyz", "a&b=c", auth_server()).build();

		fetcher
			.fetch(&credentials, FetchMode::Synchronous)
			.await
			.expect("Scripted token response should parse.");

		let request = client.last_request().expect("Fetcher should send one request.");

		assert_eq!(request.method, "POST");
		assert_eq!(request.uri, "https://my.oauth.club/token");
		assert_eq!(request.content_type.as_deref(), Some(FORM_CONTENT_TYPE));
		assert_eq!(request.accept.as_deref(), Some(JSON_ACCEPT));
		assert_eq!(
			request.body,
			"grant_type=client_credentials&client_id=xyz&client_secret=a%26b%3Dc"
		);
	}

	#[tokio::test]
	async fn parses_token_payload_and_applies_skew() {
		let fetcher = fetcher(ScriptedHttpClient::new(200, sparkpost_body()));
		let token = fetcher
			.fetch(&credentials("xyz"), FetchMode::Synchronous)
			.await
			.expect("Scripted token response should parse.");

		assert_eq!(token.access_token().expose(), "sparkpost-token");
		assert_eq!(token.token_type(), "Bearer");
		assert_eq!(token.expires_in(), 50);
		assert!(!token.has_expired());
	}

	#[tokio::test]
	async fn non_success_status_reports_truncated_body() {
		let long_body = "x".repeat(1_000);
		let fetcher = fetcher(ScriptedHttpClient::new(401, long_body));
		let err = fetcher
			.fetch(&credentials("xyz"), FetchMode::Synchronous)
			.await
			.expect_err("401 responses should fail.");

		match err {
			Error::Fetch(FetchError::Status { status, body }) => {
				assert_eq!(status, 401);
				assert_eq!(body.map(|b| b.len()), Some(BODY_PREVIEW_LIMIT));
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[tokio::test]
	async fn malformed_payload_reports_field_path() {
		let fetcher = fetcher(ScriptedHttpClient::new(
			200,
			r#"{"access_token":"a","token_type":"Bearer","expires_in":"soon"}"#,
		));
		let err = fetcher
			.fetch(&credentials("xyz"), FetchMode::Synchronous)
			.await
			.expect_err("String lifetimes should be rejected.");

		match err {
			Error::Fetch(FetchError::Parse { source }) => {
				assert_eq!(source.path().to_string(), "expires_in");
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[tokio::test]
	async fn float_encoded_lifetimes_are_accepted() {
		let fetcher = fetcher(
			ScriptedHttpClient::new(
				200,
				r#"{"access_token":"a","token_type":"Bearer","expires_in":3600.0}"#,
			)
			.queue(200, r#"{"access_token":"b","token_type":"Bearer","expires_in":90.9}"#),
		);
		let fractional = fetcher
			.fetch(&credentials("xyz"), FetchMode::Synchronous)
			.await
			.expect("Fractional seconds should be truncated.");
		let whole = fetcher
			.fetch(&credentials("xyz"), FetchMode::Synchronous)
			.await
			.expect("Float-encoded whole seconds should parse.");

		assert_eq!(fractional.access_token().expose(), "b");
		assert_eq!(fractional.expires_in(), 80);
		assert_eq!(whole.access_token().expose(), "a");
		assert_eq!(whole.expires_in(), 3_590);
	}

	#[tokio::test]
	async fn secret_failures_skip_the_network() {
		let client = ScriptedHttpClient::new(200, sparkpost_body());
		let fetcher = fetcher(client.clone());
		let encrypted = ClientCredentials::builder("xyz", "cipher", auth_server())
			.secret_encryption_key("kms-key")
			.build();
		let err = fetcher
			.fetch(&encrypted, FetchMode::Synchronous)
			.await
			.expect_err("Encrypted secrets without a decryptor should fail.");

		assert!(matches!(err, Error::Secret(SecretError::DecryptorMissing)));
		assert_eq!(client.calls(), 0);
	}

	#[tokio::test]
	async fn transport_failures_map_to_fetch_errors() {
		let fetcher = fetcher(ScriptedHttpClient::failing("connection reset"));
		let err = fetcher
			.fetch(&credentials("xyz"), FetchMode::Prefetch)
			.await
			.expect_err("Transport failures should surface.");

		assert!(matches!(err, Error::Fetch(FetchError::Transport(TransportError::Network { .. }))));
	}

	#[test]
	fn empty_bodies_have_no_preview() {
		assert_eq!(body_preview(b"  \n"), None);
		assert_eq!(body_preview(b" denied "), Some("denied".into()));
	}
}
