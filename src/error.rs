//! Token cache error types shared across resolvers, transports, and the locking protocol.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical acquisition failure surfaced by [`TokenCache::obtain_token`].
///
/// Every variant carries the specific cause; nothing is retried inside the cache.
///
/// [`TokenCache::obtain_token`]: crate::cache::TokenCache::obtain_token
#[derive(Debug, ThisError)]
pub enum Error {
	/// No configured audience pattern matched the requested audience.
	#[error("No client credentials are configured for audience `{audience}`.")]
	CredentialsNotFound {
		/// Audience that failed to resolve.
		audience: String,
	},
	/// A bounded lock wait was exceeded.
	#[error(transparent)]
	Lock(#[from] LockError),
	/// The client secret could not be obtained or decrypted.
	#[error("Client secret could not be resolved.")]
	Secret(
		#[from]
		#[source]
		SecretError,
	),
	/// The token request failed.
	#[error(transparent)]
	Fetch(#[from] FetchError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Bounded lock acquisition failures.
#[derive(Debug, ThisError)]
pub enum LockError {
	/// The structural lock guarding the entry map was not acquired in time.
	#[error("Timed out after {waited} waiting for the global token cache lock.")]
	Global {
		/// How long the caller waited.
		waited: Duration,
	},
	/// The per-credentials entry lock was not acquired in time.
	#[error("Timed out after {waited} waiting for the token lock of `{auth_server}`.")]
	Entry {
		/// Authorization server the entry belongs to.
		auth_server: Url,
		/// How long the caller waited.
		waited: Duration,
	},
}

/// Secret resolution failures.
#[derive(Debug, ThisError)]
pub enum SecretError {
	/// Credentials carry an encryption key but no decryptor was configured.
	#[error("Client secret is encrypted but no decryptor is configured.")]
	DecryptorMissing,
	/// The decryptor rejected the stored secret.
	#[error("Client secret could not be decrypted.")]
	Decrypt {
		/// Decryptor-specific failure.
		#[source]
		source: BoxError,
	},
	/// Secret backend failure (vault, KMS, etc.).
	#[error("Secret backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl SecretError {
	/// Wraps a decryptor failure.
	pub fn decrypt(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Decrypt { source: Box::new(src) }
	}
}

/// Token request failures.
#[derive(Debug, ThisError)]
pub enum FetchError {
	/// The request never produced an HTTP response.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The authorization server answered with a non-success status.
	#[error("Token endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Truncated response body, when readable.
		body: Option<String>,
	},
	/// The response body was not a valid token payload.
	#[error("Token endpoint returned a malformed token payload.")]
	Parse {
		/// Structured parsing failure including the offending field path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// An awaited prefetch job failed.
	#[error("Awaited prefetch job failed.")]
	Prefetch {
		/// Failure reported by the prefetch job.
		#[source]
		source: Box<Error>,
	},
	/// An awaited prefetch worker panicked or was cancelled before completing.
	#[error("Awaited prefetch job was aborted before completing.")]
	PrefetchAborted {
		/// Runtime join failure.
		#[source]
		source: tokio::task::JoinError,
	},
	/// The prefetch pool stopped accepting work.
	#[error("Prefetch worker pool is closed.")]
	SchedulerClosed,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// HTTP client failure without a structured source.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Client-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An audience pattern is not a valid regular expression.
	#[error("Audience pattern `{pattern}` is not a valid regular expression.")]
	InvalidAudiencePattern {
		/// Offending pattern.
		pattern: String,
		/// Regex compilation failure.
		#[source]
		source: regex::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
