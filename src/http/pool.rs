//! Connection profiles and the registry that hands out one pooled client per profile.

// std
#[cfg(feature = "reqwest")] use std::sync::OnceLock;
// self
use crate::{_prelude::*, config::millis, http::TokenHttpClient};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient};

/// TLS protocol version pinned by a [`ConnectionProfile`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TlsProtocol {
	/// TLS 1.0.
	#[serde(rename = "TLSv1")]
	Tls1_0,
	/// TLS 1.1.
	#[serde(rename = "TLSv1.1")]
	Tls1_1,
	#[default]
	/// TLS 1.2.
	#[serde(rename = "TLSv1.2")]
	Tls1_2,
	/// TLS 1.3.
	#[serde(rename = "TLSv1.3")]
	Tls1_3,
}
impl TlsProtocol {
	/// Returns the conventional protocol label (for example `TLSv1.2`).
	pub const fn as_str(self) -> &'static str {
		match self {
			TlsProtocol::Tls1_0 => "TLSv1",
			TlsProtocol::Tls1_1 => "TLSv1.1",
			TlsProtocol::Tls1_2 => "TLSv1.2",
			TlsProtocol::Tls1_3 => "TLSv1.3",
		}
	}

	#[cfg(feature = "reqwest")]
	fn reqwest_version(self) -> reqwest::tls::Version {
		match self {
			TlsProtocol::Tls1_0 => reqwest::tls::Version::TLS_1_0,
			TlsProtocol::Tls1_1 => reqwest::tls::Version::TLS_1_1,
			TlsProtocol::Tls1_2 => reqwest::tls::Version::TLS_1_2,
			TlsProtocol::Tls1_3 => reqwest::tls::Version::TLS_1_3,
		}
	}
}
impl Display for TlsProtocol {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Connection settings identifying one pooled HTTP client.
///
/// Profiles compare by value; a [`TransportPool`] returns the same client for equal profiles.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionProfile {
	/// Maximum time to establish a connection.
	#[serde(rename = "connect_timeout_ms", with = "millis")]
	pub connect_timeout: Duration,
	/// Maximum idle time between reads on an established connection.
	#[serde(rename = "socket_timeout_ms", with = "millis")]
	pub socket_timeout: Duration,
	/// Maximum concurrent requests through the pooled client; also bounds idle connections.
	pub max_connections: usize,
	/// Pinned TLS protocol version.
	pub tls_protocol: TlsProtocol,
}
impl ConnectionProfile {
	const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::seconds(60);
	const DEFAULT_MAX_CONNECTIONS: usize = 20;
	const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::seconds(40);

	/// Overrides the connect timeout.
	pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout = timeout;

		self
	}

	/// Overrides the socket (read) timeout.
	pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
		self.socket_timeout = timeout;

		self
	}

	/// Overrides the connection limit.
	pub fn with_max_connections(mut self, max: usize) -> Self {
		self.max_connections = max;

		self
	}

	/// Overrides the pinned TLS protocol (defaults to TLS 1.2).
	pub fn with_tls_protocol(mut self, protocol: TlsProtocol) -> Self {
		self.tls_protocol = protocol;

		self
	}
}
impl Default for ConnectionProfile {
	fn default() -> Self {
		Self {
			connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
			socket_timeout: Self::DEFAULT_SOCKET_TIMEOUT,
			max_connections: Self::DEFAULT_MAX_CONNECTIONS,
			tls_protocol: TlsProtocol::default(),
		}
	}
}

/// Supplies pooled clients keyed by [`ConnectionProfile`].
///
/// Implementations must be idempotent (equal profiles yield the same `Arc`) and safe to call
/// concurrently. Pools live for the lifetime of the registry.
pub trait TransportPool
where
	Self: Send + Sync,
{
	/// Pooled client type handed out by the registry.
	type Client: ?Sized + TokenHttpClient;

	/// Returns the pooled client for `profile`, building it on first use.
	fn pool(&self, profile: &ConnectionProfile) -> Result<Arc<Self::Client>>;
}

/// Reqwest-backed [`TransportPool`].
#[cfg(feature = "reqwest")]
#[derive(Debug, Default)]
pub struct ReqwestPoolRegistry {
	pools: Mutex<HashMap<ConnectionProfile, Arc<ReqwestHttpClient>>>,
}
#[cfg(feature = "reqwest")]
impl ReqwestPoolRegistry {
	/// Process-wide registry shared by caches built with [`TokenCache::new`].
	///
	/// [`TokenCache::new`]: crate::cache::TokenCache::new
	pub fn shared() -> &'static Self {
		static SHARED: OnceLock<ReqwestPoolRegistry> = OnceLock::new();

		SHARED.get_or_init(Self::default)
	}

	/// Number of distinct profiles built so far.
	pub fn len(&self) -> usize {
		self.pools.lock().len()
	}

	/// Returns `true` when no pool has been built yet.
	pub fn is_empty(&self) -> bool {
		self.pools.lock().is_empty()
	}

	fn build(profile: &ConnectionProfile) -> Result<ReqwestHttpClient> {
		let version = profile.tls_protocol.reqwest_version();
		let client = ReqwestClient::builder()
			.connect_timeout(profile.connect_timeout.max(Duration::ZERO).unsigned_abs())
			.read_timeout(profile.socket_timeout.max(Duration::ZERO).unsigned_abs())
			.pool_max_idle_per_host(profile.max_connections)
			.min_tls_version(version)
			.max_tls_version(version)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Ok(ReqwestHttpClient::with_client(client).with_connection_limit(profile.max_connections))
	}
}
#[cfg(feature = "reqwest")]
impl TransportPool for ReqwestPoolRegistry {
	type Client = ReqwestHttpClient;

	fn pool(&self, profile: &ConnectionProfile) -> Result<Arc<Self::Client>> {
		let mut pools = self.pools.lock();

		if let Some(existing) = pools.get(profile) {
			return Ok(existing.clone());
		}

		let client = Arc::new(Self::build(profile)?);

		pools.insert(profile.clone(), client.clone());

		Ok(client)
	}
}
