//! Token cache configuration.

// self
use crate::{_prelude::*, http::ConnectionProfile};

/// Tunables for [`TokenCache`](crate::cache::TokenCache).
///
/// Deserializable so services can load it next to their credentials list; durations are
/// expressed in milliseconds on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenCacheConfig {
	/// Remaining lifetime below which a background refresh is scheduled.
	#[serde(rename = "prefetch_window_ms", with = "millis")]
	pub prefetch_window: Duration,
	/// Maximum number of prefetch fetches running at once.
	pub prefetch_pool_size: usize,
	/// Bounded wait applied to the global lock and to every entry lock.
	#[serde(rename = "lock_timeout_ms", with = "millis")]
	pub lock_timeout: Duration,
	/// Connection profile used to obtain the pooled HTTP client.
	pub connection: ConnectionProfile,
}
impl TokenCacheConfig {
	const DEFAULT_LOCK_TIMEOUT: Duration = Duration::seconds(10);
	const DEFAULT_PREFETCH_POOL_SIZE: usize = 20;
	const DEFAULT_PREFETCH_WINDOW: Duration = Duration::seconds(60);

	/// Overrides the prefetch window (defaults to 60 seconds).
	pub fn with_prefetch_window(mut self, window: Duration) -> Self {
		self.prefetch_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Overrides the prefetch pool size (defaults to 20, never below 1).
	pub fn with_prefetch_pool_size(mut self, size: usize) -> Self {
		self.prefetch_pool_size = size.max(1);

		self
	}

	/// Overrides the lock timeout (defaults to 10 seconds).
	pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
		self.lock_timeout = if timeout.is_negative() { Duration::ZERO } else { timeout };

		self
	}

	/// Overrides the connection profile.
	pub fn with_connection(mut self, connection: ConnectionProfile) -> Self {
		self.connection = connection;

		self
	}
}
impl Default for TokenCacheConfig {
	fn default() -> Self {
		Self {
			prefetch_window: Self::DEFAULT_PREFETCH_WINDOW,
			prefetch_pool_size: Self::DEFAULT_PREFETCH_POOL_SIZE,
			lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
			connection: ConnectionProfile::default(),
		}
	}
}

/// Serde adapter encoding [`Duration`] as whole milliseconds.
pub(crate) mod millis {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub(crate) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(i64::try_from(value.whole_milliseconds()).unwrap_or(i64::MAX))
	}

	/// Negative values clamp to zero.
	pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(|ms| Duration::milliseconds(ms.max(0)))
	}
}
