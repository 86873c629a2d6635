//! Optional observability helpers for token acquisition.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every [`TokenCache::obtain_token`] call inside an
//!   `oauth2_token_cache.obtain` span (fields `stage` and `credentials`, the credentials
//!   fingerprint) and every token request inside an `oauth2_token_cache.fetch` span (field
//!   `mode`). Cache reuse, awaited prefetches, and newly scheduled prefetches emit `debug`
//!   events; a consumed prefetch failure emits a `warn` event.
//! - Enable `metrics` to increment `oauth2_token_cache_fetch_total` for every fetch
//!   attempt/success/failure (labels `mode` + `outcome`) and
//!   `oauth2_token_cache_obtain_total` once per call (label `path`).
//!
//! Secrets never reach spans, events, or labels.
//!
//! [`TokenCache::obtain_token`]: crate::cache::TokenCache::obtain_token

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// How a token request was triggered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchMode {
	/// Issued inline because the caller had no usable token.
	Synchronous,
	/// Issued by a background prefetch worker.
	Prefetch,
}
impl FetchMode {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchMode::Synchronous => "sync",
			FetchMode::Prefetch => "prefetch",
		}
	}
}
impl Display for FetchMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// A token request is about to be sent.
	Attempt,
	/// The token endpoint returned a usable token.
	Success,
	/// The request failed before producing a token.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Where the token returned by one `obtain_token` call came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObtainPath {
	/// The cached token was still valid.
	Cached,
	/// An in-flight prefetch was awaited and its token adopted.
	Prefetched,
	/// A synchronous fetch produced the token.
	Fetched,
	/// The call returned an error.
	Failed,
}
impl ObtainPath {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ObtainPath::Cached => "cached",
			ObtainPath::Prefetched => "prefetched",
			ObtainPath::Fetched => "fetched",
			ObtainPath::Failed => "failed",
		}
	}
}
impl Display for ObtainPath {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(FetchMode::Synchronous.to_string(), "sync");
		assert_eq!(FetchMode::Prefetch.to_string(), "prefetch");
		assert_eq!(FlowOutcome::Failure.to_string(), "failure");
		assert_eq!(ObtainPath::Prefetched.to_string(), "prefetched");
	}
}
