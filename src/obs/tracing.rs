// self
use crate::{_prelude::*, auth::ClientCredentials, obs::FetchMode};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by the cache and the fetcher.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Span covering one `obtain_token` call, tagged with the credentials fingerprint.
	pub fn obtain(stage: &'static str, credentials: &ClientCredentials) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oauth2_token_cache.obtain",
				stage,
				credentials = %credentials.fingerprint()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, credentials);

			Self {}
		}
	}

	/// Span covering one token request.
	pub fn fetch(mode: FetchMode) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth2_token_cache.fetch", mode = mode.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = mode;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Notes that a still-valid cached token was returned.
pub fn cache_hit(remaining: Duration) {
	#[cfg(feature = "tracing")]
	tracing::debug!(remaining_ms = remaining.whole_milliseconds() as i64, "Reusing cached token.");
	#[cfg(not(feature = "tracing"))]
	let _ = remaining;
}

/// Notes that the caller is waiting on an in-flight prefetch instead of fetching itself.
pub fn awaiting_prefetch() {
	#[cfg(feature = "tracing")]
	tracing::debug!("Awaiting in-flight prefetch.");
}

/// Notes that a background refresh was submitted.
pub fn prefetch_scheduled(remaining: Duration) {
	#[cfg(feature = "tracing")]
	tracing::debug!(remaining_ms = remaining.whole_milliseconds() as i64, "Scheduled prefetch.");
	#[cfg(not(feature = "tracing"))]
	let _ = remaining;
}

/// Notes that a consumed prefetch job failed.
pub fn prefetch_failed(error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %error, "Prefetch job failed.");
	#[cfg(not(feature = "tracing"))]
	let _ = error;
}
