// self
use crate::obs::{FetchMode, FlowOutcome, ObtainPath};

/// Records a fetch outcome via the global metrics recorder (when enabled).
pub fn record_fetch_outcome(mode: FetchMode, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_token_cache_fetch_total",
			"mode" => mode.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (mode, outcome);
	}
}

/// Records how an `obtain_token` call was satisfied (when enabled).
pub fn record_obtain_path(path: ObtainPath) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_token_cache_obtain_total", "path" => path.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = path;
	}
}
