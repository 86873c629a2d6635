//! Per-credentials cache slot.

// crates.io
use async_lock::MutexGuard;
// self
use crate::{_prelude::*, auth::Token, cache::PrefetchJob, error::LockError};

/// Token and in-flight refresh owned by one set of credentials.
///
/// Both fields are only reachable through [`CacheEntry::lock`].
#[derive(Debug, Default)]
pub(crate) struct EntryState {
	pub(crate) token: Option<Token>,
	pub(crate) job: Option<PrefetchJob>,
}

#[derive(Debug)]
pub(crate) struct CacheEntry {
	auth_server: Url,
	state: AsyncMutex<EntryState>,
}
impl CacheEntry {
	pub(crate) fn new(auth_server: Url) -> Self {
		Self { auth_server, state: AsyncMutex::new(EntryState::default()) }
	}

	/// Acquires the entry lock, giving up after `timeout`; negative timeouts do not wait.
	pub(crate) async fn lock(&self, timeout: Duration) -> Result<MutexGuard<'_, EntryState>> {
		let wait = timeout.max(Duration::ZERO).unsigned_abs();

		tokio::time::timeout(wait, self.state.lock()).await.map_err(|_| {
			LockError::Entry { auth_server: self.auth_server.clone(), waited: timeout }.into()
		})
	}
}
