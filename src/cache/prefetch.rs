//! Bounded background refresh of tokens that are about to expire.

// crates.io
use tokio::{sync::Semaphore, task::JoinHandle};
// self
use crate::{_prelude::*, auth::Token, error::FetchError};

/// Runs refresh fetches on the Tokio runtime, at most `pool_size` at a time.
///
/// Submission never waits: every job is spawned immediately and queues on a semaphore permit
/// before doing any work. Submitted jobs are never cancelled.
#[derive(Debug)]
pub struct PrefetchScheduler {
	permits: Arc<Semaphore>,
	pool_size: usize,
}
impl PrefetchScheduler {
	/// Creates a scheduler allowing `pool_size` concurrent jobs (at least one).
	pub fn new(pool_size: usize) -> Self {
		let pool_size = pool_size.max(1);

		Self { permits: Arc::new(Semaphore::new(pool_size)), pool_size }
	}

	/// Maximum number of jobs running at once.
	pub fn pool_size(&self) -> usize {
		self.pool_size
	}

	/// Permits currently free.
	pub fn available(&self) -> usize {
		self.permits.available_permits()
	}

	/// Spawns `job`; it starts once a permit frees up.
	///
	/// # Panics
	///
	/// Panics when called outside a Tokio runtime.
	pub fn submit<F>(&self, job: F) -> PrefetchJob
	where
		F: 'static + Send + Future<Output = Result<Token>>,
	{
		let permits = self.permits.clone();
		let handle = tokio::spawn(async move {
			let _permit = permits.acquire_owned().await.map_err(|_| FetchError::SchedulerClosed)?;

			job.await
		});

		PrefetchJob { handle }
	}

	/// Stops handing out permits; queued and future jobs fail with
	/// [`FetchError::SchedulerClosed`]. Jobs already running finish normally.
	pub fn close(&self) {
		self.permits.close();
	}
}

/// Handle to one submitted refresh.
#[derive(Debug)]
pub struct PrefetchJob {
	handle: JoinHandle<Result<Token>>,
}
impl PrefetchJob {
	/// Returns `true` once the job produced a result.
	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}

	/// Waits for the job without a timeout.
	///
	/// A failed job surfaces as [`FetchError::Prefetch`]; a panicked or cancelled worker as
	/// [`FetchError::PrefetchAborted`]. The handle must not be polled again after this
	/// resolves, so owners drop the job once its result is consumed. Dropping the returned
	/// future early leaves the job intact.
	pub async fn wait(&mut self) -> Result<Token> {
		match (&mut self.handle).await {
			Ok(Ok(token)) => Ok(token),
			Ok(Err(e)) => Err(FetchError::Prefetch { source: Box::new(e) }.into()),
			Err(source) => Err(FetchError::PrefetchAborted { source }.into()),
		}
	}
}
