//! Single-flight token cache keyed by client credentials.
//!
//! [`TokenCache::obtain_token`] resolves an audience to its [`ClientCredentials`], then walks a
//! two-tier locking protocol: a short, bounded global lock finds or creates the credentials'
//! entry, and a bounded per-entry lock serializes every decision about that entry's token.
//! Unrelated credentials never wait on each other, at most one request per credentials is in
//! flight, and callers whose token ran out prefer awaiting an in-flight prefetch over issuing
//! a second request.

pub mod prefetch;

mod entry;

pub use prefetch::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, Token},
	config::TokenCacheConfig,
	error::LockError,
	fetch::TokenFetcher,
	http::{TokenHttpClient, TransportPool},
	obs::{self, FetchMode, FlowSpan, ObtainPath},
	resolver::{CredentialsResolver, SecretResolver},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestPoolRegistry};
use entry::{CacheEntry, EntryState};

#[cfg(feature = "reqwest")]
/// Cache specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenCache = TokenCache<ReqwestHttpClient>;

/// Caches client-credentials tokens per [`ClientCredentials`] and refreshes them ahead of
/// expiry.
///
/// Share one cache (for example behind an [`Arc`]) across the whole process. Entries are
/// created on first use and never evicted.
pub struct TokenCache<C>
where
	C: ?Sized + TokenHttpClient,
{
	config: TokenCacheConfig,
	credentials: Arc<dyn CredentialsResolver>,
	fetcher: Arc<TokenFetcher<C>>,
	prefetch: PrefetchScheduler,
	entries: Mutex<HashMap<ClientCredentials, Arc<CacheEntry>>>,
}
impl<C> TokenCache<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a cache that reuses the caller-provided transport.
	pub fn with_http_client(
		config: TokenCacheConfig,
		credentials: Arc<dyn CredentialsResolver>,
		secrets: Arc<dyn SecretResolver>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		let prefetch = PrefetchScheduler::new(config.prefetch_pool_size);

		Self {
			fetcher: Arc::new(TokenFetcher::new(http_client, secrets)),
			credentials,
			prefetch,
			config,
			entries: Default::default(),
		}
	}

	/// Creates a cache whose transport comes from `pool`, keyed by `config.connection`.
	pub fn with_transport<P>(
		config: TokenCacheConfig,
		credentials: Arc<dyn CredentialsResolver>,
		secrets: Arc<dyn SecretResolver>,
		pool: &P,
	) -> Result<Self>
	where
		P: ?Sized + TransportPool<Client = C>,
	{
		let http_client = pool.pool(&config.connection)?;

		Ok(Self::with_http_client(config, credentials, secrets, http_client))
	}

	/// Configuration the cache was built with.
	pub fn config(&self) -> &TokenCacheConfig {
		&self.config
	}

	/// Number of distinct credentials seen so far.
	pub fn entry_count(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns a valid token for `audience`.
	///
	/// The cached token is returned while it is unexpired. Otherwise the call awaits the
	/// in-flight prefetch for the same credentials, if any, and falls back to a synchronous
	/// request. Whenever the returned token's remaining lifetime is below
	/// [`TokenCacheConfig::prefetch_window`], a background refresh is scheduled unless one is
	/// already pending.
	///
	/// Every lock wait is bounded by [`TokenCacheConfig::lock_timeout`]; awaiting a prefetch is
	/// not. A failed request leaves the previously cached token in place.
	///
	/// Must run inside a Tokio runtime. The global lock is a blocking mutex: under contention
	/// the wait for it (at most the lock timeout) blocks the calling worker thread, though it
	/// is only ever held for a map lookup.
	pub async fn obtain_token(&self, audience: &Url) -> Result<Token> {
		let credentials = match self.credentials.resolve(audience) {
			Ok(credentials) => credentials,
			Err(e) => {
				obs::record_obtain_path(ObtainPath::Failed);

				return Err(e);
			},
		};
		let span = FlowSpan::obtain("obtain_token", &credentials);
		let result = span.instrument(self.obtain_for(&credentials)).await;

		match result {
			Ok((token, path)) => {
				obs::record_obtain_path(path);

				Ok(token)
			},
			Err(e) => {
				obs::record_obtain_path(ObtainPath::Failed);

				Err(e)
			},
		}
	}

	async fn obtain_for(&self, credentials: &ClientCredentials) -> Result<(Token, ObtainPath)> {
		let entry = self.entry_for(credentials)?;
		let mut state = entry.lock(self.config.lock_timeout).await?;
		let (token, path) = match state.token.clone().filter(|token| !token.has_expired()) {
			Some(cached) => {
				obs::cache_hit(cached.remaining_time());

				(cached, ObtainPath::Cached)
			},
			None => self.refresh(credentials, &mut state).await?,
		};

		state.token = Some(token.clone());

		let remaining = token.remaining_time();

		if remaining < self.config.prefetch_window && state.job.is_none() {
			state.job = Some(self.schedule_prefetch(credentials));

			obs::prefetch_scheduled(remaining);
		}

		Ok((token, path))
	}

	/// Produces a replacement for a missing or expired token while the entry lock is held.
	async fn refresh(
		&self,
		credentials: &ClientCredentials,
		state: &mut EntryState,
	) -> Result<(Token, ObtainPath)> {
		if let Some(job) = state.job.as_mut() {
			obs::awaiting_prefetch();

			let awaited = job.wait().await;

			state.job = None;

			match awaited {
				Ok(token) if !token.has_expired() => return Ok((token, ObtainPath::Prefetched)),
				Ok(_) => {},
				Err(e) => {
					obs::prefetch_failed(&e);

					return Err(e);
				},
			}
		}

		let token = self.fetcher.fetch(credentials, FetchMode::Synchronous).await?;

		Ok((token, ObtainPath::Fetched))
	}

	/// Looks up or creates the entry under the global lock; never held across an await.
	fn entry_for(&self, credentials: &ClientCredentials) -> Result<Arc<CacheEntry>> {
		let waited = self.config.lock_timeout;
		let mut entries =
			self.entries
				.try_lock_for(waited.max(Duration::ZERO).unsigned_abs())
				.ok_or(LockError::Global { waited })?;
		let entry = entries
			.entry(credentials.clone())
			.or_insert_with(|| Arc::new(CacheEntry::new(credentials.auth_server().clone())));

		Ok(entry.clone())
	}

	fn schedule_prefetch(&self, credentials: &ClientCredentials) -> PrefetchJob {
		let fetcher = self.fetcher.clone();
		let credentials = credentials.clone();

		self.prefetch.submit(async move { fetcher.fetch(&credentials, FetchMode::Prefetch).await })
	}
}
#[cfg(feature = "reqwest")]
impl TokenCache<ReqwestHttpClient> {
	/// Creates a cache backed by the process-wide [`ReqwestPoolRegistry`].
	///
	/// Caches built with equal [`ConnectionProfile`](crate::http::ConnectionProfile)s share one
	/// pooled reqwest client.
	pub fn new(
		config: TokenCacheConfig,
		credentials: Arc<dyn CredentialsResolver>,
		secrets: Arc<dyn SecretResolver>,
	) -> Result<Self> {
		Self::with_transport(config, credentials, secrets, ReqwestPoolRegistry::shared())
	}
}
impl<C> Debug for TokenCache<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("config", &self.config)
			.field("entries", &self.entry_count())
			.finish_non_exhaustive()
	}
}
