//! Audience to credentials resolution.

// crates.io
use regex::Regex;
// self
use crate::{_prelude::*, auth::ClientCredentials, error::ConfigError};

/// Maps an audience to the credentials that authenticate against it.
pub trait CredentialsResolver
where
	Self: Send + Sync,
{
	/// Returns the credentials serving `audience`, or [`Error::CredentialsNotFound`].
	fn resolve(&self, audience: &Url) -> Result<ClientCredentials>;
}

/// Resolver backed by an ordered list of credentials and their audience patterns.
///
/// Every pattern must match the whole serialized audience URL, not a substring. Entries are
/// tried in configured order and the first match wins, so overlapping patterns should be
/// listed most specific first.
///
/// Audiences are matched in their normalized [`Url`] form, which always carries a path: a
/// bare host such as `https://api.example.com` serializes as `https://api.example.com/`, so
/// its pattern must allow the trailing slash (`https://api\.example\.com/?`).
pub struct PatternCredentialsResolver {
	entries: Vec<(Regex, ClientCredentials)>,
}
impl PatternCredentialsResolver {
	/// Compiles every audience pattern up front.
	pub fn new(credentials: impl IntoIterator<Item = ClientCredentials>) -> Result<Self> {
		let entries = credentials
			.into_iter()
			.map(|credentials| -> Result<_> {
				let pattern = credentials.audience_pattern();
				let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
					ConfigError::InvalidAudiencePattern { pattern: pattern.to_owned(), source }
				})?;

				Ok((regex, credentials))
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(Self { entries })
	}

	/// Number of configured credentials.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` when no credentials are configured.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
impl CredentialsResolver for PatternCredentialsResolver {
	fn resolve(&self, audience: &Url) -> Result<ClientCredentials> {
		self.entries
			.iter()
			.find(|(regex, _)| regex.is_match(audience.as_str()))
			.map(|(_, credentials)| credentials.clone())
			.ok_or_else(|| Error::CredentialsNotFound { audience: audience.to_string() })
	}
}
impl Debug for PatternCredentialsResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_list().entries(self.entries.iter().map(|(_, credentials)| credentials)).finish()
	}
}
