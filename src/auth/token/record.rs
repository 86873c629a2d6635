//! Immutable access token values and expiry math.

// crates.io
use time::PrimitiveDateTime;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Safety margin subtracted from the server-advertised lifetime.
pub const EXPIRY_SKEW: Duration = Duration::seconds(10);

/// Access token issued by an authorization server.
///
/// The stored lifetime is the server's `expires_in` minus [`EXPIRY_SKEW`]. The skew is applied
/// unconditionally, so servers advertising ten seconds or less yield a token that is already
/// expired when it is constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
	access_token: TokenSecret,
	token_type: String,
	expires_in: i64,
	created_at: OffsetDateTime,
	expires_at: OffsetDateTime,
}
impl Token {
	/// Builds a token stamped with the current clock.
	///
	/// `server_expires_in` is the raw `expires_in` value returned by the server, in seconds.
	pub fn new(
		access_token: impl Into<String>,
		token_type: impl Into<String>,
		server_expires_in: i64,
	) -> Self {
		Self::issued_at(access_token, token_type, server_expires_in, OffsetDateTime::now_utc())
	}

	/// Builds a token with an explicit creation instant.
	pub fn issued_at(
		access_token: impl Into<String>,
		token_type: impl Into<String>,
		server_expires_in: i64,
		created_at: OffsetDateTime,
	) -> Self {
		let expires_in = server_expires_in.saturating_sub(EXPIRY_SKEW.whole_seconds());
		let expires_at =
			created_at.checked_add(Duration::seconds(expires_in)).unwrap_or_else(|| {
				if expires_in.is_positive() {
					PrimitiveDateTime::MAX.assume_utc()
				} else {
					PrimitiveDateTime::MIN.assume_utc()
				}
			});

		Self {
			access_token: TokenSecret::new(access_token),
			token_type: token_type.into(),
			expires_in,
			created_at,
			expires_at,
		}
	}

	/// Access token secret; callers must avoid logging it.
	pub fn access_token(&self) -> &TokenSecret {
		&self.access_token
	}

	/// Token type reported by the server (usually `Bearer`).
	pub fn token_type(&self) -> &str {
		&self.token_type
	}

	/// Lifetime in seconds after the skew was subtracted.
	pub fn expires_in(&self) -> i64 {
		self.expires_in
	}

	/// Instant the token value was constructed.
	pub fn created_at(&self) -> OffsetDateTime {
		self.created_at
	}

	/// Instant from which the token is considered expired.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn has_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` if the token has expired relative to the current clock.
	pub fn has_expired(&self) -> bool {
		self.has_expired_at(OffsetDateTime::now_utc())
	}

	/// Time left until expiry at the provided instant; negative once expired.
	pub fn remaining_time_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}

	/// Time left until expiry relative to the current clock; negative once expired.
	pub fn remaining_time(&self) -> Duration {
		self.remaining_time_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("created_at", &self.created_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
