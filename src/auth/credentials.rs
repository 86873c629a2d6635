//! Client-credentials records and their cache identity.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Grant type sent when none is configured.
pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";
/// Audience pattern used when none is configured; matches every audience.
pub const MATCH_ALL_AUDIENCES: &str = ".*";

/// One configured relationship with an authorization server.
///
/// Equality and hashing cover exactly the grant type, client id, client secret, and
/// authorization server. The audience pattern and the secret encryption key do not take
/// part, so two records that differ only in those fields share one cache entry.
#[derive(Clone, Deserialize)]
pub struct ClientCredentials {
	#[serde(default = "default_grant_type")]
	grant_type: String,
	client_id: String,
	client_secret: TokenSecret,
	auth_server: Url,
	#[serde(default = "default_audience_pattern")]
	audience_pattern: String,
	#[serde(default)]
	secret_encryption_key: Option<TokenSecret>,
}
impl ClientCredentials {
	/// Returns a builder seeded with the mandatory fields.
	pub fn builder(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		auth_server: Url,
	) -> ClientCredentialsBuilder {
		ClientCredentialsBuilder::new(client_id.into(), client_secret.into(), auth_server)
	}

	/// Grant type posted as `grant_type`.
	pub fn grant_type(&self) -> &str {
		&self.grant_type
	}

	/// Client identifier posted as `client_id`.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Stored client secret, possibly encrypted.
	pub fn client_secret(&self) -> &TokenSecret {
		&self.client_secret
	}

	/// Token endpoint of the authorization server.
	pub fn auth_server(&self) -> &Url {
		&self.auth_server
	}

	/// Regular expression an audience must fully match to select these credentials.
	pub fn audience_pattern(&self) -> &str {
		&self.audience_pattern
	}

	/// Key required to decrypt [`client_secret`](Self::client_secret), if it is encrypted.
	pub fn secret_encryption_key(&self) -> Option<&TokenSecret> {
		self.secret_encryption_key.as_ref()
	}

	/// Stable, secret-free identifier for logs.
	///
	/// Base64 (no padding) SHA-256 digest of the identity fields. Equal credentials always
	/// share a fingerprint.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		for part in [
			self.grant_type.as_str(),
			self.client_id.as_str(),
			self.client_secret.expose(),
			self.auth_server.as_str(),
		] {
			hasher.update((part.len() as u64).to_be_bytes());
			hasher.update(part.as_bytes());
		}

		STANDARD_NO_PAD.encode(hasher.finalize())
	}
}
impl PartialEq for ClientCredentials {
	fn eq(&self, other: &Self) -> bool {
		self.grant_type == other.grant_type
			&& self.client_id == other.client_id
			&& self.client_secret == other.client_secret
			&& self.auth_server == other.auth_server
	}
}
impl Eq for ClientCredentials {}
impl Hash for ClientCredentials {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.grant_type.hash(state);
		self.client_id.hash(state);
		self.client_secret.expose().hash(state);
		self.auth_server.hash(state);
	}
}
impl Debug for ClientCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("grant_type", &self.grant_type)
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("auth_server", &self.auth_server.as_str())
			.field("audience_pattern", &self.audience_pattern)
			.field("secret_encrypted", &self.secret_encryption_key.is_some())
			.finish()
	}
}

/// Builder for [`ClientCredentials`].
#[derive(Clone, Debug)]
pub struct ClientCredentialsBuilder {
	grant_type: String,
	client_id: String,
	client_secret: TokenSecret,
	auth_server: Url,
	audience_pattern: String,
	secret_encryption_key: Option<TokenSecret>,
}
impl ClientCredentialsBuilder {
	fn new(client_id: String, client_secret: String, auth_server: Url) -> Self {
		Self {
			grant_type: default_grant_type(),
			client_id,
			client_secret: TokenSecret::new(client_secret),
			auth_server,
			audience_pattern: default_audience_pattern(),
			secret_encryption_key: None,
		}
	}

	/// Overrides the grant type (defaults to `client_credentials`).
	pub fn grant_type(mut self, grant_type: impl Into<String>) -> Self {
		self.grant_type = grant_type.into();

		self
	}

	/// Sets the audience pattern (defaults to matching every audience).
	pub fn audience_pattern(mut self, pattern: impl Into<String>) -> Self {
		self.audience_pattern = pattern.into();

		self
	}

	/// Marks the client secret as encrypted under `key`.
	pub fn secret_encryption_key(mut self, key: impl Into<String>) -> Self {
		self.secret_encryption_key = Some(TokenSecret::new(key));

		self
	}

	/// Consumes the builder and produces [`ClientCredentials`].
	pub fn build(self) -> ClientCredentials {
		ClientCredentials {
			grant_type: self.grant_type,
			client_id: self.client_id,
			client_secret: self.client_secret,
			auth_server: self.auth_server,
			audience_pattern: self.audience_pattern,
			secret_encryption_key: self.secret_encryption_key,
		}
	}
}

fn default_grant_type() -> String {
	DEFAULT_GRANT_TYPE.into()
}

fn default_audience_pattern() -> String {
	MATCH_ALL_AUDIENCES.into()
}
