//! Client secret resolution, including optional decryption of stored secrets.

// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, TokenSecret},
	error::SecretError,
};

/// Boxed future returned by [`SecretResolver::resolve`].
pub type SecretFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenSecret, SecretError>> + 'a + Send>>;

/// Decrypts a stored client secret given its encryption key.
pub type SecretDecryptor =
	dyn Fn(&TokenSecret, &TokenSecret) -> Result<TokenSecret, SecretError> + Send + Sync;

/// Produces the plaintext client secret presented to the authorization server.
pub trait SecretResolver
where
	Self: Send + Sync,
{
	/// Resolves the secret for `credentials`.
	fn resolve<'a>(&'a self, credentials: &'a ClientCredentials) -> SecretFuture<'a>;
}

/// Returns stored secrets as-is and decrypts the ones carrying an encryption key.
#[derive(Clone, Default)]
pub struct DefaultSecretResolver {
	decryptor: Option<Arc<SecretDecryptor>>,
}
impl DefaultSecretResolver {
	/// Installs the decryptor applied to credentials with a `secret_encryption_key`.
	pub fn with_decryptor<F>(mut self, decryptor: F) -> Self
	where
		F: 'static
			+ Fn(&TokenSecret, &TokenSecret) -> Result<TokenSecret, SecretError>
			+ Send
			+ Sync,
	{
		self.decryptor = Some(Arc::new(decryptor));

		self
	}
}
impl SecretResolver for DefaultSecretResolver {
	fn resolve<'a>(&'a self, credentials: &'a ClientCredentials) -> SecretFuture<'a> {
		Box::pin(async move {
			let Some(key) = credentials.secret_encryption_key() else {
				return Ok(credentials.client_secret().clone());
			};
			let decryptor = self.decryptor.as_ref().ok_or(SecretError::DecryptorMissing)?;

			decryptor(key, credentials.client_secret())
		})
	}
}
impl Debug for DefaultSecretResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DefaultSecretResolver")
			.field("decryptor_set", &self.decryptor.is_some())
			.finish()
	}
}
