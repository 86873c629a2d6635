//! Demonstrates loading credentials from JSON, obtaining a token through the shared reqwest
//! pool, and reusing it from the cache on the next call.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_token_cache::{
	auth::ClientCredentials,
	cache::TokenCache,
	config::TokenCacheConfig,
	resolver::{DefaultSecretResolver, PatternCredentialsResolver},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"sparkpost-token\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let credentials: Vec<ClientCredentials> = serde_json::from_str(&format!(
		r#"[{{
			"client_id": "xyz",
			"client_secret": "abc",
			"auth_server": "{}",
			"audience_pattern": "https://api\\.sparkpost\\.com/.*"
		}}]"#,
		server.url("/token"),
	))?;
	let config: TokenCacheConfig =
		serde_json::from_str(r#"{"prefetch_window_ms":60000,"lock_timeout_ms":5000}"#)?;
	let cache = TokenCache::new(
		config,
		Arc::new(PatternCredentialsResolver::new(credentials)?),
		Arc::new(DefaultSecretResolver::default()),
	)?;
	let audience = Url::parse("https://api.sparkpost.com/api/v1/transmissions")?;
	let first = cache.obtain_token(&audience).await?;
	let second = cache.obtain_token(&audience).await?;

	println!(
		"{} token valid for {}s; reused from cache: {}.",
		first.token_type(),
		first.expires_in(),
		first == second
	);

	token_mock.assert_async().await;

	Ok(())
}
