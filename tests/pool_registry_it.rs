// std
use std::{
	sync::Arc,
	time::{Duration as StdDuration, Instant},
};
// crates.io
use httpmock::prelude::*;
use oauth2::{AsyncHttpClient, http::Request};
use time::Duration;
// self
use oauth2_token_cache::{
	error::{ConfigError, Error},
	http::{ConnectionProfile, ReqwestPoolRegistry, TlsProtocol, TokenHttpClient, TransportPool},
};

#[test]
fn equal_profiles_share_one_client() {
	let registry = ReqwestPoolRegistry::default();
	let profile = ConnectionProfile::default()
		.with_connect_timeout(Duration::seconds(60))
		.with_socket_timeout(Duration::seconds(40))
		.with_max_connections(20);
	let first = registry.pool(&profile).expect("Default TLS 1.2 profile should build.");
	let second = registry
		.pool(&ConnectionProfile::default())
		.expect("Equal profile should reuse the pooled client.");

	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(registry.len(), 1);
}

#[test]
fn differing_profiles_get_their_own_clients() {
	let registry = ReqwestPoolRegistry::default();
	let base = registry.pool(&ConnectionProfile::default()).expect("Base profile should build.");
	let slower = registry
		.pool(&ConnectionProfile::default().with_socket_timeout(Duration::seconds(90)))
		.expect("Slower profile should build.");
	let tls13 = registry
		.pool(&ConnectionProfile::default().with_tls_protocol(TlsProtocol::Tls1_3))
		.expect("TLS 1.3 profile should build.");

	assert!(!Arc::ptr_eq(&base, &slower));
	assert!(!Arc::ptr_eq(&base, &tls13));
	assert_eq!(registry.len(), 3);
}

#[test]
fn unsupported_tls_versions_fail_to_build() {
	let registry = ReqwestPoolRegistry::default();
	let err = registry
		.pool(&ConnectionProfile::default().with_tls_protocol(TlsProtocol::Tls1_0))
		.expect_err("rustls should refuse to pin TLS 1.0.");

	assert!(matches!(err, Error::Config(ConfigError::HttpClientBuild { .. })));
	assert!(registry.is_empty());
}

#[test]
fn concurrent_lookups_converge_on_one_client() {
	let registry = Arc::new(ReqwestPoolRegistry::default());
	let handles = (0..8)
		.map(|_| {
			let registry = registry.clone();

			std::thread::spawn(move || {
				registry.pool(&ConnectionProfile::default()).expect("Default profile should build.")
			})
		})
		.collect::<Vec<_>>();
	let clients = handles
		.into_iter()
		.map(|handle| handle.join().expect("Lookup thread should not panic."))
		.collect::<Vec<_>>();

	assert!(clients.iter().all(|client| Arc::ptr_eq(client, &clients[0])));
	assert_eq!(registry.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn connection_limit_caps_requests_in_flight() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/slow");
			then.status(200).delay(StdDuration::from_millis(200));
		})
		.await;
	let registry = ReqwestPoolRegistry::default();
	let client = registry
		.pool(&ConnectionProfile::default().with_max_connections(1))
		.expect("Single-connection profile should build.");
	let started = Instant::now();
	let calls = (0..2)
		.map(|_| {
			let handle = client.handle();
			let url = server.url("/slow");

			tokio::spawn(async move {
				let request =
					Request::builder().uri(url).body(Vec::new()).expect("Request should build.");

				handle.call(request).await.map(|response| response.status().as_u16())
			})
		})
		.collect::<Vec<_>>();

	for call in calls {
		let status = call
			.await
			.expect("Request task should not panic.")
			.expect("Mock server should answer.");

		assert_eq!(status, 200);
	}

	assert!(started.elapsed() >= StdDuration::from_millis(400));
	assert_eq!(client.available_connections(), Some(1));

	mock.assert_calls_async(2).await;
}
