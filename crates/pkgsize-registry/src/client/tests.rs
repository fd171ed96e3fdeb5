//! Unit tests for registry client

use super::*;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        multiplier: 2.0,
    }
}

fn client_for(server: &MockServer) -> RegistryClient {
    RegistryClient::with_options(ClientOptions {
        base_url: server.uri(),
        retry: fast_retry(),
        ..ClientOptions::default()
    })
    .unwrap()
}

fn app_document() -> serde_json::Value {
    serde_json::json!({
        "name": "app",
        "dist-tags": { "latest": "1.0.0" },
        "versions": {
            "1.0.0": {
                "dependencies": { "lib": "^4.0.0" },
                "dist": { "unpackedSize": 2048 }
            }
        }
    })
}

#[tokio::test]
async fn test_registry_client_creation() {
    let client = RegistryClient::new().unwrap();
    assert_eq!(client.base_url(), "https://registry.npmjs.org");
    assert_eq!(client.retry_config.max_retries, 3);
}

#[tokio::test]
async fn test_registry_client_with_auth() {
    let auth = AuthConfig {
        token: Some("test-token".to_string()),
        username: None,
        password: None,
    };

    let client = RegistryClient::with_auth(auth).unwrap();
    assert_eq!(client.base_url(), "https://registry.npmjs.org");
}

#[test]
fn test_auth_header_values() {
    let bearer = AuthConfig {
        token: Some("abc".to_string()),
        ..AuthConfig::default()
    };
    assert_eq!(bearer.header_value().as_deref(), Some("Bearer abc"));

    let basic = AuthConfig {
        token: None,
        username: Some("user".to_string()),
        password: Some("pass".to_string()),
    };
    assert_eq!(basic.header_value().as_deref(), Some("Basic dXNlcjpwYXNz"));

    assert_eq!(AuthConfig::default().header_value(), None);
}

#[test]
fn test_base_url_validation() {
    let options = |url: &str| ClientOptions {
        base_url: url.to_string(),
        ..ClientOptions::default()
    };

    let client = RegistryClient::with_options(options("https://npm.example.com/")).unwrap();
    assert_eq!(client.base_url(), "https://npm.example.com");

    assert!(RegistryClient::with_options(options("not-a-url")).is_err());
    assert!(RegistryClient::with_options(options("ftp://npm.example.com")).is_err());
}

#[tokio::test]
async fn test_encode_package_name() {
    let client = RegistryClient::new().unwrap();

    // Regular package
    assert_eq!(client.encode_package_name("lodash"), "lodash");

    // Scoped package
    assert_eq!(client.encode_package_name("@types/node"), "@types%2fnode");
}

#[test]
fn test_retry_config_default() {
    let config = RetryConfig::default();
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.initial_delay, Duration::from_millis(100));
    assert_eq!(config.max_delay, Duration::from_secs(10));
    assert_eq!(config.multiplier, 2.0);
}

#[test]
fn test_retry_delay_is_capped() {
    let config = RetryConfig::default();
    assert_eq!(config.next_delay(Duration::from_millis(100)), Duration::from_millis(200));
    assert_eq!(config.next_delay(Duration::from_secs(8)), Duration::from_secs(10));
}

#[tokio::test]
async fn test_fetch_package_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/app"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(app_document()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let record = client.fetch_package("app").await.unwrap();

    assert_eq!(record.name, "app");
    assert_eq!(record.version, "1.0.0");
    assert_eq!(record.installed_size, 2048);
    assert!(record.dependencies.contains("lib"));
}

#[tokio::test]
async fn test_fetch_package_not_found_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nonexistent-package"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({ "error": "Not found" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.fetch_package("nonexistent-package").await;

    match result.unwrap_err() {
        PkgSizeError::PackageNotFound { name } => {
            assert_eq!(name, "nonexistent-package");
        }
        other => panic!("Expected PackageNotFound error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_package_not_found_marker_in_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "Not found" })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.fetch_package("hidden").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_malformed_body_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    match client.fetch_package("broken").await.unwrap_err() {
        PkgSizeError::MalformedResponse { package, .. } => assert_eq!(package, "broken"),
        other => panic!("Expected MalformedResponse error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "flaky",
            "dist-tags": { "latest": "0.1.0" },
            "versions": { "0.1.0": { "dist": { "unpackedSize": 7 } } }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let record = client.fetch_package("flaky").await.unwrap();
    assert_eq!(record.installed_size, 7);
}

#[tokio::test]
async fn test_retries_give_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.fetch_package("down").await.unwrap_err();
    assert!(matches!(err, PkgSizeError::RegistryStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.fetch_package("private").await.unwrap_err();

    assert!(matches!(err, PkgSizeError::RegistryStatus { status: 401, .. }));
    assert!(!err.is_recoverable());
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.fetch_package("busy").await.unwrap_err();

    assert!(matches!(err, PkgSizeError::RegistryStatus { status: 429, .. }));
}

#[tokio::test]
async fn test_scoped_package_url_encoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@types%2fnode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "@types/node",
            "dist-tags": { "latest": "1.0.0" },
            "versions": {}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let record = client.fetch_package("@types/node").await.unwrap();
    assert_eq!(record.name, "@types/node");
    assert_eq!(record.installed_size, 0);
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/app"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(app_document()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RegistryClient::with_options(ClientOptions {
        base_url: mock_server.uri(),
        auth: Some(AuthConfig {
            token: Some("secret".to_string()),
            ..AuthConfig::default()
        }),
        retry: RetryConfig::disabled(),
        ..ClientOptions::default()
    })
    .unwrap();

    assert!(client.fetch_package("app").await.is_ok());
}

#[tokio::test]
async fn test_cache_skips_second_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(app_document()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cache = Arc::new(MetadataCache::new());
    let client = RegistryClient::with_options(ClientOptions {
        base_url: mock_server.uri(),
        cache: Some(cache.clone()),
        ..ClientOptions::default()
    })
    .unwrap();

    let first = client.fetch_package("app").await.unwrap();
    let second = client.fetch_package("app").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.stats().total_entries, 1);
}
