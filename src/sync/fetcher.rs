//! Floor-price fetcher for the upstream collection API
//!
//! One fetch is one GET against the collection-detail endpoint, authenticated
//! with an API key header, returning the numeric floor price nested in the
//! response body. The fetcher never retries; a failed collection waits for
//! the next scheduled pass.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::FetchError;

/// JSON pointer to the floor price within the collection-detail response
const FLOOR_PRICE_POINTER: &str = "/collection/stats/floor_price";

/// Source of floor prices for collection slugs
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    /// Fetch the current floor price for one collection
    async fn fetch_floor_price(&self, slug: &str) -> Result<f64, FetchError>;
}

/// Fetcher backed by the OpenSea collection API
pub struct OpenSeaFetcher {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenSeaFetcher {
    /// Create a fetcher with the given API configuration and request timeout
    pub fn new(config: &ApiConfig, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Build the collection-detail URL for a slug
    fn collection_url(&self, slug: &str) -> String {
        format!("{}/api/v1/collection/{}", self.base_url, slug)
    }
}

#[async_trait]
impl PriceFetcher for OpenSeaFetcher {
    async fn fetch_floor_price(&self, slug: &str) -> Result<f64, FetchError> {
        let url = self.collection_url(slug);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        debug!(slug = slug, url = %url, "Fetching floor price");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else if e.is_connect() {
                FetchError::ConnectionRefused
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(slug = slug, status = status.as_u16(), "Unexpected status");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| FetchError::InvalidBody(e.to_string()))?;

        value
            .pointer(FLOOR_PRICE_POINTER)
            .and_then(serde_json::Value::as_f64)
            .filter(|price| price.is_finite() && *price >= 0.0)
            .ok_or(FetchError::MissingFloorPrice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher(base_url: &str) -> OpenSeaFetcher {
        OpenSeaFetcher::new(
            &ApiConfig {
                base_url: base_url.to_string(),
                api_key: Some("test-key".to_string()),
            },
            Duration::from_secs(5),
        )
    }

    fn collection_body(floor_price: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "collection": {
                "stats": {
                    "floor_price": floor_price,
                    "total_volume": 1234.5
                }
            }
        })
    }

    // Test 1: Successful fetch returns the floor price
    #[tokio::test]
    async fn test_fetch_returns_floor_price() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/pixels-farm"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(collection_body(serde_json::json!(1.5))),
            )
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let price = fetcher.fetch_floor_price("pixels-farm").await.unwrap();

        assert!((price - 1.5).abs() < f64::EPSILON);
    }

    // Test 2: The API key is sent as a header
    #[tokio::test]
    async fn test_api_key_header_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/nucyber"))
            .and(header("X-API-KEY", "test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(collection_body(serde_json::json!(0.25))),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let result = fetcher.fetch_floor_price("nucyber").await;

        assert!(result.is_ok());
    }

    // Test 3: Non-success status maps to an http-status failure
    #[tokio::test]
    async fn test_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let result = fetcher.fetch_floor_price("missing").await;

        assert_eq!(result.unwrap_err(), FetchError::Status(404));
    }

    // Test 4: Server errors map to an http-status failure too
    #[tokio::test]
    async fn test_server_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let result = fetcher.fetch_floor_price("flaky").await;

        assert_eq!(result.unwrap_err(), FetchError::Status(503));
    }

    // Test 5: Missing floor price field is a parse failure
    #[tokio::test]
    async fn test_missing_floor_price_field() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/sparse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"collection": {"stats": {}}})),
            )
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let result = fetcher.fetch_floor_price("sparse").await;

        assert_eq!(result.unwrap_err(), FetchError::MissingFloorPrice);
    }

    // Test 6: Null floor price is a parse failure
    #[tokio::test]
    async fn test_null_floor_price() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/unlisted"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(collection_body(serde_json::Value::Null)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let result = fetcher.fetch_floor_price("unlisted").await;

        assert_eq!(result.unwrap_err(), FetchError::MissingFloorPrice);
    }

    // Test 7: Non-numeric floor price is a parse failure
    #[tokio::test]
    async fn test_non_numeric_floor_price() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/stringly"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(collection_body(serde_json::json!("1.5 ETH"))),
            )
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let result = fetcher.fetch_floor_price("stringly").await;

        assert_eq!(result.unwrap_err(), FetchError::MissingFloorPrice);
    }

    // Test 8: Negative floor price is rejected
    #[tokio::test]
    async fn test_negative_floor_price_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/negative"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(collection_body(serde_json::json!(-1.0))),
            )
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let result = fetcher.fetch_floor_price("negative").await;

        assert_eq!(result.unwrap_err(), FetchError::MissingFloorPrice);
    }

    // Test 9: A body that is not JSON is a parse failure
    #[tokio::test]
    async fn test_invalid_json_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let result = fetcher.fetch_floor_price("garbled").await;

        assert!(matches!(result.unwrap_err(), FetchError::InvalidBody(_)));
    }

    // Test 10: Timeout maps to a network failure
    #[tokio::test]
    async fn test_timeout_is_network_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(collection_body(serde_json::json!(1.0)))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = OpenSeaFetcher::new(
            &ApiConfig {
                base_url: mock_server.uri(),
                api_key: None,
            },
            Duration::from_millis(100),
        );

        let result = fetcher.fetch_floor_price("slow").await;
        let err = result.unwrap_err();

        assert_eq!(err, FetchError::Timeout);
        assert_eq!(err.cause(), crate::error::FetchCause::Network);
    }

    // Test 11: Integer floor prices parse as floats
    #[tokio::test]
    async fn test_integer_floor_price() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/round"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(collection_body(serde_json::json!(3))),
            )
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let price = fetcher.fetch_floor_price("round").await.unwrap();

        assert!((price - 3.0).abs() < f64::EPSILON);
    }

    // Test 12: Base URL trailing slash is tolerated
    #[tokio::test]
    async fn test_base_url_trailing_slash() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/tidy"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(collection_body(serde_json::json!(0.5))),
            )
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&format!("{}/", mock_server.uri()));
        let result = fetcher.fetch_floor_price("tidy").await;

        assert!(result.is_ok());
    }

    // Test 13: A zero floor price is valid
    #[tokio::test]
    async fn test_zero_floor_price_valid() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collection/free"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(collection_body(serde_json::json!(0.0))),
            )
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(&mock_server.uri());
        let price = fetcher.fetch_floor_price("free").await.unwrap();

        assert_eq!(price, 0.0);
    }
}
