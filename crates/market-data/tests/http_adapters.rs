//! Real adapters against a local HTTP server.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marketlens_market_data::provider::{alpha_vantage, finnhub, twelve_data, yahoo};
use marketlens_market_data::{
    AlphaVantageAdapter, DataCategory, EngineConfig, FailoverOrchestrator, FailureKind,
    FetchRequest, FinnhubAdapter, Field, HttpTransport, Period, ProviderAdapter, ProviderRegistry,
    ProviderSpec, Symbol, TwelveDataAdapter,
};

fn http() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(2))
}

fn spec(
    provider: &'static str,
    category: DataCategory,
    base_url: &str,
    path: &'static str,
    auth: marketlens_market_data::AuthRule,
    priority: u8,
    key: Option<&str>,
) -> ProviderSpec {
    ProviderSpec::new(provider, category, base_url, path, auth, priority)
        .with_api_key(key.map(Arc::from))
}

fn adapter(adapter: impl ProviderAdapter + 'static) -> Arc<dyn ProviderAdapter> {
    Arc::new(adapter)
}

fn finnhub_quote(server: &MockServer, priority: u8, key: Option<&str>) -> (ProviderSpec, Arc<dyn ProviderAdapter>) {
    (
        spec(
            finnhub::PROVIDER_ID,
            DataCategory::LivePrice,
            &server.uri(),
            "/quote",
            finnhub::AUTH,
            priority,
            key,
        ),
        adapter(FinnhubAdapter::new(http())),
    )
}

fn twelve_data_quote(server: &MockServer, priority: u8) -> (ProviderSpec, Arc<dyn ProviderAdapter>) {
    (
        spec(
            twelve_data::PROVIDER_ID,
            DataCategory::LivePrice,
            &server.uri(),
            "/quote",
            twelve_data::AUTH,
            priority,
            Some("td-key"),
        ),
        adapter(TwelveDataAdapter::new(http())),
    )
}

fn alpha_vantage_quote(server: &MockServer, priority: u8) -> (ProviderSpec, Arc<dyn ProviderAdapter>) {
    (
        spec(
            alpha_vantage::PROVIDER_ID,
            DataCategory::LivePrice,
            &server.uri(),
            "/query",
            alpha_vantage::AUTH,
            priority,
            Some("av-key"),
        ),
        adapter(AlphaVantageAdapter::new(http())),
    )
}

fn orchestrator(providers: Vec<(ProviderSpec, Arc<dyn ProviderAdapter>)>) -> FailoverOrchestrator {
    let mut registry = ProviderRegistry::new();
    for (spec, adapter) in providers {
        registry.register(spec, adapter);
    }
    FailoverOrchestrator::new(Arc::new(registry), Duration::from_secs(2))
}

async fn mount_twelve_data_quote(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/quote"))
        .and(query_param("apikey", "td-key"))
        .and(query_param("symbol", "AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "AAPL",
            "close": "184.25",
            "previous_close": "185.64",
            "volume": "58414500"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_http_429_fails_over() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .and(header("X-Finnhub-Token", "fh-key"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"error": "API limit reached."})))
        .expect(1)
        .mount(&server)
        .await;

    let finnhub_server = server;
    let twelve_server = MockServer::start().await;
    mount_twelve_data_quote(&twelve_server).await;

    let orchestrator = orchestrator(vec![
        finnhub_quote(&finnhub_server, 1, Some("fh-key")),
        twelve_data_quote(&twelve_server, 2),
    ]);

    let fetched = orchestrator.fetch("AAPL", DataCategory::LivePrice).await.unwrap();

    assert_eq!(fetched.record.provider, "TWELVE_DATA");
    assert_eq!(fetched.record.number(Field::Price), Some(dec!(184.25)));
    assert_eq!(fetched.record.number(Field::Change), Some(dec!(-1.39)));
    let failures = fetched.diagnostics.failures();
    assert_eq!(failures[0].kind, FailureKind::RateLimited);
}

#[tokio::test]
async fn test_rate_limit_envelope_with_http_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("function", "GLOBAL_QUOTE"))
        .and(query_param("apikey", "av-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute and 500 calls per day."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = orchestrator(vec![alpha_vantage_quote(&server, 1)]);
    let error = orchestrator
        .fetch("AAPL", DataCategory::LivePrice)
        .await
        .unwrap_err();

    assert_eq!(error.aggregate().unwrap().kinds(), vec![FailureKind::RateLimited]);
}

#[tokio::test]
async fn test_unauthorized_and_server_error() {
    let finnhub_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key"})))
        .expect(1)
        .mount(&finnhub_server)
        .await;

    let twelve_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .expect(1)
        .mount(&twelve_server)
        .await;

    let orchestrator = orchestrator(vec![
        finnhub_quote(&finnhub_server, 1, Some("bad-key")),
        twelve_data_quote(&twelve_server, 2),
    ]);
    let error = orchestrator
        .fetch("AAPL", DataCategory::LivePrice)
        .await
        .unwrap_err();

    assert_eq!(
        error.aggregate().unwrap().kinds(),
        vec![FailureKind::InvalidCredential, FailureKind::Transient]
    );
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"c": 1.0})))
        .expect(0)
        .mount(&server)
        .await;

    let orchestrator = orchestrator(vec![finnhub_quote(&server, 1, None)]);
    let error = orchestrator
        .fetch("AAPL", DataCategory::LivePrice)
        .await
        .unwrap_err();

    let aggregate = error.aggregate().unwrap();
    assert_eq!(aggregate.kinds(), vec![FailureKind::MissingCredential]);
    assert!(aggregate.has_missing_credentials());
}

#[tokio::test]
async fn test_error_envelope_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 404,
            "message": "**symbol** not found: ZZZZ. Please specify it correctly according to API Documentation.",
            "status": "error"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = orchestrator(vec![twelve_data_quote(&server, 1)]);
    let error = orchestrator
        .fetch("ZZZZ", DataCategory::LivePrice)
        .await
        .unwrap_err();

    assert_eq!(error.aggregate().unwrap().kinds(), vec![FailureKind::NoData]);
}

#[tokio::test]
async fn test_catalog_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/SHOP.TO"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .and(query_param("symbol", "SHOP:CA"))
        .and(header("X-Finnhub-Token", "fh-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "c": 101.5, "d": 1.5, "dp": 1.5, "h": 102.0, "l": 99.8, "o": 100.1, "pc": 100.0, "t": 1704402000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = EngineConfig::default()
        .with_key(finnhub::PROVIDER_ID, "fh-key")
        .with_timeout(Duration::from_secs(2));
    for provider in [
        yahoo::PROVIDER_ID,
        alpha_vantage::PROVIDER_ID,
        twelve_data::PROVIDER_ID,
        finnhub::PROVIDER_ID,
    ] {
        config = config.with_base_url(provider, server.uri());
    }

    let orchestrator = FailoverOrchestrator::from_config(&config);
    let fetched = orchestrator
        .fetch("SHOP.TO", DataCategory::LivePrice)
        .await
        .unwrap();

    assert_eq!(fetched.record.provider, "FINNHUB");
    assert_eq!(fetched.record.number(Field::Price), Some(dec!(101.5)));
    assert_eq!(
        fetched.diagnostics.summary(),
        "YAHOO: TRANSIENT (HTTP 500) -> ALPHA_VANTAGE: MISSING_CREDENTIAL (no API key configured) -> TWELVE_DATA: MISSING_CREDENTIAL (no API key configured) -> FINNHUB: SUCCESS"
    );
}

#[tokio::test]
async fn test_alpha_vantage_news_sends_lookback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("function", "NEWS_SENTIMENT"))
        .and(query_param("tickers", "AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": "1", "feed": [{
            "title": "Apple beats estimates",
            "url": "https://example.com/a",
            "time_published": "20240105T133000",
            "source": "Reuters",
            "overall_sentiment_score": 0.35
        }]})))
        .expect(1)
        .mount(&server)
        .await;

    let news = spec(
        alpha_vantage::PROVIDER_ID,
        DataCategory::NewsSentiment,
        &server.uri(),
        "/query",
        alpha_vantage::AUTH,
        1,
        Some("av-key"),
    );
    let orchestrator = orchestrator(vec![(news, adapter(AlphaVantageAdapter::new(http())))]);

    let request = FetchRequest::new(Symbol::parse("AAPL").unwrap(), DataCategory::NewsSentiment)
        .with_period(Period::OneMonth);
    let sent_at = Utc::now();
    let fetched = orchestrator.execute(&request).await.unwrap();
    assert_eq!(fetched.record.headlines().len(), 1);

    let requests = server.received_requests().await.unwrap();
    let time_from = requests[0]
        .url
        .query_pairs()
        .find(|(name, _)| name == "time_from")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    let time_from = NaiveDateTime::parse_from_str(&time_from, "%Y%m%dT%H%M")
        .unwrap()
        .and_utc();
    let expected = Period::OneMonth.start(sent_at);
    assert!((time_from - expected).num_minutes().abs() <= 1);
}

#[tokio::test]
async fn test_oversized_body_fails_over() {
    let finnhub_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(4096)))
        .expect(1)
        .mount(&finnhub_server)
        .await;
    let twelve_server = MockServer::start().await;
    mount_twelve_data_quote(&twelve_server).await;

    let (finnhub_spec, _) = finnhub_quote(&finnhub_server, 1, Some("fh-key"));
    let capped = adapter(FinnhubAdapter::new(http().with_max_body_bytes(1024)));
    let orchestrator = orchestrator(vec![
        (finnhub_spec, capped),
        twelve_data_quote(&twelve_server, 2),
    ]);

    let fetched = orchestrator.fetch("AAPL", DataCategory::LivePrice).await.unwrap();

    assert_eq!(fetched.record.provider, "TWELVE_DATA");
    let failures = fetched.diagnostics.failures();
    assert_eq!(failures[0].kind, FailureKind::Transient);
    assert!(failures[0].detail.contains("exceeds 1024 bytes"));
}
