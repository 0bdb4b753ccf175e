use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use stock_watcher::config::FetcherConfig;
use stock_watcher::error::FetchError;
use stock_watcher::fetcher::{HttpQuoteFetcher, QuoteSource};
use tokio::net::TcpListener;

async fn quote(Path(symbol): Path<String>) -> Response {
    let price = match symbol.as_str() {
        "AAPL" => "187.339996",
        "NA" => "N/A",
        "GONE" => return StatusCode::NOT_FOUND.into_response(),
        "GARBLED" => return "<html>not json</html>".into_response(),
        "EMPTY" => return Json(json!({ "list": { "resources": [] } })).into_response(),
        "SLOW" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "1.00"
        }
        _ => "10.00",
    };

    Json(json!({
        "list": {
            "meta": { "type": "resource-list", "start": 0, "count": 1 },
            "resources": [{
                "resource": {
                    "classname": "Quote",
                    "fields": { "name": symbol, "price": price, "symbol": symbol }
                }
            }]
        }
    }))
    .into_response()
}

async fn start_quote_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind quote server");
    let addr = listener.local_addr().expect("local addr");
    let app = Router::new().route("/v1/symbols/:symbol/quote", get(quote));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn fetcher_for(addr: SocketAddr, timeout: Duration) -> HttpQuoteFetcher {
    HttpQuoteFetcher::new(FetcherConfig {
        endpoint_template: format!("http://{addr}/v1/symbols/{{symbol}}/quote?format=json"),
        timeout,
    })
    .expect("build fetcher")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetch_returns_truncated_price_and_echo() {
    let addr = start_quote_server().await;
    let fetcher = fetcher_for(addr, Duration::from_secs(2));

    let quote = fetcher.fetch("AAPL").await.expect("quote");
    assert_eq!(quote.price, 187.33);
    assert_eq!(quote.symbol.as_deref(), Some("AAPL"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unusable_responses_are_fetch_errors() {
    let addr = start_quote_server().await;
    let fetcher = fetcher_for(addr, Duration::from_secs(2));

    assert_eq!(
        fetcher.fetch("NA").await,
        Err(FetchError::MalformedPrice("N/A".into()))
    );
    assert_eq!(fetcher.fetch("GONE").await, Err(FetchError::Status(404)));
    assert_eq!(fetcher.fetch("EMPTY").await, Err(FetchError::EmptyPayload));
    assert!(matches!(
        fetcher.fetch("GARBLED").await,
        Err(FetchError::Decode(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_source_times_out() {
    let addr = start_quote_server().await;
    let fetcher = fetcher_for(addr, Duration::from_millis(200));

    let started = std::time::Instant::now();
    let result = fetcher.fetch("SLOW").await;
    assert_eq!(result, Err(FetchError::Timeout(Duration::from_millis(200))));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn unreachable_source_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let fetcher = fetcher_for(addr, Duration::from_secs(2));
    assert!(matches!(
        fetcher.fetch("AAPL").await,
        Err(FetchError::Transport(_))
    ));
}
