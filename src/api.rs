use crate::AppState;
use crate::data_structures::{SharedRequestLimits, SharedSummaryService};
use axum::{
    Router,
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::Query as MultiQuery;
use equitywatch::{clamp_window, models::normalize_symbol};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub symbol: Option<String>,
    pub days: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    #[serde(default)]
    pub symbols: Vec<String>,
    pub days: Option<String>,
}

/// Stock summary endpoints, without state or rate limiting applied.
pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stocks", get(get_stock_summary_handler))
        .route("/api/stocks/batch", get(get_stock_batch_handler))
        .route("/api/stocks/symbols", get(get_symbols_handler))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Leading integer of `raw`, the way a browser query string is usually read
/// ("30", " 30", "30d" -> 30). Anything without leading digits is `None`.
pub fn parse_days(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    // Overlong digit runs saturate rather than fail; the window clamp caps them anyway.
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * value)
}

#[instrument(skip(service, limits))]
pub async fn get_stock_summary_handler(
    State(service): State<SharedSummaryService>,
    State(limits): State<SharedRequestLimits>,
    Query(query): Query<StockQuery>,
) -> Response {
    let symbol = query
        .symbol
        .as_deref()
        // Only an absent or empty symbol means the default; whitespace is checked against the catalog.
        .filter(|s| !s.is_empty())
        .map(normalize_symbol)
        .unwrap_or_else(|| limits.default_symbol.clone());
    let days = clamp_window(parse_days(query.days.as_deref()), limits.default_days, limits.max_days);
    debug!(symbol, days, "Received stock summary request");

    if !service.catalog().contains(&symbol) {
        warn!(symbol, "Rejected unsupported symbol");
        return error_response(StatusCode::BAD_REQUEST, "unsupported symbol");
    }

    match service.load_summary(&symbol, days).await {
        Ok(summary) => {
            info!(symbol, days, points = summary.series.len(), "Returning stock summary");
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(e) => {
            error!(symbol, days, error = %e, retryable = e.retryable(), "Failed to load stock summary");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to load stock data")
        }
    }
}

#[instrument(skip(service, limits))]
pub async fn get_stock_batch_handler(
    State(service): State<SharedSummaryService>,
    State(limits): State<SharedRequestLimits>,
    MultiQuery(query): MultiQuery<BatchQuery>,
) -> Response {
    let mut symbols: Vec<String> = query
        .symbols
        .iter()
        .flat_map(|value| value.split(','))
        .filter(|s| !s.trim().is_empty())
        .map(normalize_symbol)
        .collect();
    if symbols.is_empty() {
        symbols = service.catalog().symbols();
    }
    let days = clamp_window(parse_days(query.days.as_deref()), limits.default_days, limits.max_days);
    debug!(symbols = ?symbols, days, "Received stock batch request");

    if let Some(unsupported) = symbols.iter().find(|s| !service.catalog().contains(s)) {
        warn!(symbol = %unsupported, "Rejected batch with unsupported symbol");
        return error_response(StatusCode::BAD_REQUEST, "unsupported symbol");
    }

    match service.load_many_summaries(&symbols, days).await {
        Ok(summaries) => {
            info!(symbol_count = summaries.len(), days, "Returning stock batch");
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(e) => {
            error!(days, error = %e, retryable = e.retryable(), "Failed to load stock batch");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to load stock data")
        }
    }
}

#[instrument(skip(service))]
pub async fn get_symbols_handler(State(service): State<SharedSummaryService>) -> impl IntoResponse {
    let symbols = service.catalog().symbols();
    debug!(symbol_count = symbols.len(), "Returning symbol catalog");
    (StatusCode::OK, Json(symbols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::RequestLimits;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use equitywatch::{
        models::SymbolCatalog,
        services::{InMemorySource, StockSummaryService},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn csv(rows: usize) -> String {
        let mut content = String::from("Data,Otwarcie,Najwyzszy,Najnizszy,Zamkniecie,Wolumen\n");
        for i in 0..rows {
            let close = 100.0 + i as f64;
            content.push_str(&format!("2024-03-{:02},{c},{c},{c},{c},500\n", i + 1, c = close));
        }
        content
    }

    fn app() -> Router {
        let source = InMemorySource::new()
            .with_document("aapl.csv", csv(10))
            .with_document("msft.csv", csv(3))
            .with_document("goog.csv", csv(1));
        // spy.csv is missing on purpose.
        let service = Arc::new(StockSummaryService::new(SymbolCatalog::default(), Arc::new(source)));
        let state = AppState::new(service, Arc::new(RequestLimits::default()));
        stock_routes().with_state(state)
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days(Some("30")), Some(30));
        assert_eq!(parse_days(Some(" 45 ")), Some(45));
        assert_eq!(parse_days(Some("30d")), Some(30));
        assert_eq!(parse_days(Some("-7")), Some(-7));
        assert_eq!(parse_days(Some("+12")), Some(12));
        assert_eq!(parse_days(Some("abc")), None);
        assert_eq!(parse_days(Some("")), None);
        assert_eq!(parse_days(None), None);
        assert_eq!(parse_days(Some("99999999999999999999999")), Some(i64::MAX));
    }

    #[tokio::test]
    async fn test_summary_defaults_to_aapl() {
        let (status, body) = get("/api/stocks").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["latestClose"], 109.0);
        assert_eq!(body["series"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_summary_lowercase_symbol_and_days() {
        let (status, body) = get("/api/stocks?symbol=msft&days=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "MSFT");
        assert_eq!(body["series"].as_array().unwrap().len(), 2);
        assert_eq!(body["latestClose"], 102.0);
    }

    #[tokio::test]
    async fn test_summary_invalid_days_falls_back() {
        for uri in ["/api/stocks?days=0", "/api/stocks?days=-3", "/api/stocks?days=soon"] {
            let (status, body) = get(uri).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body["series"].as_array().unwrap().len(), 10, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_summary_days_clamped() {
        let (status, body) = get("/api/stocks?symbol=AAPL&days=5000").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["series"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_summary_unsupported_symbol() {
        let (status, body) = get("/api/stocks?symbol=TSLA&days=30").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unsupported symbol");
    }

    #[tokio::test]
    async fn test_summary_blank_symbol_is_unsupported() {
        let (status, body) = get("/api/stocks?symbol=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unsupported symbol");

        // An empty value still falls back to the default symbol.
        let (status, body) = get("/api/stocks?symbol=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
    }

    #[tokio::test]
    async fn test_summary_missing_source_is_server_error() {
        let (status, body) = get("/api/stocks?symbol=SPY").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "failed to load stock data");
    }

    #[tokio::test]
    async fn test_batch_repeated_and_comma_separated() {
        let (status, body) = get("/api/stocks/batch?symbols=aapl&symbols=msft,goog&days=30").await;
        assert_eq!(status, StatusCode::OK);
        let map = body.as_object().unwrap();
        let mut keys: Vec<_> = map.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["AAPL", "GOOG", "MSFT"]);
        assert_eq!(body["GOOG"]["changePct"], 0.0);
    }

    #[tokio::test]
    async fn test_batch_fails_when_any_source_missing() {
        // Without symbols the whole catalog is requested, including SPY.
        let (status, body) = get("/api/stocks/batch?days=30").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "failed to load stock data");
    }

    #[tokio::test]
    async fn test_batch_rejects_unsupported_symbol() {
        let (status, _) = get("/api/stocks/batch?symbols=AAPL,TSLA").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_symbols_endpoint() {
        let (status, body) = get("/api/stocks/symbols").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["AAPL", "GOOG", "MSFT", "SPY"]));
    }
}
