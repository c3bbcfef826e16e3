use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Value, json};
use tracing::warn;

use mockrest_base::{ErrorKind, HttpResponse, HttpStatusCode, MockApiError, MockApiResult};

use crate::config::BackendConfig;

/// Status text used for codes missing from the reason phrase table.
pub const UNKNOWN_STATUS: &str = "Unknown Status";
/// Status text of the fallback response when a status cannot be described at all.
pub const INVALID_SERVER_OPERATION: &str = "Invalid Server Operation";

/// A JSON response whose body is `{"data": data}`.
pub fn data_response(status: HttpStatusCode, data: Value) -> HttpResponse {
    HttpResponse::json(json!({ "data": data })).with_status(status)
}

/// A JSON response whose body is `{"error": message}`.
pub fn error_response(status: HttpStatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::json(json!({ "error": message.into() })).with_status(status)
}

/// Human-readable text for a status code.
pub fn status_text(status: HttpStatusCode) -> MockApiResult<&'static str> {
    if !(100..=999).contains(&status.as_u16()) {
        return Err(Box::new(MockApiError::new(ErrorKind::BadConfiguration {
            message: format!("'{}' is not an HTTP status code", status),
        })));
    }
    Ok(status.reason_phrase().unwrap_or(UNKNOWN_STATUS))
}

/// Attach the status text and merge the configured default response options.
pub fn finalize(response: HttpResponse, config: &BackendConfig) -> HttpResponse {
    let mut response = match status_text(response.status()) {
        Ok(text) => response.with_status_text(text),
        Err(e) => {
            warn!("replacing undeliverable response: {}", e);
            HttpResponse::internal_error().with_status_text(INVALID_SERVER_OPERATION)
        }
    };
    for (name, value) in &config.default_response_options.headers {
        if !response.headers().contains(name) {
            response.headers_mut().insert(name.clone(), value.clone());
        }
    }
    response
}

/// Deliver a computed response after the simulated latency.
///
/// The response already exists; dropping the future only cancels its delivery.
pub fn deliver(response: HttpResponse, delay_ms: u64) -> BoxFuture<'static, HttpResponse> {
    async move {
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        response
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockrest_base::HttpBody;

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(HttpStatusCode::NOT_FOUND).unwrap(), "Not Found");
        assert_eq!(status_text(HttpStatusCode::from(299)).unwrap(), UNKNOWN_STATUS);
        assert!(status_text(HttpStatusCode::from(42)).is_err());
    }

    #[test]
    fn test_finalize_sets_status_text() {
        let response = finalize(HttpResponse::no_content(), &BackendConfig::default());
        assert_eq!(response.status(), HttpStatusCode::NO_CONTENT);
        assert_eq!(response.status_text(), "No Content");
    }

    #[test]
    fn test_finalize_replaces_impossible_status() {
        let response = finalize(
            data_response(HttpStatusCode::from(7), json!([])),
            &BackendConfig::default(),
        );
        assert_eq!(response.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.status_text(), INVALID_SERVER_OPERATION);
        assert_eq!(response.body(), &HttpBody::Empty);
    }

    #[test]
    fn test_finalize_merges_default_headers() {
        let mut config = BackendConfig::default();
        let headers = &mut config.default_response_options.headers;
        headers.insert("X-Powered-By".to_string(), "mockrest".to_string());
        headers.insert("Content-Type".to_string(), "text/plain".to_string());

        let response = finalize(error_response(HttpStatusCode::NOT_FOUND, "gone"), &config);
        assert_eq!(response.headers().get("x-powered-by").map(String::as_str), Some("mockrest"));
        assert_eq!(
            response.headers().get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(response.body(), &HttpBody::Json(json!({"error": "gone"})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_waits_for_delay() {
        let started = tokio::time::Instant::now();
        let response = deliver(HttpResponse::ok(), 250).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
