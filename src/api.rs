// 🌐 Resilient API Client
// Wraps every backend call with per-attempt timeout, bounded exponential
// backoff, and a typed error taxonomy so callers never see raw transport
// failures.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;

/// Health probes use a short timeout and a single retry
const HEALTH_TIMEOUT_MS: u64 = 5_000;
const HEALTH_RETRIES: u32 = 1;

// ============================================================================
// ERROR TAXONOMY
// ============================================================================

/// Normalized API failure
///
/// `status` encodes the taxonomy:
/// - `0`    transport/network failure (no response received)
/// - `408`  attempt exceeded its timeout
/// - `4xx`  client error, terminal (never retried)
/// - `5xx`  server error, retryable
#[derive(Debug, Clone, thiserror::Error)]
#[error("api error (status {status}): {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub code: Option<String>,
    pub details: Option<Value>,
}

impl ApiError {
    /// Transport-level failure: the request never produced a response
    pub fn network(message: impl Into<String>) -> Self {
        ApiError {
            status: 0,
            message: message.into(),
            code: Some("network_error".to_string()),
            details: None,
        }
    }

    /// The attempt exceeded its time budget
    pub fn timeout() -> Self {
        ApiError {
            status: 408,
            message: "request timed out".to_string(),
            code: Some("timeout".to_string()),
            details: None,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::timeout()
        } else {
            ApiError::network(err.to_string())
        }
    }

    /// Build from a non-success HTTP response, salvaging structured fields
    /// (`message`/`detail`/`error`, `code`) when the body is JSON
    fn from_response(status: u16, raw_body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(raw_body).ok();

        let message = parsed
            .as_ref()
            .and_then(|body| {
                body.get("message")
                    .or_else(|| body.get("detail"))
                    .or_else(|| body.get("error"))
            })
            .and_then(|field| field.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", status));

        let code = parsed
            .as_ref()
            .and_then(|body| body.get("code"))
            .and_then(|field| field.as_str())
            .map(str::to_string);

        ApiError {
            status,
            message,
            code,
            details: parsed,
        }
    }

    /// Transport failures and server errors are worth retrying; every 4xx
    /// (401, 403, 404, 422, 429 included) is terminal
    pub fn is_retryable(&self) -> bool {
        self.status == 0 || self.status >= 500
    }

    /// Pure status → user-facing message lookup
    pub fn user_message(&self) -> &'static str {
        match self.status {
            0 => "Unable to reach the server. Check your connection and try again.",
            408 => "The request took too long. Please try again.",
            401 | 403 => "You are not authorized to perform this action.",
            404 => "The requested resource was not found.",
            422 => "Some of the submitted information is invalid. Please review and resubmit.",
            429 => "Too many requests. Please wait a moment before trying again.",
            400..=499 => "The request could not be processed. Please review and try again.",
            _ => "Something went wrong on our end. Please try again shortly.",
        }
    }
}

// ============================================================================
// REQUEST OPTIONS / RESPONSE BODY
// ============================================================================

/// Per-request knobs; defaults match the documented client contract
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,

    /// Budget for a single attempt
    pub timeout: Duration,

    /// Retries after the first attempt (total attempts = retries + 1)
    pub retries: u32,

    /// Base backoff delay; attempt `n` waits `retry_delay * 2^n`
    pub retry_delay: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            method: Method::GET,
            body: None,
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
            retries: crate::config::DEFAULT_RETRIES,
            retry_delay: Duration::from_millis(crate::config::DEFAULT_RETRY_DELAY_MS),
        }
    }
}

/// Parsed response payload: JSON when the content type says so, raw text otherwise
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text,
        }
    }
}

/// File payload for multipart uploads (bill photos, denial letters)
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

// ============================================================================
// CLIENT
// ============================================================================

/// HTTP client bound to a single backend origin
///
/// Stateless apart from the base URL and default options; every call gets
/// uniform timeout, retry, and error normalization.
pub struct ApiClient {
    http: Client,
    base_url: String,
    defaults: RequestOptions,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiClient {
            http: Client::new(),
            base_url: base_url.into(),
            defaults: RequestOptions::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        ApiClient {
            http: Client::new(),
            base_url: config.api_base_url.clone(),
            defaults: RequestOptions {
                timeout: config.request_timeout,
                retries: config.max_retries,
                retry_delay: config.retry_delay,
                ..RequestOptions::default()
            },
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a request with retry/backoff per the options
    ///
    /// Attempts are strictly sequential. Only transport failures and 5xx
    /// responses are retried; the last error propagates once `retries`
    /// retries are exhausted.
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ResponseBody, ApiError> {
        let mut attempt: u32 = 0;

        loop {
            match self.attempt(path, &options).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_retryable() && attempt < options.retries => {
                    let delay = options.retry_delay * 2u32.saturating_pow(attempt);
                    debug!(
                        status = err.status,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        path,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(status = err.status, path, "request failed");
                    return Err(err);
                }
            }
        }
    }

    /// One bounded attempt; the timeout drops the in-flight request
    async fn attempt(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<ResponseBody, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let send = async {
            let mut request = self.http.request(options.method.clone(), &url);
            if let Some(body) = &options.body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(ApiError::from_reqwest)?;
            Self::read_response(response).await
        };

        match tokio::time::timeout(options.timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::timeout()),
        }
    }

    async fn read_response(response: reqwest::Response) -> Result<ResponseBody, ApiError> {
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false);

        let raw = response.text().await.map_err(ApiError::from_reqwest)?;

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &raw));
        }

        if is_json {
            match serde_json::from_str(&raw) {
                Ok(value) => Ok(ResponseBody::Json(value)),
                Err(_) => Ok(ResponseBody::Text(raw)),
            }
        } else {
            Ok(ResponseBody::Text(raw))
        }
    }

    // ========================================================================
    // CONVENIENCE VERBS
    // ========================================================================

    pub async fn get(&self, path: &str) -> Result<ResponseBody, ApiError> {
        self.request(path, self.verb_options(Method::GET, None)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<ResponseBody, ApiError> {
        self.request(path, self.verb_options(Method::POST, Some(body)))
            .await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<ResponseBody, ApiError> {
        self.request(path, self.verb_options(Method::PUT, Some(body)))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<ResponseBody, ApiError> {
        self.request(path, self.verb_options(Method::DELETE, None))
            .await
    }

    fn verb_options(&self, method: Method, body: Option<Value>) -> RequestOptions {
        RequestOptions {
            method,
            body,
            ..self.defaults.clone()
        }
    }

    /// Multipart upload: a `file` part plus flattened extra fields
    /// (non-string values are JSON-encoded). The content type is left to
    /// the HTTP layer so the multipart boundary is computed correctly.
    pub async fn upload(
        &self,
        path: &str,
        file: FileUpload,
        extra_fields: Vec<(String, Value)>,
    ) -> Result<ResponseBody, ApiError> {
        let options = self.defaults.clone();
        let mut attempt: u32 = 0;

        loop {
            match self.attempt_upload(path, &file, &extra_fields, &options).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_retryable() && attempt < options.retries => {
                    let delay = options.retry_delay * 2u32.saturating_pow(attempt);
                    debug!(
                        status = err.status,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        path,
                        "upload failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(status = err.status, path, "upload failed");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt_upload(
        &self,
        path: &str,
        file: &FileUpload,
        extra_fields: &[(String, Value)],
        options: &RequestOptions,
    ) -> Result<ResponseBody, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let send = async {
            // The form is rebuilt per attempt; it is consumed by send()
            let mut part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone());
            if let Some(content_type) = &file.content_type {
                part = part
                    .mime_str(content_type)
                    .map_err(|err| ApiError::network(err.to_string()))?;
            }

            let mut form = reqwest::multipart::Form::new().part("file", part);
            for (name, value) in extra_fields {
                let text = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                form = form.text(name.clone(), text);
            }

            let response = self
                .http
                .request(Method::POST, &url)
                .multipart(form)
                .send()
                .await
                .map_err(ApiError::from_reqwest)?;
            Self::read_response(response).await
        };

        match tokio::time::timeout(options.timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::timeout()),
        }
    }

    /// Best-effort liveness probe: short timeout, one retry, failures
    /// collapse to `false`
    pub async fn health_check(&self) -> bool {
        let options = RequestOptions {
            method: Method::GET,
            body: None,
            timeout: Duration::from_millis(HEALTH_TIMEOUT_MS),
            retries: HEALTH_RETRIES,
            retry_delay: self.defaults.retry_delay,
        };

        self.request("/health", options).await.is_ok()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Instant;

    fn fast_options(method: Method) -> RequestOptions {
        RequestOptions {
            method,
            body: None,
            timeout: Duration::from_millis(1_000),
            retries: 3,
            retry_delay: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_get_parses_json_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/insurance/types");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"insurance_types": ["private", "medicare"]}));
            })
            .await;

        let client = ApiClient::new(server.base_url());
        let body = client.get("/insurance/types").await.unwrap();

        assert_eq!(
            body,
            ResponseBody::Json(json!({"insurance_types": ["private", "medicare"]}))
        );
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_non_json_content_type_returns_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/letter");
                then.status(200)
                    .header("content-type", "text/plain")
                    .body("Dear Claims Department,");
            })
            .await;

        let client = ApiClient::new(server.base_url());
        let body = client.get("/letter").await.unwrap();

        assert_eq!(body, ResponseBody::Text("Dear Claims Department,".to_string()));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start_async().await;

        for status in [401u16, 403, 404, 422, 429] {
            let path = format!("/err/{}", status);
            let mock_path = path.clone();
            let mock = server
                .mock_async(move |when, then| {
                    when.method(GET).path(mock_path);
                    then.status(status);
                })
                .await;

            let client = ApiClient::new(server.base_url());
            let err = client
                .request(&path, fast_options(Method::GET))
                .await
                .unwrap_err();

            assert_eq!(err.status, status);
            assert!(!err.is_retryable());
            // Exactly one attempt per terminal status
            assert_eq!(mock.hits_async().await, 1);
        }
    }

    #[tokio::test]
    async fn test_server_errors_retried_with_backoff() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/flaky");
                then.status(503);
            })
            .await;

        let client = ApiClient::new(server.base_url());
        let options = RequestOptions {
            retries: 3,
            retry_delay: Duration::from_millis(10),
            ..fast_options(Method::GET)
        };

        let started = Instant::now();
        let err = client.request("/flaky", options).await.unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(err.status, 503);
        // retries + 1 total attempts
        assert_eq!(mock.hits_async().await, 4);
        // Backoff waits 10 + 20 + 40 ms between attempts
        assert!(elapsed >= Duration::from_millis(70));
    }

    #[tokio::test]
    async fn test_network_failure_maps_to_status_zero() {
        // Nothing listens on this port
        let client = ApiClient::new("http://127.0.0.1:1");
        let options = RequestOptions {
            retries: 0,
            ..fast_options(Method::GET)
        };

        let err = client.request("/anything", options).await.unwrap_err();

        assert_eq!(err.status, 0);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_timeout_yields_408_and_cancels_attempt() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200).delay(Duration::from_millis(500));
            })
            .await;

        let client = ApiClient::new(server.base_url());
        let options = RequestOptions {
            timeout: Duration::from_millis(50),
            retries: 0,
            ..fast_options(Method::GET)
        };

        let started = Instant::now();
        let err = client.request("/slow", options).await.unwrap_err();

        assert_eq!(err.status, 408);
        // Settled at the timeout bound, not the server delay
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_error_body_fields_are_salvaged() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/appeals");
                then.status(422)
                    .header("content-type", "application/json")
                    .json_body(json!({"detail": "denial_info is required", "code": "missing_field"}));
            })
            .await;

        let client = ApiClient::new(server.base_url());
        let err = client.post("/appeals", json!({})).await.unwrap_err();

        assert_eq!(err.status, 422);
        assert_eq!(err.message, "denial_info is required");
        assert_eq!(err.code.as_deref(), Some("missing_field"));
        assert!(err.details.is_some());
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/navigation/plan")
                    .json_body(json!({"monthly_income": 5000.0, "household_size": 3}));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"risk_level": "low"}));
            })
            .await;

        let client = ApiClient::new(server.base_url());
        let body = client
            .post(
                "/navigation/plan",
                json!({"monthly_income": 5000.0, "household_size": 3}),
            )
            .await
            .unwrap();

        assert_eq!(body, ResponseBody::Json(json!({"risk_level": "low"})));
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_form() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/ai/validate-bill");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"status": "received"}));
            })
            .await;

        let client = ApiClient::new(server.base_url());
        let file = FileUpload {
            file_name: "bill.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            bytes: vec![0xFF, 0xD8, 0xFF],
        };
        let body = client
            .upload(
                "/ai/validate-bill",
                file,
                vec![
                    ("member_id".to_string(), json!("m-1")),
                    ("policy_data".to_string(), json!({"plan_type": "PPO"})),
                ],
            )
            .await
            .unwrap();

        assert_eq!(body, ResponseBody::Json(json!({"status": "received"})));
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_health_check_true_on_ok() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"status": "ok"}));
            })
            .await;

        let client = ApiClient::new(server.base_url());
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_false_when_endpoint_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                // Slower than the 5s probe budget on both attempts
                then.status(200).delay(Duration::from_millis(5_500));
            })
            .await;

        let client = ApiClient::new(server.base_url());
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_false_on_failure_never_errors() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(500);
            })
            .await;

        let client = ApiClient::new(server.base_url());
        assert!(!client.health_check().await);
        // Short probe: exactly one retry
        assert_eq!(mock.hits_async().await, 2);
    }

    #[test]
    fn test_user_messages_cover_taxonomy() {
        assert!(ApiError::network("down").user_message().contains("connection"));
        assert!(ApiError::timeout().user_message().contains("too long"));

        let not_found = ApiError::from_response(404, "");
        assert!(not_found.user_message().contains("not found"));

        let server_fault = ApiError::from_response(500, "");
        assert!(server_fault.is_retryable());
        assert!(server_fault.user_message().contains("try again"));
    }
}
