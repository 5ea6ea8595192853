//! HTTP client for the analysis backend.
//!
//! Every operation goes through [`ApiClient::request`]: one attempt, no
//! retry. Only health checks are bounded by a timeout, through their own
//! transport. Non-2xx responses become [`ApiError::Http`] with the backend's
//! `detail` message when it sent one.
pub mod error;
pub mod transport;
pub mod types;
pub mod upload;

use std::time::Duration;

use colored::Colorize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::ApiError;
pub use transport::{
    HttpRequest, HttpResponse, Method, MultipartForm, Payload, StubTransport, Transport,
    TransportError, UreqTransport,
};
pub use types::{
    ActionType, AnalysisResult, AnalysisType, AudioResult, ExecutionReport, HealthReport,
    HistoryEntry, IngestAck, ScreenshotResult, SuggestedAction,
};
pub use upload::FileUpload;

use types::{AnalyzeRequest, HistoryPayload, IngestCodebaseRequest};

/// Request body before it is handed to the transport.
#[derive(Debug, Clone)]
pub enum RequestBody {
    None,
    Json(Value),
    Multipart(MultipartForm),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Backend client bound to one base URL.
pub struct ApiClient {
    base_url: String,
    transport: Box<dyn Transport>,
    /// Used for `/health` when set; everything else goes through `transport`.
    health_transport: Option<Box<dyn Transport>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, transport: impl Transport + 'static) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            transport: Box::new(transport),
            health_transport: None,
        }
    }

    /// Client using the blocking `ureq` transport.
    pub fn connect(base_url: &str) -> Self {
        Self::new(base_url, UreqTransport::new())
    }

    /// Like [`ApiClient::connect`], but health checks give up after
    /// `health_timeout` so a hung backend only marks the status offline.
    pub fn connect_with_health_timeout(base_url: &str, health_timeout: Duration) -> Self {
        Self::connect(base_url).with_health_transport(UreqTransport::with_timeout(health_timeout))
    }

    /// Route `/health` through a separate transport.
    pub fn with_health_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.health_transport = Some(Box::new(transport));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Point subsequent requests at a new backend.
    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = normalize_base_url(base_url);
    }

    /// Send one request and decode the JSON reply.
    pub fn request<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        body: RequestBody,
    ) -> Result<R, ApiError> {
        let value = self.request_value(endpoint, method, body)?;
        serde_json::from_value(value).map_err(|e| {
            let err = ApiError::Decode(e.to_string());
            trace_failure(endpoint, &err);
            err
        })
    }

    /// Send one request and return the raw JSON reply.
    pub fn request_value(
        &self,
        endpoint: &str,
        method: Method,
        body: RequestBody,
    ) -> Result<Value, ApiError> {
        self.request_value_via(self.transport.as_ref(), endpoint, method, body)
    }

    fn request_value_via(
        &self,
        transport: &dyn Transport,
        endpoint: &str,
        method: Method,
        body: RequestBody,
    ) -> Result<Value, ApiError> {
        let result = self.send(transport, endpoint, method, body);
        if let Err(ref err) = result {
            trace_failure(endpoint, err);
        }
        result
    }

    fn send(
        &self,
        transport: &dyn Transport,
        endpoint: &str,
        method: Method,
        body: RequestBody,
    ) -> Result<Value, ApiError> {
        let mut headers = Vec::new();
        let payload = match body {
            RequestBody::None => Payload::Empty,
            RequestBody::Json(value) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                let bytes =
                    serde_json::to_vec(&value).map_err(|e| ApiError::Decode(e.to_string()))?;
                Payload::Json(bytes)
            }
            RequestBody::Multipart(form) => Payload::Multipart(form),
        };

        let request = HttpRequest {
            method,
            url: format!("{}{}", self.base_url, endpoint),
            headers,
            payload,
        };

        let response = transport
            .send(request)
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                message: error_message(&response),
            });
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.request(endpoint, Method::Post, RequestBody::Json(value))
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// `POST /ingest/codebase`: start background indexing of a repository.
    pub fn ingest_codebase(&self, repo_path: &str, workspace_id: &str) -> Result<IngestAck, ApiError> {
        self.post_json(
            "/ingest/codebase",
            &IngestCodebaseRequest {
                repo_path,
                workspace_id,
            },
        )
    }

    /// `POST /analyze`.
    pub fn analyze(
        &self,
        query: &str,
        analysis_type: AnalysisType,
        include_codebase: bool,
    ) -> Result<AnalysisResult, ApiError> {
        self.post_json(
            "/analyze",
            &AnalyzeRequest {
                query,
                analysis_type,
                include_codebase,
            },
        )
    }

    /// `POST /ingest/screenshot` (multipart: `file`, `context`).
    pub fn ingest_screenshot(
        &self,
        image: &FileUpload,
        context: &str,
    ) -> Result<ScreenshotResult, ApiError> {
        let form = MultipartForm::new()
            .file("file", image.clone())
            .text("context", context);
        self.request("/ingest/screenshot", Method::Post, RequestBody::Multipart(form))
    }

    /// `POST /ingest/audio` (multipart: `file`, `participants`).
    pub fn ingest_audio(&self, audio: &FileUpload, participants: &str) -> Result<AudioResult, ApiError> {
        let form = MultipartForm::new()
            .file("file", audio.clone())
            .text("participants", participants);
        self.request("/ingest/audio", Method::Post, RequestBody::Multipart(form))
    }

    /// `POST /actions/execute` with the selected actions.
    pub fn execute_actions(&self, actions: &[SuggestedAction]) -> Result<ExecutionReport, ApiError> {
        let body = serde_json::to_value(actions).map_err(|e| ApiError::Decode(e.to_string()))?;
        let value = self.request_value("/actions/execute", Method::Post, RequestBody::Json(body))?;
        Ok(ExecutionReport::from_value(value))
    }

    /// `GET /health`.
    pub fn check_health(&self) -> Result<HealthReport, ApiError> {
        let transport = self
            .health_transport
            .as_deref()
            .unwrap_or(self.transport.as_ref());
        let value = self.request_value_via(transport, "/health", Method::Get, RequestBody::None)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    /// `GET /history`.
    pub fn get_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let payload: HistoryPayload = self.request("/history", Method::Get, RequestBody::None)?;
        Ok(payload.into_entries())
    }

    /// `DELETE /history`.
    pub fn clear_history(&self) -> Result<Value, ApiError> {
        self.request_value("/history", Method::Delete, RequestBody::None)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Human-readable message for a non-2xx response.
fn error_message(response: &HttpResponse) -> String {
    let fallback = || format!("HTTP Error {}", response.status);
    let Ok(body) = serde_json::from_slice::<Value>(&response.body) else {
        return fallback();
    };
    match body.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
        Some(Value::Null) | None => fallback(),
        Some(Value::String(_)) => fallback(),
        Some(other) => other.to_string(),
    }
}

/// Console trace for failed calls. Validation never reaches the client.
fn trace_failure(endpoint: &str, err: &ApiError) {
    eprintln!("{} {endpoint}: {err}", "[API Error]".red().bold());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(error_message(&response(404, r#"{"detail":"not found"}"#)), "not found");
    }

    #[test]
    fn error_message_falls_back_to_status() {
        assert_eq!(error_message(&response(500, "<html>oops")), "HTTP Error 500");
        assert_eq!(error_message(&response(502, r#"{"error":"x"}"#)), "HTTP Error 502");
        assert_eq!(error_message(&response(503, r#"{"detail":""}"#)), "HTTP Error 503");
    }

    #[test]
    fn error_message_renders_structured_detail() {
        let msg = error_message(&response(422, r#"{"detail":[{"msg":"field required"}]}"#));
        assert!(msg.contains("field required"));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new(" http://localhost:8000/ ", StubTransport::new());
        assert_eq!(client.base_url(), "http://localhost:8000");

        let mut client = client;
        client.set_base_url("http://other:9000//");
        assert_eq!(client.base_url(), "http://other:9000");
    }
}
