//! HTTP transport seam for the API client.
//!
//! The client builds an [`HttpRequest`] and hands it to a [`Transport`].
//! Production uses [`UreqTransport`]; [`StubTransport`] answers from canned
//! responses and records every call, which lets the whole client stack run
//! without a backend.

use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;
use std::time::Duration;

use rand::Rng;
use rand::distributions::Alphanumeric;

use super::upload::FileUpload;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body as handed to the transport.
#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    /// Serialized JSON; the client has already set the content type.
    Json(Vec<u8>),
    /// Form container; the transport picks the boundary and sets the
    /// content-type header itself.
    Multipart(MultipartForm),
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub payload: Payload,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone)]
pub struct TransportError(pub String);

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sends one request, once. Any HTTP status counts as a response.
pub trait Transport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

// ---------------------------------------------------------------------------
// Multipart forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File(FileUpload),
}

#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

/// An ordered `multipart/form-data` body.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    pub parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: FormValue::Text(value.into()),
        });
        self
    }

    pub fn file(mut self, name: &str, file: FileUpload) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: FormValue::File(file),
        });
        self
    }

    /// Look up a text field by name.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match &p.value {
            FormValue::Text(v) if p.name == name => Some(v.as_str()),
            _ => None,
        })
    }

    /// Look up a file field by name.
    pub fn file_value(&self, name: &str) -> Option<&FileUpload> {
        self.parts.iter().find_map(|p| match &p.value {
            FormValue::File(f) if p.name == name => Some(f),
            _ => None,
        })
    }

    /// Encode the form with the given boundary.
    pub fn encode(&self, boundary: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match &part.value {
                FormValue::Text(value) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            quote_field(&part.name)
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(value.as_bytes());
                }
                FormValue::File(file) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            quote_field(&part.name),
                            quote_field(&file.file_name),
                            file.mime
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(&file.bytes);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        out
    }
}

/// Generate a random multipart boundary.
pub fn random_boundary() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("----codeagent{token}")
}

fn quote_field(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

// ---------------------------------------------------------------------------
// ureq transport
// ---------------------------------------------------------------------------

/// Blocking transport backed by `ureq`. Without a timeout a hung backend
/// call blocks until the peer gives up.
#[derive(Debug)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    /// Transport whose whole request (connect, send, read) is bounded by
    /// `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        // On Windows "localhost" may resolve to ::1 first while the backend
        // only binds IPv4.
        let url = request.url.replace("://localhost", "://127.0.0.1");
        let mut call = self.agent.request(request.method.as_str(), &url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let result = match request.payload {
            Payload::Empty => call.call(),
            Payload::Json(bytes) => call.send_bytes(&bytes),
            Payload::Multipart(form) => {
                let boundary = random_boundary();
                call.set(
                    "Content-Type",
                    &format!("multipart/form-data; boundary={boundary}"),
                )
                .send_bytes(&form.encode(&boundary))
            }
        };

        let response = match result {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(t)) => return Err(TransportError(t.to_string())),
        };

        let status = response.status();
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| TransportError(format!("failed reading response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// Stub transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum StubReply {
    Respond { status: u16, body: String },
    Fail(String),
}

#[derive(Debug, Clone)]
struct StubRoute {
    method: Method,
    path: String,
    reply: StubReply,
}

/// Canned-response transport that records every request it receives.
///
/// Routes match on method plus URL suffix; the most recently registered
/// route wins. Unmatched requests get a 404 with a `detail` message.
#[derive(Debug, Default)]
pub struct StubTransport {
    routes: RefCell<Vec<StubRoute>>,
    calls: RefCell<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `status` and a raw body.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.routes.borrow_mut().push(StubRoute {
            method,
            path: path.to_string(),
            reply: StubReply::Respond {
                status,
                body: body.to_string(),
            },
        });
        self
    }

    /// Fail `method path` at the transport level.
    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.routes.borrow_mut().push(StubRoute {
            method,
            path: path.to_string(),
            reply: StubReply::Fail(message.to_string()),
        });
        self
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.borrow().clone()
    }

    /// Number of requests whose URL ends with `path`.
    pub fn call_count(&self, path: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|r| r.url.ends_with(path))
            .count()
    }
}

impl Transport for StubTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let reply = self
            .routes
            .borrow()
            .iter()
            .rev()
            .find(|r| r.method == request.method && request.url.ends_with(&r.path))
            .map(|r| r.reply.clone());
        let url = request.url.clone();
        self.calls.borrow_mut().push(request);

        match reply {
            Some(StubReply::Respond { status, body }) => Ok(HttpResponse {
                status,
                body: body.into_bytes(),
            }),
            Some(StubReply::Fail(message)) => Err(TransportError(message)),
            None => Ok(HttpResponse {
                status: 404,
                body: serde_json::json!({ "detail": format!("no stub for {url}") })
                    .to_string()
                    .into_bytes(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn timed_transport_gives_up_on_a_silent_peer() {
        // Accepts connections (via the backlog) but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = UreqTransport::with_timeout(Duration::from_millis(300));
        let started = Instant::now();
        let result = transport.send(HttpRequest {
            method: Method::Get,
            url: format!("http://{addr}/health"),
            headers: Vec::new(),
            payload: Payload::Empty,
        });

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(listener);
    }

    fn upload() -> FileUpload {
        FileUpload {
            file_name: "shot.png".to_string(),
            mime: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn multipart_encodes_text_and_file_parts() {
        let form = MultipartForm::new()
            .file("file", upload())
            .text("context", "login page");
        let body = form.encode("XYZ");
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with("--XYZ\r\n"));
        assert!(text.contains("name=\"file\"; filename=\"shot.png\"\r\nContent-Type: image/png"));
        assert!(text.contains("name=\"context\"\r\n\r\nlogin page\r\n"));
        assert!(text.ends_with("--XYZ--\r\n"));
    }

    #[test]
    fn multipart_lookup_by_name() {
        let form = MultipartForm::new()
            .file("file", upload())
            .text("participants", "Alice, Bob");
        assert_eq!(form.text_value("participants"), Some("Alice, Bob"));
        assert_eq!(form.file_value("file").map(|f| f.file_name.as_str()), Some("shot.png"));
        assert!(form.text_value("file").is_none());
    }

    #[test]
    fn random_boundaries_differ() {
        let a = random_boundary();
        let b = random_boundary();
        assert!(a.starts_with("----codeagent"));
        assert_ne!(a, b);
    }

    #[test]
    fn stub_prefers_latest_route_and_records_calls() {
        let stub = StubTransport::new();
        stub.respond(Method::Get, "/health", 500, "{}");
        stub.respond(Method::Get, "/health", 200, r#"{"status":"healthy"}"#);

        let resp = stub
            .send(HttpRequest {
                method: Method::Get,
                url: "http://x/health".to_string(),
                headers: Vec::new(),
                payload: Payload::Empty,
            })
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(stub.call_count("/health"), 1);
    }

    #[test]
    fn stub_unmatched_route_is_404() {
        let stub = StubTransport::new();
        let resp = stub
            .send(HttpRequest {
                method: Method::Delete,
                url: "http://x/history".to_string(),
                headers: Vec::new(),
                payload: Payload::Empty,
            })
            .unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_success());
    }
}
