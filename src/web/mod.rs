//! Embedded dashboard server.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - The dashboard shell with the home page pre-rendered
//! - Page fragments and action replies as JSON
//! - The backend status indicator and the editor-panel preview
//!
//! Launched via `codeagent serve` (default: `http://127.0.0.1:8765`).

mod api;
mod frontend;

use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::app::App;
use crate::config::ClientConfig;
use crate::health::HealthStatus;
use crate::ui::Page;

pub use frontend::index_html;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard on `config.server.addr`.
///
/// Blocks the current thread. Requests are handled one at a time; the wait
/// between requests doubles as the backend health timer, so a check runs
/// every `health.interval_secs` even while the dashboard is idle.
pub fn serve(config: &ClientConfig) -> Result<()> {
    let addr = config.server.addr.as_str();
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let mut app = App::from_config(config);
    app.navigate(Page::Home);

    println!("codeagent dashboard running at http://{addr}");
    println!("Backend: {}", app.client().base_url());
    println!("Press Ctrl+C to stop.\n");

    if config.server.open_browser {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            eprintln!("{} {e:#}", "warning:".yellow());
        }
    }

    let mut last_status = app.check_health(Instant::now());
    report_status(last_status);

    loop {
        if let Some(status) = app.tick_health(Instant::now()) {
            if status != last_status {
                report_status(status);
                last_status = status;
            }
        }

        let wait = app.health().time_until_due(Instant::now());
        let request = match server.recv_timeout(wait) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{} failed to receive request: {e}", "error:".red());
                continue;
            }
        };

        handle(&mut app, request, config.server.access_log);
    }
}

fn handle(app: &mut App, mut request: Request, access_log: bool) {
    let method = request.method().clone();
    let url = request.url().to_string();

    // Read body up-front for methods that carry one
    let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
        let mut buf = String::new();
        let _ = request.as_reader().read_to_string(&mut buf);
        Some(buf)
    } else {
        None
    };

    let reply = dispatch(app, &method, &url, body.as_deref()).unwrap_or_else(|e| {
        let body = serde_json::json!({ "error": format!("{e:#}") }).to_string();
        HttpReply::json(500, body)
    });

    match reply.into_response() {
        Ok(resp) => {
            let _ = request.respond(resp);
        }
        Err(e) => eprintln!("{} {e:#}", "error:".red()),
    }

    if access_log {
        println!(
            "{} {} {}",
            method,
            url,
            chrono::Local::now().format("%H:%M:%S")
        );
    }
}

fn report_status(status: HealthStatus) {
    match status {
        HealthStatus::Online => println!("{} backend is online", "✓".green().bold()),
        HealthStatus::Offline => eprintln!("{} backend is offline", "✗".red().bold()),
        HealthStatus::Unknown => {}
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch a request to the appropriate handler.
pub fn dispatch(app: &mut App, method: &Method, url: &str, body: Option<&str>) -> Result<HttpReply> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(api::index(app)),
        (&Method::Get, "/status") => api::status(app),
        (&Method::Get, "/panel") => api::panel(),
        (&Method::Get, _) if path.starts_with("/pages/") => {
            api::page(app, &path["/pages/".len()..])
        }
        (&Method::Post, _) if path.starts_with("/actions/") => {
            api::action(app, &path["/actions/".len()..], body.unwrap_or(""))
        }
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// A response body plus status, independent of the socket it goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpReply {
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }

    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_HTML,
            body,
        }
    }

    fn into_response(self) -> Result<Response<Cursor<Vec<u8>>>> {
        let header = Header::from_bytes("Content-Type", self.content_type)
            .map_err(|()| anyhow::anyhow!("invalid content type {}", self.content_type))?;
        Ok(Response::from_data(self.body.into_bytes())
            .with_header(header)
            .with_status_code(StatusCode(self.status)))
    }
}

const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

/// 404 response.
fn not_found() -> HttpReply {
    HttpReply::json(404, r#"{"error": "not found"}"#.to_string())
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
