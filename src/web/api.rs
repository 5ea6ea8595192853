//! Request handlers for the dashboard.
//!
//! Each handler corresponds to an endpoint and returns an [`HttpReply`]
//! with JSON or HTML content.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::app::{App, Submission};
use crate::ui::Page;
use crate::webview;

use super::HttpReply;
use super::frontend;

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// `/status` response; `html` is the indicator markup for both regions.
#[derive(Serialize)]
struct StatusResponse {
    online: bool,
    label: &'static str,
    html: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// CSP source the preview panel allows scripts from.
const PANEL_CSP_SOURCE: &str = "'self'";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<HttpReply> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(HttpReply::json(200, body))
}

fn bad_request(message: String) -> Result<HttpReply> {
    let body = serde_json::to_string(&ErrorResponse { error: message })
        .context("failed to serialize JSON response")?;
    Ok(HttpReply::json(400, body))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /`: a fresh shell always starts on the home page.
pub fn index(app: &mut App) -> HttpReply {
    let rendered = app.navigate(Page::Home);
    HttpReply::html(frontend::index_html(
        &rendered.nav,
        &rendered.html,
        &app.status_markup(),
        app.health().interval().as_millis(),
    ))
}

/// `GET /pages/<id>`: navigate and return the rendered page.
pub fn page(app: &mut App, id: &str) -> Result<HttpReply> {
    json_response(&app.navigate_id(id))
}

/// `POST /actions/<action>`: run one user action.
pub fn action(app: &mut App, name: &str, body: &str) -> Result<HttpReply> {
    match Submission::from_request(name, body) {
        Ok(submission) => json_response(&app.submit(submission)),
        Err(e) => bad_request(format!("invalid {name} request: {e}")),
    }
}

/// `GET /status`: current backend health.
pub fn status(app: &App) -> Result<HttpReply> {
    let health = app.health().status();
    json_response(&StatusResponse {
        online: health.is_online(),
        label: health.label(),
        html: app.status_markup(),
    })
}

/// `GET /panel`: the editor panel with the default script, for preview.
pub fn panel() -> Result<HttpReply> {
    let html = webview::panel_html(
        webview::DEFAULT_SCRIPT,
        &webview::generate_nonce(),
        PANEL_CSP_SOURCE,
    )
    .context("failed to render editor panel")?;
    Ok(HttpReply::html(html))
}
