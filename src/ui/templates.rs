//! HTML templates for every page and result view.
//!
//! Templates are pure: the same [`View`] always yields the same markup.
//! Interactive elements carry `data-action`, `data-field` and `data-nav`
//! attributes that the page script turns into requests; element ids name
//! the regions the server replaces after an action.
use maud::{Markup, html};

use crate::actions::{ControlId, Preview};
use crate::api::types::value_text;
use crate::api::{AnalysisResult, AnalysisType, AudioResult, ScreenshotResult, SuggestedAction};
use crate::health::HealthStatus;
use crate::history::{ALL_TYPES, ENTRY_TYPES, HistoryView};

use super::{Page, View};

/// Characters of each context snippet shown under an analysis.
const CONTEXT_PREVIEW_CHARS: usize = 300;

/// Confirmation text shown before history is cleared.
pub const CLEAR_HISTORY_CONFIRM: &str =
    "Are you sure you want to clear ALL history? This cannot be undone.";

/// Render `page`.
pub fn page(page: Page, view: &View<'_>) -> Markup {
    match page {
        Page::Home => home(),
        Page::Analysis => analysis(view),
        Page::CodeAnalysis => code_analysis(view),
        Page::ScreenshotAnalysis => screenshot_analysis(view),
        Page::AudioTranscription => audio_transcription(view),
        Page::ActionsFixes => actions_fixes(view),
        Page::History => history(view),
        Page::Settings => settings(view),
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

pub fn home() -> Markup {
    let tiles = [
        (
            Page::CodeAnalysis,
            "Code Analysis",
            "Debug, review, explain, and refactor your repository.",
        ),
        (
            Page::ScreenshotAnalysis,
            "Screenshot",
            "Upload error screens or UI designs for visual debugging.",
        ),
        (
            Page::AudioTranscription,
            "Audio Discussion",
            "Transcribe meetings and extract action items instantly.",
        ),
    ];

    html! {
        header {
            h1 { "Welcome to Code Agent" }
            p class="subtitle" { "AI-powered multimodal code companion." }
        }
        div class="card hero" {
            h2 { "Analyze smarter. Build better." }
            p { "Code, screenshots, audio meetings: all in one workspace." }
        }
        div class="grid-3" {
            @for (page, title, blurb) in tiles {
                div class="card clickable" data-nav=(page.id()) {
                    h3 { (title) }
                    p class="muted" { (blurb) }
                    button class="btn btn-secondary wide" data-nav=(page.id()) { "Open" }
                }
            }
        }
        div class="card row" {
            div {
                h3 { "Recent Activity" }
                p class="subtitle" { "Quick access to your latest results." }
            }
            button class="btn btn-primary" data-nav=(Page::Analysis.id()) { "Dashboard →" }
        }
    }
}

/// Overview of the cached results plus backend status.
pub fn analysis(view: &View<'_>) -> Markup {
    let state = view.state;

    let code = match &state.last_analysis {
        Some(last) => summary_card(
            "Code Analysis",
            html! {
                p { strong { "Query:" } " " (or_dash(&last.query)) }
                p class="muted clamp" { (last.summary) }
            },
            Some(Page::CodeAnalysis),
        ),
        None => summary_card(
            "Code Analysis",
            html! { p class="muted" { "No recent code analysis." } },
            None,
        ),
    };

    let screenshot = match &state.last_screenshot {
        Some(last) => summary_card(
            "Screenshot Analysis",
            html! {
                p { strong { "Status:" } " " (last.status.as_deref().unwrap_or("processed")) }
                p class="muted" { "Visual analysis complete." }
            },
            Some(Page::ScreenshotAnalysis),
        ),
        None => summary_card(
            "Screenshot Analysis",
            html! { p class="muted" { "No recent screenshots." } },
            None,
        ),
    };

    let audio = match &state.last_audio {
        Some(last) => summary_card(
            "Audio Transcription",
            html! { p { strong { "Action items:" } " " (last.action_items.len()) } },
            Some(Page::AudioTranscription),
        ),
        None => summary_card(
            "Audio Transcription",
            html! { p class="muted" { "No recent recordings." } },
            None,
        ),
    };

    html! {
        header {
            h1 { "Analysis Dashboard" }
            p class="subtitle" { "Central overview of all recent analyses." }
        }
        div class="grid-main" {
            div {
                h3 class="section-title" { "Latest Results" }
                (code)
                (screenshot)
                (audio)
            }
            div {
                h3 class="section-title" { "System Health" }
                div class="card" {
                    div class="row" {
                        span { "Backend" }
                        div id="dash-status" class="status" { (status_indicator(view.health)) }
                    }
                    div class="divider" {
                        p class="muted small" {
                            "Workspace: " span class="bright" { (state.settings.workspace_id) }
                        }
                        p class="muted small" {
                            "Backend URL: " span class="bright" { (state.settings.backend_url) }
                        }
                    }
                }
            }
        }
    }
}

pub fn code_analysis(view: &View<'_>) -> Markup {
    let state = view.state;
    let ingest_note = if state.repo_ingested {
        "Repository already ingested for this session"
    } else {
        "Ingestion required before analysis"
    };

    html! {
        header {
            h1 { "Code Analysis" }
            p class="subtitle" { "Analyze your repository with the code agent." }
        }
        div class="card" {
            h3 { "1. Ingest Codebase" }
            div class="input-group" {
                label class="input-label" for="repo-path" { "Project Absolute Path" }
                div class="row gap" {
                    input type="text" id="repo-path" data-field="repo_path"
                        placeholder="/Users/name/projects/my-app"
                        value=(state.last_repo_path.as_deref().unwrap_or(""));
                    (control_button(view, ControlId::Ingest, "btn btn-primary"))
                }
                p class="muted small" { (ingest_note) }
            }
        }
        div class="grid-2" {
            div class="card" {
                h3 { "2. Run Analysis" }
                div class="input-group" {
                    label class="input-label" for="ai-query" { "AI Agent Query" }
                    textarea id="ai-query" data-field="query" rows="5"
                        placeholder="e.g. 'Explain the authentication flow' or 'Find memory leaks in the loop'" {}
                }
                div class="input-group" {
                    label class="input-label" for="analysis-type" { "Analysis Type" }
                    select id="analysis-type" data-field="analysis_type" {
                        @for kind in AnalysisType::ALL {
                            option value=(kind.as_str()) { (kind.label()) }
                        }
                    }
                }
                label class="check" {
                    input type="checkbox" id="include-codebase" data-field="include_codebase" checked;
                    " Include codebase context"
                }
                (control_button(view, ControlId::Analyze, "btn btn-primary wide"))
            }
            div id="results-area" {
                @match &state.last_analysis {
                    Some(result) => { (analysis_result(result)) }
                    None => { (placeholder("Run an analysis to see results")) }
                }
            }
        }
    }
}

pub fn screenshot_analysis(view: &View<'_>) -> Markup {
    html! {
        header {
            h1 { "Screenshot Analysis" }
            p class="subtitle" { "Visual debugging for UI issues and error screens." }
        }
        div class="grid-2" {
            div class="card" {
                h3 { "Upload Image" }
                div class="input-group" {
                    label class="input-label" for="ss-file" { "Image Path" }
                    input type="text" id="ss-file" data-field="file"
                        data-change="preview-screenshot" placeholder="/path/to/screenshot.png";
                    span id="file-name" class="accent small" {}
                }
                div class="input-group" {
                    label class="input-label" for="ss-context" { "Describe Context (Optional)" }
                    textarea id="ss-context" data-field="context" rows="3"
                        placeholder="What should I look for?" {}
                }
                button class="btn btn-secondary wide" data-action="preview-screenshot" { "Preview" }
                (control_button(view, ControlId::AnalyzeScreenshot, "btn btn-primary wide"))
            }
            div id="ss-results-area" {
                div class="card tall" {
                    h3 { "Preview" }
                    div id="ss-preview" class="preview" {
                        @match &view.state.last_screenshot {
                            Some(result) => { (screenshot_result(result)) }
                            None => { p class="muted" { "Choose an image to start" } }
                        }
                    }
                }
            }
        }
    }
}

pub fn audio_transcription(view: &View<'_>) -> Markup {
    html! {
        header {
            h1 { "Audio Transcription" }
            p class="subtitle" { "Extract action items from meeting recordings." }
        }
        div class="card" {
            div class="grid-2" {
                div {
                    h3 { "Meeting Recording" }
                    div class="input-group" {
                        label class="input-label" for="audio-file" { "Audio File Path (WAV/MP3)" }
                        input type="text" id="audio-file" data-field="file" placeholder="/path/to/meeting.wav";
                    }
                    div class="input-group" {
                        label class="input-label" for="audio-participants" { "Meeting Participants" }
                        input type="text" id="audio-participants" data-field="participants"
                            placeholder="e.g. Alice, Bob, Charlie";
                    }
                    (control_button(view, ControlId::ProcessAudio, "btn btn-primary wide"))
                }
                div id="audio-results-area" {
                    @match &view.state.last_audio {
                        Some(result) => { (audio_result(result)) }
                        None => { (placeholder("Results will appear here")) }
                    }
                }
            }
        }
    }
}

pub fn actions_fixes(view: &View<'_>) -> Markup {
    html! {
        header {
            h1 { "Actions & Fixes" }
            p class="subtitle" { "Review and apply AI-suggested improvements." }
        }
        div id="actions-container" {
            @match &view.state.last_analysis {
                Some(result) => { (actions_list(&result.suggested_actions, view)) }
                None => { (no_actions()) }
            }
        }
    }
}

pub fn history(view: &View<'_>) -> Markup {
    let filter = &view.history.filter;
    let options = std::iter::once((ALL_TYPES, "All Types")).chain(ENTRY_TYPES);

    html! {
        header {
            h1 { "History" }
            p class="subtitle" { "Browse and reload past analyses." }
        }
        div class="card row gap" {
            input type="text" id="history-search" data-field="search" data-live="filter-history"
                placeholder="Search queries..." value=(filter.search);
            select id="history-type-filter" data-field="kind" data-change="filter-history" {
                @for (value, label) in options {
                    option value=(value) selected[value == filter.kind_value()] { (label) }
                }
            }
            button class="btn btn-secondary" id="btn-filter-history" data-action="filter-history" { "Filter" }
        }
        div id="history-list-container" { (history_list(view.history)) }
    }
}

pub fn settings(view: &View<'_>) -> Markup {
    let settings = &view.state.settings;
    html! {
        header {
            h1 { "Settings" }
            p class="subtitle" { "Configure your code agent environment." }
        }
        div class="grid-2" {
            div class="card" {
                h3 { "Backend Configuration" }
                div class="input-group" {
                    label class="input-label" for="settings-url" { "Backend URL" }
                    input type="text" id="settings-url" data-field="backend_url" value=(settings.backend_url);
                }
                div class="input-group" {
                    label class="input-label" for="settings-workspace" { "Workspace ID" }
                    input type="text" id="settings-workspace" data-field="workspace_id"
                        value=(settings.workspace_id);
                }
                button class="btn btn-primary wide" id="btn-save-settings" data-action="save-settings" {
                    "Save Configuration"
                }
            }
            div class="card" {
                h3 { "Environment Info" }
                div class="env-info" {
                    p { "OS: " (std::env::consts::OS) }
                    p { "Client: codeagent " (env!("CARGO_PKG_VERSION")) }
                }
                h3 class="section-title" { "Danger Zone" }
                button class="btn btn-danger wide" id="btn-clear-history" data-action="clear-history"
                    data-confirm=(CLEAR_HISTORY_CONFIRM) { "Clear History" }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Result views
// ---------------------------------------------------------------------------

pub fn analysis_result(result: &AnalysisResult) -> Markup {
    let contexts = result.relevant_contexts.as_deref().unwrap_or_default();

    html! {
        div class="card markdown-content" {
            div class="row" {
                h2 { "Analysis Result" }
                button class="btn btn-secondary" data-nav=(Page::ActionsFixes.id()) {
                    "View Suggested Actions →"
                }
            }
            h4 class="accent section-title" { "Executive Summary" }
            p { (result.summary) }
            h4 class="section-title underline" { "Detailed Report" }
            div class="prewrap" { (result.detailed_analysis) }
            h4 class="section-title" { "Relevant Code Context" }
            div class="stack" {
                @for context in contexts {
                    @let excerpt: String = context.content.chars().take(CONTEXT_PREVIEW_CHARS).collect();
                    div class="snippet" {
                        div class="snippet-source" { (context.source) }
                        pre { (excerpt) "..." }
                    }
                }
            }
            @if !result.follow_up_questions.is_empty() {
                h4 class="section-title" { "Follow-up Questions" }
                ul {
                    @for question in &result.follow_up_questions {
                        li { (question) }
                    }
                }
            }
        }
    }
}

pub fn screenshot_result(result: &ScreenshotResult) -> Markup {
    html! {
        div class="markdown-content left" {
            h3 class="success" { "Processed Successfully" }
            h4 class="section-title" { "Extracted Text" }
            div class="code-block" { (result.vision_text().as_deref().unwrap_or("None")) }
            h4 class="section-title" { "Detailed Explanation" }
            p { (result.explanation().unwrap_or("None")) }
            h4 class="section-title" { "Architectural Components" }
            div class="chips" {
                @for component in result.components() {
                    span class="chip" { (component) }
                }
            }
        }
    }
}

pub fn audio_result(result: &AudioResult) -> Markup {
    html! {
        div class="markdown-content left" {
            h3 class="success" { "Transcription Complete" }
            h4 class="section-title" { "Transcription" }
            p { (result.transcription.as_deref().unwrap_or("None")) }
            h4 class="section-title" { "Detected Action Items" }
            div {
                @for item in &result.action_items {
                    div class="action-note" {
                        p { (item.text) }
                        span class="muted small" {
                            "Confidence: " (item.confidence.as_ref().map(value_text).unwrap_or_default())
                        }
                    }
                }
            }
        }
    }
}

/// Selectable list of suggested actions. Empty lists render [`no_actions`].
pub fn actions_list(actions: &[SuggestedAction], view: &View<'_>) -> Markup {
    if actions.is_empty() {
        return no_actions();
    }

    html! {
        div class="card" {
            h3 { "Suggested Improvements" }
            p class="subtitle" { "Select the ones you'd like to apply." }
            div class="stack" {
                @for (idx, action) in actions.iter().enumerate() {
                    div class="action-item" {
                        input type="checkbox" class="action-check" data-idx=(idx);
                        div class="grow" {
                            div class="row" {
                                h4 class="accent" { (action.action_type.as_str().to_uppercase()) }
                                span class="badge" { (action.target_file) }
                            }
                            p { (action.description) }
                            @if !action.reasoning.is_empty() {
                                p class="muted small" { em { "Reasoning: " (action.reasoning) } }
                            }
                        }
                    }
                }
            }
            (control_button(view, ControlId::ApplyActions, "btn btn-primary wide"))
        }
    }
}

pub fn no_actions() -> Markup {
    html! {
        div class="card empty" {
            h3 { "No Recent Actions" }
            p class="muted" { "Run a code analysis to get suggested improvements." }
            button class="btn btn-secondary" data-nav=(Page::CodeAnalysis.id()) { "Go to Code Analysis" }
        }
    }
}

/// The filtered history list, or the fetch error.
pub fn history_list(history: &HistoryView) -> Markup {
    if let Some(err) = &history.load_error {
        return html! { div class="card error" { "Failed to load history: " (err) } };
    }

    let visible = history.visible();
    if visible.is_empty() {
        return html! { div class="card empty" { p class="muted" { "No history entries found." } } };
    }

    html! {
        @for entry in visible {
            @let label = ENTRY_TYPES
                .iter()
                .find(|(value, _)| *value == entry.kind)
                .map_or(entry.kind.as_str(), |(_, label)| *label);
            div class="card history-entry row" {
                div {
                    span class="badge" { (label) }
                    p { (or_dash(&entry.query)) }
                    p class="muted small" { (entry.timestamp.as_deref().unwrap_or("")) }
                }
                button class="btn btn-secondary" data-action="load-history-entry" data-id=(entry.id) {
                    "Load"
                }
            }
        }
    }
}

/// Online/offline dot. Used for both the header and the dashboard.
pub fn status_indicator(status: HealthStatus) -> Markup {
    let class = match status {
        HealthStatus::Unknown => "unknown",
        HealthStatus::Online => "online",
        HealthStatus::Offline => "offline",
    };
    html! {
        span class={ "status-dot " (class) } {}
        span { (status.label()) }
    }
}

pub fn screenshot_preview(preview: &Preview) -> Markup {
    html! {
        img class="preview-image" src=(preview.data_url) alt=(preview.file_name);
    }
}

pub fn error_card(message: &str) -> Markup {
    html! { div class="card" { "Error: " (message) } }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

fn placeholder(message: &str) -> Markup {
    html! { div class="card placeholder" { (message) } }
}

fn summary_card(title: &str, body: Markup, details: Option<Page>) -> Markup {
    html! {
        div class="card row" {
            div {
                h4 { (title) }
                div class="summary-body" { (body) }
            }
            @if let Some(page) = details {
                button class="btn btn-secondary" data-nav=(page.id()) { "Details" }
            }
        }
    }
}

/// A busy-controlled button. `data-busy` is the label the page script shows
/// while the request is in flight.
fn control_button(view: &View<'_>, id: ControlId, class: &str) -> Markup {
    let state = view.controls.state(id);
    html! {
        button class=(class) id=(id.dom_id()) data-action=(id.action())
            data-busy=(id.busy_label()) disabled[!state.enabled] { (state.label) }
    }
}
