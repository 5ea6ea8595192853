//! Action handling for the dashboard.
//!
//! The page script posts a [`Submission`] for every button press; the reply
//! tells it which fragments to swap, what to alert, and the resulting state
//! of the button that was pressed.
//!
//! Async buttons follow one protocol: disable with a busy label, run the
//! command, then update state and the results region on success or alert on
//! failure. Either way the button comes back enabled with its idle label.
//! The apply button is the exception: after a successful run it stays
//! disabled as "Applied" until the page is rendered again.
use std::path::PathBuf;
use std::time::Instant;

use maud::{Markup, html};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::actions::{
    AnalyzeInput, AnalyzeScreenshot, ApplyActions, AudioInput, Busy, ClearHistory, Command,
    ControlId, ControlState, IngestCodebase, IngestInput, PreviewScreenshot, RunAnalysis,
    ScreenshotInput, TranscribeAudio, select_actions,
};
use crate::api::{AnalysisResult, AnalysisType, ApiError, AudioResult, ScreenshotResult};
use crate::history::HistoryFilter;
use crate::ui::templates;
use crate::ui::{Page, Rendered};

use super::App;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A user action posted from the page, tagged by `action`.
///
/// Form values arrive as the `data-field` inputs of the current page, so
/// every field is optional and unrelated fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Submission {
    Ingest {
        #[serde(default)]
        repo_path: String,
    },
    Analyze {
        #[serde(default)]
        query: String,
        #[serde(default)]
        analysis_type: AnalysisType,
        #[serde(default = "default_true")]
        include_codebase: bool,
    },
    PreviewScreenshot {
        #[serde(default)]
        file: String,
    },
    AnalyzeScreenshot {
        #[serde(default)]
        file: String,
        #[serde(default)]
        context: String,
    },
    ProcessAudio {
        #[serde(default)]
        file: String,
        #[serde(default)]
        participants: String,
    },
    ApplyActions {
        /// Indices into the last analysis' suggested actions.
        #[serde(default)]
        selected: Vec<usize>,
    },
    SaveSettings {
        #[serde(default)]
        backend_url: String,
        #[serde(default)]
        workspace_id: String,
    },
    ClearHistory {},
    FilterHistory {
        #[serde(default)]
        search: String,
        #[serde(default)]
        kind: String,
    },
    LoadHistoryEntry {
        id: String,
    },
}

fn default_true() -> bool {
    true
}

impl Submission {
    /// The action tag, as used in `/actions/<name>` and the activity log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ingest { .. } => "ingest",
            Self::Analyze { .. } => "analyze",
            Self::PreviewScreenshot { .. } => "preview-screenshot",
            Self::AnalyzeScreenshot { .. } => "analyze-screenshot",
            Self::ProcessAudio { .. } => "process-audio",
            Self::ApplyActions { .. } => "apply-actions",
            Self::SaveSettings { .. } => "save-settings",
            Self::ClearHistory {} => "clear-history",
            Self::FilterHistory { .. } => "filter-history",
            Self::LoadHistoryEntry { .. } => "load-history-entry",
        }
    }

    /// Parse a posted body for `/actions/<action>`. The path names the
    /// action; any `action` key in the body is overwritten.
    pub fn from_request(action: &str, body: &str) -> Result<Self, serde_json::Error> {
        let mut value = if body.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(body)?
        };
        if let Value::Object(map) = &mut value {
            map.insert("action".to_string(), Value::String(action.to_string()));
        }
        serde_json::from_value(value)
    }
}

/// Replacement markup for the element with id `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub target: String,
    pub html: String,
}

/// New state of the button that triggered the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlUpdate {
    pub id: &'static str,
    pub enabled: bool,
    pub label: String,
}

impl ControlUpdate {
    fn new(id: ControlId, state: ControlState) -> Self {
        Self {
            id: id.dom_id(),
            enabled: state.enabled,
            label: state.label,
        }
    }
}

/// Everything the page script should do after an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<Fragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlUpdate>,
    /// A freshly rendered page to swap in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigate: Option<Rendered>,
    /// Reload the whole dashboard.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reload: bool,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            alert: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn alert(mut self, message: impl Into<String>) -> Self {
        self.alert = Some(message.into());
        self
    }

    pub fn fragment(mut self, target: &str, html: Markup) -> Self {
        self.fragments.push(Fragment {
            target: target.to_string(),
            html: html.into_string(),
        });
        self
    }

    /// The replacement markup for `target`, if any.
    pub fn html_for(&self, target: &str) -> Option<&str> {
        self.fragments
            .iter()
            .find(|f| f.target == target)
            .map(|f| f.html.as_str())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

impl App {
    /// Handle one submission and record it in the activity log.
    pub fn submit(&mut self, submission: Submission) -> Reply {
        let name = submission.name();
        let started = Instant::now();

        let reply = match submission {
            Submission::Ingest { repo_path } => self.on_ingest(repo_path),
            Submission::Analyze {
                query,
                analysis_type,
                include_codebase,
            } => self.on_analyze(AnalyzeInput {
                query,
                analysis_type,
                include_codebase,
            }),
            Submission::PreviewScreenshot { file } => self.on_preview_screenshot(&file),
            Submission::AnalyzeScreenshot { file, context } => {
                self.on_analyze_screenshot(ScreenshotInput {
                    file: path_input(&file),
                    context,
                })
            }
            Submission::ProcessAudio { file, participants } => self.on_process_audio(AudioInput {
                file: path_input(&file),
                participants,
            }),
            Submission::ApplyActions { selected } => self.on_apply_actions(&selected),
            Submission::SaveSettings {
                backend_url,
                workspace_id,
            } => self.on_save_settings(&backend_url, &workspace_id),
            Submission::ClearHistory {} => self.on_clear_history(),
            Submission::FilterHistory { search, kind } => self.on_filter_history(&search, &kind),
            Submission::LoadHistoryEntry { id } => self.on_load_history_entry(&id),
        };

        let error = (!reply.ok).then(|| reply.alert.as_deref().unwrap_or("busy"));
        self.activity.record(name, error, started.elapsed());
        reply
    }

    fn busy(&self, Busy(id): Busy) -> Reply {
        Reply {
            control: Some(ControlUpdate::new(id, self.controls.state(id))),
            ..Reply::default()
        }
    }

    /// Restore `id` and attach its state to `reply`.
    fn finish(&mut self, id: ControlId, mut reply: Reply) -> Reply {
        self.controls.restore(id);
        reply.control = Some(ControlUpdate::new(id, self.controls.state(id)));
        reply
    }

    // -----------------------------------------------------------------------
    // Code analysis
    // -----------------------------------------------------------------------

    fn on_ingest(&mut self, repo_path: String) -> Reply {
        let id = ControlId::Ingest;
        if let Err(busy) = self.controls.begin(id) {
            return self.busy(busy);
        }

        let input = IngestInput {
            repo_path,
            workspace_id: self.store.settings().workspace_id.clone(),
        };
        let path = input.repo_path.trim().to_string();
        let ack = IngestCodebase::new(&self.client).execute(input);
        if let Err(err) = ack {
            return self.finish(id, Reply::failed(err.to_string()));
        }

        let saved = self
            .store
            .set_repo_ingested(true)
            .and_then(|()| self.store.save_repo_path(&path));
        let reply = match saved {
            Ok(()) => Reply::ok().alert("Ingestion started in background!"),
            Err(err) => Reply::ok().alert(format!("Failed to save state: {err:#}")),
        };
        let page = self.navigate(Page::CodeAnalysis);
        Reply {
            navigate: Some(page),
            ..self.finish(id, reply)
        }
    }

    fn on_analyze(&mut self, input: AnalyzeInput) -> Reply {
        let id = ControlId::Analyze;
        if let Err(busy) = self.controls.begin(id) {
            return self.busy(busy);
        }

        let reply = match RunAnalysis::new(&self.client).execute(input) {
            Ok(result) => {
                let html = templates::analysis_result(&result);
                let reply = Reply::ok().fragment("results-area", html);
                match self.store.save_analysis(result) {
                    Ok(()) => reply,
                    Err(err) => reply.alert(format!("Failed to save result: {err:#}")),
                }
            }
            Err(err @ ApiError::Validation(_)) => Reply::failed(err.to_string()),
            Err(err) => {
                let message = err.to_string();
                Reply::failed(&message).fragment("results-area", templates::error_card(&message))
            }
        };
        self.finish(id, reply)
    }

    // -----------------------------------------------------------------------
    // Screenshot and audio
    // -----------------------------------------------------------------------

    fn on_preview_screenshot(&mut self, file: &str) -> Reply {
        match PreviewScreenshot.execute(path_input(file)) {
            Ok(preview) => Reply::ok()
                .fragment("file-name", html! { (preview.file_name) })
                .fragment("ss-preview", templates::screenshot_preview(&preview)),
            Err(err) => Reply::failed(err.to_string()),
        }
    }

    fn on_analyze_screenshot(&mut self, input: ScreenshotInput) -> Reply {
        let id = ControlId::AnalyzeScreenshot;
        if let Err(busy) = self.controls.begin(id) {
            return self.busy(busy);
        }

        let reply = match AnalyzeScreenshot::new(&self.client).execute(input) {
            Ok(result) => {
                let reply = Reply::ok().fragment("ss-preview", templates::screenshot_result(&result));
                match self.store.save_screenshot(result) {
                    Ok(()) => reply,
                    Err(err) => reply.alert(format!("Failed to save result: {err:#}")),
                }
            }
            Err(err) => Reply::failed(err.to_string()),
        };
        self.finish(id, reply)
    }

    fn on_process_audio(&mut self, input: AudioInput) -> Reply {
        let id = ControlId::ProcessAudio;
        if let Err(busy) = self.controls.begin(id) {
            return self.busy(busy);
        }

        let reply = match TranscribeAudio::new(&self.client).execute(input) {
            Ok(result) => {
                let reply =
                    Reply::ok().fragment("audio-results-area", templates::audio_result(&result));
                match self.store.save_audio(result) {
                    Ok(()) => reply,
                    Err(err) => reply.alert(format!("Failed to save result: {err:#}")),
                }
            }
            Err(err) => Reply::failed(err.to_string()),
        };
        self.finish(id, reply)
    }

    // -----------------------------------------------------------------------
    // Actions & fixes
    // -----------------------------------------------------------------------

    fn on_apply_actions(&mut self, selected: &[usize]) -> Reply {
        let id = ControlId::ApplyActions;
        if let Err(busy) = self.controls.begin(id) {
            return self.busy(busy);
        }

        let available = self
            .store
            .state()
            .last_analysis
            .as_ref()
            .map(|a| a.suggested_actions.as_slice())
            .unwrap_or_default();
        let actions = select_actions(available, selected);

        let outcome = ApplyActions::new(&self.client).execute(actions);
        match outcome {
            Ok(_) => {
                self.controls.settle(id, "Applied");
                Reply {
                    control: Some(ControlUpdate::new(id, self.controls.state(id))),
                    ..Reply::ok().alert("Actions executed successfully!")
                }
            }
            Err(err @ ApiError::Validation(_)) => self.finish(id, Reply::failed(err.to_string())),
            Err(err) => self.finish(id, Reply::failed(format!("Execution failed: {err}"))),
        }
    }

    // -----------------------------------------------------------------------
    // Settings and history
    // -----------------------------------------------------------------------

    fn on_save_settings(&mut self, backend_url: &str, workspace_id: &str) -> Reply {
        if let Err(err) = self.store.update_settings(backend_url, workspace_id) {
            return Reply::failed(format!("Failed to save settings: {err:#}"));
        }
        self.client.set_base_url(&self.store.settings().backend_url);
        Reply {
            reload: true,
            ..Reply::ok().alert("Settings saved! Reloading...")
        }
    }

    fn on_clear_history(&mut self) -> Reply {
        match ClearHistory::new(&self.client).execute(()) {
            Ok(_) => {
                self.history.loaded(Vec::new());
                Reply {
                    reload: true,
                    ..Reply::ok().alert("History cleared!")
                }
            }
            Err(err) => Reply::failed(format!("Failed to clear history: {err}")),
        }
    }

    fn on_filter_history(&mut self, search: &str, kind: &str) -> Reply {
        self.history.filter = HistoryFilter::new(search, kind);
        Reply::ok().fragment(
            "history-list-container",
            templates::history_list(&self.history),
        )
    }

    /// Re-fetch history, cache the entry's data as the last result of its
    /// type, and open the matching page.
    fn on_load_history_entry(&mut self, entry_id: &str) -> Reply {
        if let Err(err) = self.refresh_history() {
            return Reply::failed(format!("Failed to load history entry: {err}"));
        }
        let Some(entry) = self.history.find(entry_id).cloned() else {
            return Reply::failed("Entry not found");
        };

        let loaded = match entry.kind.as_str() {
            "code_analysis" => decode::<AnalysisResult>(entry.data).and_then(|result| {
                self.store.save_analysis(result).map_err(|e| format!("{e:#}"))?;
                Ok(Some(Page::CodeAnalysis))
            }),
            "screenshot" => decode::<ScreenshotResult>(entry.data).and_then(|result| {
                self.store.save_screenshot(result).map_err(|e| format!("{e:#}"))?;
                Ok(Some(Page::ScreenshotAnalysis))
            }),
            "audio" => decode::<AudioResult>(entry.data).and_then(|result| {
                self.store.save_audio(result).map_err(|e| format!("{e:#}"))?;
                Ok(Some(Page::AudioTranscription))
            }),
            _ => Ok(None),
        };

        match loaded {
            Ok(Some(page)) => Reply {
                navigate: Some(self.navigate(page)),
                ..Reply::ok()
            },
            Ok(None) => Reply::ok(),
            Err(message) => Reply::failed(format!("Failed to load history entry: {message}")),
        }
    }
}

fn path_input(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, String> {
    serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()).to_string())
}
