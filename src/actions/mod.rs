//! User actions as commands.
//!
//! Each command takes plain input values and returns the backend result.
//! Required inputs are checked before any request is sent, so a validation
//! failure never reaches the network. The dashboard and the CLI share these.
pub mod controls;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::api::{
    AnalysisResult, AnalysisType, ApiClient, ApiError, AudioResult, ExecutionReport, FileUpload,
    HealthReport, HistoryEntry, IngestAck, ScreenshotResult, SuggestedAction,
};

pub use controls::{Busy, ControlId, ControlState, Controls};

/// One user action.
pub trait Command {
    type Input;
    type Output;

    fn execute(&self, input: Self::Input) -> Result<Self::Output, ApiError>;
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn require_text(value: &str, message: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(message));
    }
    Ok(trimmed.to_string())
}

fn require_file(path: Option<&Path>, message: &str) -> Result<FileUpload, ApiError> {
    let path = path
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| ApiError::validation(message))?;
    FileUpload::read(path)
        .map_err(|e| ApiError::validation(format!("Could not read {}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Codebase ingestion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct IngestInput {
    pub repo_path: String,
    pub workspace_id: String,
}

/// Start background indexing of a local repository.
pub struct IngestCodebase<'a> {
    client: &'a ApiClient,
}

impl<'a> IngestCodebase<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl Command for IngestCodebase<'_> {
    type Input = IngestInput;
    type Output = IngestAck;

    fn execute(&self, input: IngestInput) -> Result<IngestAck, ApiError> {
        let path = require_text(&input.repo_path, "Please provide path")?;
        self.client.ingest_codebase(&path, &input.workspace_id)
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnalyzeInput {
    pub query: String,
    pub analysis_type: AnalysisType,
    pub include_codebase: bool,
}

/// Run an analysis. The returned result carries the query and type it was
/// asked with, ready to be cached.
pub struct RunAnalysis<'a> {
    client: &'a ApiClient,
}

impl<'a> RunAnalysis<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl Command for RunAnalysis<'_> {
    type Input = AnalyzeInput;
    type Output = AnalysisResult;

    fn execute(&self, input: AnalyzeInput) -> Result<AnalysisResult, ApiError> {
        if input.query.trim().is_empty() {
            return Err(ApiError::validation("Enter query"));
        }
        let mut result =
            self.client
                .analyze(&input.query, input.analysis_type, input.include_codebase)?;
        result.query = input.query;
        result.analysis_type = input.analysis_type;
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Screenshot
// ---------------------------------------------------------------------------

/// A local image rendered inline before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub file_name: String,
    pub data_url: String,
}

/// Read an image into a `data:` URL. Makes no request.
#[derive(Debug, Default)]
pub struct PreviewScreenshot;

impl Command for PreviewScreenshot {
    type Input = Option<PathBuf>;
    type Output = Preview;

    fn execute(&self, input: Option<PathBuf>) -> Result<Preview, ApiError> {
        let upload = require_file(input.as_deref(), "Choose an image")?;
        Ok(Preview {
            data_url: upload.data_url(),
            file_name: upload.file_name,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScreenshotInput {
    pub file: Option<PathBuf>,
    pub context: String,
}

pub struct AnalyzeScreenshot<'a> {
    client: &'a ApiClient,
}

impl<'a> AnalyzeScreenshot<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl Command for AnalyzeScreenshot<'_> {
    type Input = ScreenshotInput;
    type Output = ScreenshotResult;

    fn execute(&self, input: ScreenshotInput) -> Result<ScreenshotResult, ApiError> {
        let image = require_file(input.file.as_deref(), "Choose an image")?;
        self.client.ingest_screenshot(&image, &input.context)
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AudioInput {
    pub file: Option<PathBuf>,
    pub participants: String,
}

pub struct TranscribeAudio<'a> {
    client: &'a ApiClient,
}

impl<'a> TranscribeAudio<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl Command for TranscribeAudio<'_> {
    type Input = AudioInput;
    type Output = AudioResult;

    fn execute(&self, input: AudioInput) -> Result<AudioResult, ApiError> {
        let audio = require_file(input.file.as_deref(), "Choose audio file")?;
        self.client.ingest_audio(&audio, &input.participants)
    }
}

// ---------------------------------------------------------------------------
// Action execution
// ---------------------------------------------------------------------------

/// Pick the actions at `indices`, in the order given. Out-of-range indices
/// are skipped.
pub fn select_actions(actions: &[SuggestedAction], indices: &[usize]) -> Vec<SuggestedAction> {
    indices
        .iter()
        .filter_map(|&i| actions.get(i).cloned())
        .collect()
}

/// Send the selected actions for execution, all at once.
pub struct ApplyActions<'a> {
    client: &'a ApiClient,
}

impl<'a> ApplyActions<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl Command for ApplyActions<'_> {
    type Input = Vec<SuggestedAction>;
    type Output = ExecutionReport;

    fn execute(&self, input: Vec<SuggestedAction>) -> Result<ExecutionReport, ApiError> {
        if input.is_empty() {
            return Err(ApiError::validation("Select at least one action"));
        }
        self.client.execute_actions(&input)
    }
}

// ---------------------------------------------------------------------------
// History and health
// ---------------------------------------------------------------------------

pub struct FetchHistory<'a> {
    client: &'a ApiClient,
}

impl<'a> FetchHistory<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl Command for FetchHistory<'_> {
    type Input = ();
    type Output = Vec<HistoryEntry>;

    fn execute(&self, _: ()) -> Result<Vec<HistoryEntry>, ApiError> {
        self.client.get_history()
    }
}

pub struct ClearHistory<'a> {
    client: &'a ApiClient,
}

impl<'a> ClearHistory<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl Command for ClearHistory<'_> {
    type Input = ();
    type Output = Value;

    fn execute(&self, _: ()) -> Result<Value, ApiError> {
        self.client.clear_history()
    }
}

pub struct CheckHealth<'a> {
    client: &'a ApiClient,
}

impl<'a> CheckHealth<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl Command for CheckHealth<'_> {
    type Input = ();
    type Output = HealthReport;

    fn execute(&self, _: ()) -> Result<HealthReport, ApiError> {
        self.client.check_health()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
