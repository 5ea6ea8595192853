//! Request and response types for the analysis backend.
//!
//! Response types are lenient: every field the UI can live without is
//! optional or defaulted, and the opaque screenshot/audio payloads keep
//! unknown fields in `extra` so a persisted copy round-trips unchanged.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Kind of analysis requested from `/analyze`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    Explain,
    Review,
    Debug,
    Refactor,
    TestGenerate,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 5] = [
        Self::Explain,
        Self::Review,
        Self::Debug,
        Self::Refactor,
        Self::TestGenerate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explain => "explain",
            Self::Review => "review",
            Self::Debug => "debug",
            Self::Refactor => "refactor",
            Self::TestGenerate => "test_generate",
        }
    }

    /// Label shown in the analysis-type selector.
    pub fn label(self) -> &'static str {
        match self {
            Self::Explain => "Explain Code",
            Self::Review => "Bug Discovery / Review",
            Self::Debug => "Debug Specific Issue",
            Self::Refactor => "Suggest Refactoring",
            Self::TestGenerate => "Generate Tests",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "explain" => Some(Self::Explain),
            "review" => Some(Self::Review),
            "debug" => Some(Self::Debug),
            "refactor" => Some(Self::Refactor),
            "test_generate" | "test" | "tests" => Some(Self::TestGenerate),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub query: &'a str,
    pub analysis_type: AnalysisType,
    pub include_codebase: bool,
}

/// Body of `POST /ingest/codebase`.
#[derive(Debug, Clone, Serialize)]
pub struct IngestCodebaseRequest<'a> {
    pub repo_path: &'a str,
    pub workspace_id: &'a str,
}

/// Kind of change a suggested action performs.
///
/// The backend sometimes reports raw tool names (`edit_file`, `create_test`,
/// `create_pr_comment`); those are folded into the matching variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    #[serde(alias = "edit_file")]
    Edit,
    Create,
    Delete,
    #[serde(alias = "create_test")]
    Test,
    #[serde(alias = "create_pr_comment")]
    PrComment,
    SlackNotify,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Test => "test",
            Self::PrComment => "pr_comment",
            Self::SlackNotify => "slack_notify",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fix proposed by the backend. Sent back unchanged when selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub action_type: ActionType,
    pub target_file: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub confidence: f64,
}

/// A code excerpt the backend used as context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `/analyze`, completed client-side with the query and type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub detailed_analysis: String,
    #[serde(default)]
    pub suggested_actions: Vec<SuggestedAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_contexts: Option<Vec<ContextSnippet>>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub analysis_type: AnalysisType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_up_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Screenshot / audio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionAnalysis {
    /// String or list of strings, depending on the vision model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_analysis: Option<VisionAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub architectural_components: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `/ingest/screenshot`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ScreenshotAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScreenshotResult {
    /// Text the vision model read off the image, if any.
    pub fn vision_text(&self) -> Option<String> {
        self.analysis
            .as_ref()?
            .vision_analysis
            .as_ref()?
            .extracted_text
            .as_ref()
            .map(value_text)
            .filter(|s| !s.is_empty())
    }

    pub fn explanation(&self) -> Option<&str> {
        self.analysis.as_ref()?.detailed_explanation.as_deref()
    }

    pub fn components(&self) -> Vec<String> {
        self.analysis
            .as_ref()
            .map(|a| a.architectural_components.iter().map(value_text).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `/ingest/audio`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Ingestion, execution, health
// ---------------------------------------------------------------------------

/// Response of `/ingest/codebase`; ingestion itself runs in the background.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `/actions/execute`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub results: Vec<Value>,
}

impl ExecutionReport {
    /// Accepts `{"results": [...]}`, a bare list, or anything else (kept as
    /// a single result).
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(results) => Self { results },
            Value::Object(mut map) => match map.remove("results") {
                Some(Value::Array(results)) => Self { results },
                Some(other) => Self {
                    results: vec![other],
                },
                None if map.is_empty() => Self::default(),
                None => Self {
                    results: vec![Value::Object(map)],
                },
            },
            Value::Null => Self::default(),
            other => Self {
                results: vec![other],
            },
        }
    }
}

/// Response of `/health`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub services: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One stored result from `/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// Accepted shapes of the `/history` response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum HistoryPayload {
    List(Vec<HistoryEntry>),
    Entries { entries: Vec<HistoryEntry> },
    History { history: Vec<HistoryEntry> },
}

impl HistoryPayload {
    pub(crate) fn into_entries(self) -> Vec<HistoryEntry> {
        match self {
            Self::List(entries) | Self::Entries { entries } | Self::History { history: entries } => {
                entries
            }
        }
    }
}

/// Render a loosely-typed JSON value as display text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_type_accepts_raw_tool_names() {
        let action: SuggestedAction = serde_json::from_str(
            r#"{"action_type":"edit_file","target_file":"a.rs","description":"d","reasoning":"r","confidence":0.5}"#,
        )
        .unwrap();
        assert_eq!(action.action_type, ActionType::Edit);

        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains(r#""action_type":"edit""#));
        assert!(!json.contains("diff"));
    }

    #[test]
    fn analysis_result_defaults_missing_fields() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"summary":"S","detailed_analysis":"D","suggested_actions":[]}"#)
                .unwrap();
        assert_eq!(result.summary, "S");
        assert_eq!(result.analysis_type, AnalysisType::Explain);
        assert!(result.relevant_contexts.is_none());
        assert!(result.query.is_empty());
    }

    #[test]
    fn analysis_type_parse_and_display() {
        assert_eq!(AnalysisType::parse("Review"), Some(AnalysisType::Review));
        assert_eq!(AnalysisType::parse("test-generate"), Some(AnalysisType::TestGenerate));
        assert_eq!(AnalysisType::parse("poetry"), None);
        assert_eq!(AnalysisType::TestGenerate.to_string(), "test_generate");
    }

    #[test]
    fn screenshot_result_keeps_unknown_fields() {
        let raw = r#"{
            "id": "abc",
            "status": "processed",
            "analysis": {
                "vision_analysis": {"extracted_text": ["line one", "line two"], "ui_elements": 3},
                "detailed_explanation": "A login form",
                "architectural_components": ["Form", "Button"],
                "issue_classification": {"type": "ui"}
            },
            "extracted_text": "line one\nline two"
        }"#;
        let result: ScreenshotResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.vision_text().as_deref(), Some("line one\nline two"));
        assert_eq!(result.explanation(), Some("A login form"));
        assert_eq!(result.components(), vec!["Form", "Button"]);

        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["analysis"]["issue_classification"]["type"], "ui");
        assert_eq!(back["analysis"]["vision_analysis"]["ui_elements"], 3);
    }

    #[test]
    fn screenshot_without_analysis_has_no_text() {
        let result: ScreenshotResult =
            serde_json::from_str(r#"{"status":"failed","error":"bad image"}"#).unwrap();
        assert!(result.vision_text().is_none());
        assert!(result.components().is_empty());
        assert_eq!(result.extra["error"], "bad image");
    }

    #[test]
    fn audio_result_confidence_may_be_any_json() {
        let result: AudioResult = serde_json::from_str(
            r#"{"transcription":"hi","action_items":[{"text":"ship it","confidence":"high"},{"text":"test","confidence":0.9}]}"#,
        )
        .unwrap();
        assert_eq!(result.action_items.len(), 2);
        assert_eq!(value_text(result.action_items[0].confidence.as_ref().unwrap()), "high");
        assert_eq!(value_text(result.action_items[1].confidence.as_ref().unwrap()), "0.9");
    }

    #[test]
    fn execution_report_accepts_several_shapes() {
        let wrapped = ExecutionReport::from_value(serde_json::json!({"results": [{"status": "edited"}]}));
        assert_eq!(wrapped.results.len(), 1);

        let bare = ExecutionReport::from_value(serde_json::json!([1, 2]));
        assert_eq!(bare.results.len(), 2);

        let other = ExecutionReport::from_value(serde_json::json!({"ok": true}));
        assert_eq!(other.results, vec![serde_json::json!({"ok": true})]);

        assert!(ExecutionReport::from_value(Value::Null).results.is_empty());
    }

    #[test]
    fn history_payload_shapes() {
        let entry = r#"{"id":"1","type":"audio","query":"q","data":{}}"#;
        for raw in [
            format!("[{entry}]"),
            format!(r#"{{"entries":[{entry}]}}"#),
            format!(r#"{{"history":[{entry}]}}"#),
        ] {
            let payload: HistoryPayload = serde_json::from_str(&raw).unwrap();
            let entries = payload.into_entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].kind, "audio");
        }
    }
}
