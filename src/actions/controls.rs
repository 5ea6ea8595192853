//! Busy state of the async action buttons.
//!
//! A control moves idle → busy when its action starts and back to idle when
//! the action finishes, success or failure. While busy it rejects further
//! submissions, which is the only duplicate-request guard there is.
use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// The buttons that trigger a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlId {
    Ingest,
    Analyze,
    AnalyzeScreenshot,
    ProcessAudio,
    ApplyActions,
}

impl ControlId {
    pub const ALL: [ControlId; 5] = [
        Self::Ingest,
        Self::Analyze,
        Self::AnalyzeScreenshot,
        Self::ProcessAudio,
        Self::ApplyActions,
    ];

    /// Element id of the button in the rendered page.
    pub fn dom_id(self) -> &'static str {
        match self {
            Self::Ingest => "btn-ingest",
            Self::Analyze => "btn-analyze",
            Self::AnalyzeScreenshot => "btn-analyze-ss",
            Self::ProcessAudio => "btn-process-audio",
            Self::ApplyActions => "btn-apply-actions",
        }
    }

    /// Name of the action the button submits.
    pub fn action(self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Analyze => "analyze",
            Self::AnalyzeScreenshot => "analyze-screenshot",
            Self::ProcessAudio => "process-audio",
            Self::ApplyActions => "apply-actions",
        }
    }

    pub fn idle_label(self) -> &'static str {
        match self {
            Self::Ingest => "Ingest Repository",
            Self::Analyze => "Run Analysis",
            Self::AnalyzeScreenshot => "Analyze Screenshot",
            Self::ProcessAudio => "Process Audio",
            Self::ApplyActions => "Apply Selected Actions",
        }
    }

    pub fn busy_label(self) -> &'static str {
        match self {
            Self::Ingest => "Ingesting...",
            Self::Analyze => "Thinking...",
            Self::AnalyzeScreenshot => "Processing...",
            Self::ProcessAudio => "Transcribing...",
            Self::ApplyActions => "Applying...",
        }
    }
}

impl std::fmt::Display for ControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dom_id())
    }
}

/// What a button currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub enabled: bool,
    pub label: String,
}

impl ControlState {
    fn idle(id: ControlId) -> Self {
        Self {
            enabled: true,
            label: id.idle_label().to_string(),
        }
    }
}

/// Returned when a submission arrives while its control is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0} is busy")]
pub struct Busy(pub ControlId);

/// State of every action control. Controls not in the map are idle.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    states: BTreeMap<ControlId, ControlState>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: ControlId) -> ControlState {
        self.states
            .get(&id)
            .cloned()
            .unwrap_or_else(|| ControlState::idle(id))
    }

    pub fn is_enabled(&self, id: ControlId) -> bool {
        self.states.get(&id).is_none_or(|s| s.enabled)
    }

    /// Disable `id` and show its busy label.
    pub fn begin(&mut self, id: ControlId) -> Result<(), Busy> {
        if !self.is_enabled(id) {
            return Err(Busy(id));
        }
        self.states.insert(
            id,
            ControlState {
                enabled: false,
                label: id.busy_label().to_string(),
            },
        );
        Ok(())
    }

    /// Back to enabled with the idle label.
    pub fn restore(&mut self, id: ControlId) {
        self.states.remove(&id);
    }

    /// Leave `id` disabled with a final label until the page is re-rendered.
    pub fn settle(&mut self, id: ControlId, label: &str) {
        self.states.insert(
            id,
            ControlState {
                enabled: false,
                label: label.to_string(),
            },
        );
    }

    /// Re-rendering a page starts every control fresh.
    pub fn reset(&mut self) {
        self.states.clear();
    }
}
