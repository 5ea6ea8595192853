use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{MemoryStorage, Storage, keys};
use crate::api::{AnalysisResult, AudioResult, ScreenshotResult};
use crate::config::schema::BackendConfig;

/// User-editable connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub workspace_id: String,
}

/// Everything the templates read. One cached result per category.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub settings: Settings,
    pub last_analysis: Option<AnalysisResult>,
    pub repo_ingested: bool,
    pub last_screenshot: Option<ScreenshotResult>,
    pub last_audio: Option<AudioResult>,
    pub last_repo_path: Option<String>,
}

/// Application state plus the storage it is mirrored to.
///
/// Every mutation updates memory and persists immediately under the fixed
/// key names in [`keys`].
pub struct StateStore {
    storage: Box<dyn Storage>,
    defaults: BackendConfig,
    state: AppState,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl StateStore {
    /// Build state from storage, using `defaults` for unsaved settings.
    pub fn load(storage: Box<dyn Storage>, defaults: &BackendConfig) -> Self {
        let settings = resolve_settings(
            storage.get(keys::BACKEND_URL),
            storage.get(keys::WORKSPACE_ID),
            defaults,
        );

        let state = AppState {
            settings,
            last_analysis: read_json(storage.as_ref(), keys::LAST_ANALYSIS),
            repo_ingested: storage.get(keys::REPO_INGESTED).as_deref() == Some("true"),
            last_screenshot: read_json(storage.as_ref(), keys::LAST_SCREENSHOT),
            last_audio: read_json(storage.as_ref(), keys::LAST_AUDIO),
            last_repo_path: non_empty(storage.get(keys::LAST_REPO_PATH)),
        };

        Self {
            storage,
            defaults: defaults.clone(),
            state,
        }
    }

    /// Fresh state over an in-memory store with built-in defaults.
    pub fn in_memory() -> Self {
        Self::load(Box::new(MemoryStorage::new()), &BackendConfig::default())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Persist new settings. A blank value is stored as typed but reads back
    /// as the configured default, the same as after a reload.
    pub fn update_settings(&mut self, backend_url: &str, workspace_id: &str) -> Result<()> {
        let (backend_url, workspace_id) = (backend_url.trim(), workspace_id.trim());
        self.storage.set(keys::BACKEND_URL, backend_url)?;
        self.storage.set(keys::WORKSPACE_ID, workspace_id)?;
        self.state.settings = resolve_settings(
            Some(backend_url.to_string()),
            Some(workspace_id.to_string()),
            &self.defaults,
        );
        Ok(())
    }

    pub fn save_analysis(&mut self, result: AnalysisResult) -> Result<()> {
        write_json(self.storage.as_mut(), keys::LAST_ANALYSIS, &result)?;
        self.state.last_analysis = Some(result);
        Ok(())
    }

    pub fn save_screenshot(&mut self, result: ScreenshotResult) -> Result<()> {
        write_json(self.storage.as_mut(), keys::LAST_SCREENSHOT, &result)?;
        self.state.last_screenshot = Some(result);
        Ok(())
    }

    pub fn save_audio(&mut self, result: AudioResult) -> Result<()> {
        write_json(self.storage.as_mut(), keys::LAST_AUDIO, &result)?;
        self.state.last_audio = Some(result);
        Ok(())
    }

    pub fn set_repo_ingested(&mut self, ingested: bool) -> Result<()> {
        self.storage
            .set(keys::REPO_INGESTED, if ingested { "true" } else { "false" })?;
        self.state.repo_ingested = ingested;
        Ok(())
    }

    pub fn save_repo_path(&mut self, path: &str) -> Result<()> {
        self.storage.set(keys::LAST_REPO_PATH, path)?;
        self.state.last_repo_path = Some(path.to_string());
        Ok(())
    }
}

fn resolve_settings(
    backend_url: Option<String>,
    workspace_id: Option<String>,
    defaults: &BackendConfig,
) -> Settings {
    Settings {
        backend_url: non_empty(backend_url).unwrap_or_else(|| defaults.default_url.clone()),
        workspace_id: non_empty(workspace_id).unwrap_or_else(|| defaults.default_workspace.clone()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a stored JSON value. Missing, `null` and malformed all read as
/// "no cached result".
fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    serde_json::from_str::<Option<T>>(&raw).ok().flatten()
}

fn write_json<T: Serialize>(storage: &mut dyn Storage, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).with_context(|| format!("failed to serialize {key}"))?;
    storage.set(key, &json)
}
