//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `codeagent serve`: run the local dashboard
//! - `codeagent health`: check config, store and backend reachability
//! - `codeagent ingest | analyze | screenshot | audio | actions`: run one
//!   action against the backend and print the result
//! - `codeagent history`: list, filter or clear stored results
//! - `codeagent settings show|set`: the persisted backend URL and workspace
//! - `codeagent panel`: emit the editor panel page
//! - `codeagent activity`: recent entries of the activity log
//! - `codeagent config show|init|set|reset`: configuration management

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::actions::{
    AnalyzeInput, AnalyzeScreenshot, ApplyActions, AudioInput, CheckHealth, ClearHistory, Command,
    FetchHistory, IngestCodebase, IngestInput, RunAnalysis, ScreenshotInput, TranscribeAudio,
    select_actions,
};
use crate::activity::{self, ActivityEntry, ActivityLog};
use crate::api::types::value_text;
use crate::api::{
    AnalysisResult, AnalysisType, ApiClient, ApiError, AudioResult, ScreenshotResult,
    SuggestedAction,
};
use crate::config::{self, ClientConfig};
use crate::history::{ALL_TYPES, HistoryFilter, filter_entries};
use crate::store::{self, StateStore};
use crate::webview::{self, PanelMessage};

/// Output format for result commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Config, persisted state, client and activity log for one CLI invocation.
struct Session {
    config: ClientConfig,
    store: StateStore,
    client: ApiClient,
    activity: ActivityLog,
}

impl Session {
    fn open() -> Self {
        let config = config::load();
        let store = StateStore::load(store::open_default(&config), &config.backend);
        let client = ApiClient::connect(&store.settings().backend_url);
        let activity = ActivityLog::from_config(config.logging.activity_log);
        Self {
            config,
            store,
            client,
            activity,
        }
    }

    /// Run `f` and record it under `action` in the activity log.
    fn run<T>(
        &self,
        action: &str,
        f: impl FnOnce(&ApiClient) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let started = Instant::now();
        let result = f(&self.client);
        let error = result.as_ref().err().map(ToString::to_string);
        self.activity
            .record(action, error.as_deref(), started.elapsed());
        result
    }
}

// ---------------------------------------------------------------------------
// codeagent serve
// ---------------------------------------------------------------------------

/// Run the dashboard until interrupted.
pub fn run_serve(addr: Option<String>, no_browser: bool) -> Result<()> {
    let mut cfg = config::load();
    if let Some(addr) = addr {
        cfg.server.addr = addr;
    }
    if no_browser {
        cfg.server.open_browser = false;
    }
    crate::web::serve(&cfg)
}

// ---------------------------------------------------------------------------
// codeagent health
// ---------------------------------------------------------------------------

/// Check config files, the settings store, the activity log and the backend.
pub fn run_health() -> Result<()> {
    let session = Session::open();

    println!("{}", "codeagent Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.codeagent/config.toml found"
        } else {
            "not found (run `codeagent config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".codeagent.toml found"
        } else {
            "none (optional)"
        },
    );

    let store_path = session.config.storage.resolved_path();
    let store_exists = store_path.as_ref().is_some_and(|p| p.exists());
    print_health_item(
        "Settings store",
        store_exists,
        &match &store_path {
            Some(p) if store_exists => p.display().to_string(),
            Some(_) => "nothing saved yet".to_string(),
            None => "no home directory, using memory".to_string(),
        },
    );

    let settings = session.store.settings();
    print_health_item("Workspace", true, &settings.workspace_id);

    match session.run("health", |client| CheckHealth::new(client).execute(())) {
        Ok(report) => {
            let detail = if report.status.is_empty() {
                format!("online at {}", settings.backend_url)
            } else {
                format!("{} at {}", report.status, settings.backend_url)
            };
            print_health_item("Backend", true, &detail);
            for (service, status) in &report.services {
                print_health_item(&format!("  {service}"), is_healthy(status), status);
            }
        }
        Err(e) => {
            print_health_item(
                "Backend",
                false,
                &format!("offline at {} ({e})", settings.backend_url),
            );
        }
    }

    let entries = session.activity.read_all().len();
    print_health_item(
        "Activity log",
        session.activity.path().is_some(),
        &match session.activity.path() {
            Some(_) => format!("{} entries", format_number(entries)),
            None => "disabled".to_string(),
        },
    );

    Ok(())
}

fn is_healthy(status: &str) -> bool {
    matches!(
        status.to_ascii_lowercase().as_str(),
        "ok" | "up" | "healthy" | "online" | "connected" | "ready"
    )
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// codeagent ingest
// ---------------------------------------------------------------------------

/// Start background ingestion of a local repository.
pub fn run_ingest(path: &str) -> Result<()> {
    let mut session = Session::open();
    let input = IngestInput {
        repo_path: path.to_string(),
        workspace_id: session.store.settings().workspace_id.clone(),
    };

    let ack = session.run("ingest", |client| IngestCodebase::new(client).execute(input))?;

    session.store.set_repo_ingested(true)?;
    session.store.save_repo_path(path.trim())?;

    println!(
        "{} Ingestion started in background for {}",
        "✓".green().bold(),
        path.trim().bold()
    );
    if let Some(message) = ack.message.or(ack.status) {
        println!("  {}", message.dimmed());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// codeagent analyze
// ---------------------------------------------------------------------------

/// Run an analysis and cache it as the last result.
pub fn run_analyze(
    query: &str,
    analysis_type: Option<&str>,
    include_codebase: bool,
    format: OutputFormat,
) -> Result<()> {
    let analysis_type = match analysis_type {
        Some(raw) => parse_analysis_type(raw)?,
        None => AnalysisType::default(),
    };

    let mut session = Session::open();
    let input = AnalyzeInput {
        query: query.to_string(),
        analysis_type,
        include_codebase,
    };
    let result = session.run("analyze", |client| RunAnalysis::new(client).execute(input))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Table => print_analysis(&result),
    }

    session.store.save_analysis(result)?;
    Ok(())
}

fn parse_analysis_type(raw: &str) -> Result<AnalysisType> {
    match AnalysisType::parse(raw) {
        Some(kind) => Ok(kind),
        None => {
            let known: Vec<_> = AnalysisType::ALL.iter().map(|t| t.as_str()).collect();
            bail!("unknown analysis type '{raw}' (expected one of: {})", known.join(", "))
        }
    }
}

fn print_analysis(result: &AnalysisResult) {
    println!(
        "{} {}",
        "Analysis".bold().cyan(),
        format!("[{}]", result.analysis_type.label()).dimmed()
    );
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Query:".bold(), result.query);
    if let Some(ms) = result.execution_time_ms {
        println!("  {} {}ms", "Time: ".bold(), format_number(ms as usize));
    }
    println!();

    println!("{}", "Summary".bold().cyan());
    println!("{}", result.summary);
    println!();

    if !result.detailed_analysis.is_empty() {
        println!("{}", "Details".bold().cyan());
        println!("{}", result.detailed_analysis);
        println!();
    }

    if !result.suggested_actions.is_empty() {
        println!("{}", "Suggested Actions".bold().cyan());
        print_actions_table(&result.suggested_actions);
        println!();
        println!(
            "  {}",
            "Apply with `codeagent actions --select 1,2` or `--all`.".dimmed()
        );
    }

    if !result.follow_up_questions.is_empty() {
        println!();
        println!("{}", "Follow-up Questions".bold().cyan());
        for question in &result.follow_up_questions {
            println!("  {} {}", "·".dimmed(), question);
        }
    }
}

fn print_actions_table(actions: &[SuggestedAction]) {
    println!(
        "  {:>3} {:<10} {:<30} {:>5} Description",
        "#", "Type", "File", "Conf"
    );
    println!("  {}", "-".repeat(70));

    for (i, action) in actions.iter().enumerate() {
        let line = format!(
            "  {:>3} {:<10} {:<30} {:>4.0}% {}",
            i + 1,
            action.action_type.as_str(),
            truncate(&action.target_file, 30),
            action.confidence * 100.0,
            truncate(&action.description, 60),
        );

        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

// ---------------------------------------------------------------------------
// codeagent screenshot
// ---------------------------------------------------------------------------

/// Upload a screenshot for vision analysis.
pub fn run_screenshot(file: &Path, context: &str, format: OutputFormat) -> Result<()> {
    let mut session = Session::open();
    let input = ScreenshotInput {
        file: Some(file.to_path_buf()),
        context: context.to_string(),
    };
    let result = session.run("analyze-screenshot", |client| {
        AnalyzeScreenshot::new(client).execute(input)
    })?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Table => print_screenshot(&result),
    }

    session.store.save_screenshot(result)?;
    Ok(())
}

fn print_screenshot(result: &ScreenshotResult) {
    println!("{}", "Screenshot Analysis".bold().cyan());
    println!("{}", "=".repeat(60));

    match result.vision_text() {
        Some(text) => {
            println!("{}", "Extracted Text".bold());
            println!("{text}");
        }
        None => println!("{}", "No text extracted.".dimmed()),
    }

    if let Some(explanation) = result.explanation() {
        println!();
        println!("{}", "Explanation".bold());
        println!("{explanation}");
    }

    let components = result.components();
    if !components.is_empty() {
        println!();
        println!("{}", "Components".bold());
        println!("  {}", components.join(", "));
    }
}

// ---------------------------------------------------------------------------
// codeagent audio
// ---------------------------------------------------------------------------

/// Upload a recording for transcription.
pub fn run_audio(file: &Path, participants: &str, format: OutputFormat) -> Result<()> {
    let mut session = Session::open();
    let input = AudioInput {
        file: Some(file.to_path_buf()),
        participants: participants.to_string(),
    };
    let result = session.run("process-audio", |client| {
        TranscribeAudio::new(client).execute(input)
    })?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Table => print_audio(&result),
    }

    session.store.save_audio(result)?;
    Ok(())
}

fn print_audio(result: &AudioResult) {
    println!("{}", "Transcription".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "{}",
        result
            .transcription
            .as_deref()
            .unwrap_or("No transcription available")
    );

    if !result.action_items.is_empty() {
        println!();
        println!("{}", "Action Items".bold().cyan());
        for item in &result.action_items {
            let confidence = item
                .confidence
                .as_ref()
                .map(|c| format!(" ({})", value_text(c)))
                .unwrap_or_default();
            println!("  {} {}{}", "·".dimmed(), item.text, confidence.dimmed());
        }
    }
}

// ---------------------------------------------------------------------------
// codeagent actions
// ---------------------------------------------------------------------------

/// List the last analysis' suggested actions, or apply a selection of them.
///
/// `select` holds 1-based indices as printed by the listing.
pub fn run_actions(select: &[usize], all: bool) -> Result<()> {
    let session = Session::open();

    let Some(analysis) = &session.store.state().last_analysis else {
        println!(
            "{}",
            "No analysis yet. Run `codeagent analyze` first.".yellow()
        );
        return Ok(());
    };
    let suggested = &analysis.suggested_actions;
    if suggested.is_empty() {
        println!("{}", "The last analysis suggested no actions.".yellow());
        return Ok(());
    }

    if select.is_empty() && !all {
        println!("{}", "Suggested Actions".bold().cyan());
        print_actions_table(suggested);
        return Ok(());
    }

    let indices: Vec<usize> = if all {
        (0..suggested.len()).collect()
    } else {
        select.iter().filter_map(|i| i.checked_sub(1)).collect()
    };
    let chosen = select_actions(suggested, &indices);

    let report = session
        .run("apply-actions", |client| ApplyActions::new(client).execute(chosen))
        .map_err(|e| match e {
            ApiError::Validation(_) => anyhow::anyhow!(e),
            other => anyhow::anyhow!("Execution failed: {other}"),
        })?;

    println!("{} Actions executed successfully!", "✓".green().bold());
    for result in &report.results {
        println!("  {} {}", "·".dimmed(), truncate(&value_text(result), 100));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// codeagent history
// ---------------------------------------------------------------------------

/// List stored results, optionally filtered, or clear them all.
pub fn run_history(
    search: &str,
    kind: Option<&str>,
    clear: bool,
    format: OutputFormat,
) -> Result<()> {
    let session = Session::open();

    if clear {
        session
            .run("clear-history", |client| ClearHistory::new(client).execute(()))
            .map_err(|e| anyhow::anyhow!("Failed to clear history: {e}"))?;
        println!("{} History cleared!", "✓".green().bold());
        return Ok(());
    }

    let entries = session
        .run("history", |client| FetchHistory::new(client).execute(()))
        .map_err(|e| anyhow::anyhow!("Failed to load history: {e}"))?;
    let filter = HistoryFilter::new(search, kind.unwrap_or(ALL_TYPES));
    let visible = filter_entries(&entries, &filter);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
        return Ok(());
    }

    if visible.is_empty() {
        println!("{}", "No history found.".yellow());
        return Ok(());
    }

    println!("{}", "History".bold().cyan());
    println!("{}", "=".repeat(70));
    println!(
        "  {:<12} {:<14} {:<20} Query",
        "ID", "Type", "Timestamp"
    );
    println!("  {}", "-".repeat(68));
    for entry in &visible {
        println!(
            "  {:<12} {:<14} {:<20} {}",
            truncate(&entry.id, 12),
            entry.kind,
            truncate(entry.timestamp.as_deref().unwrap_or("-"), 20),
            truncate(&entry.query, 50),
        );
    }
    println!();
    println!(
        "  {}",
        format!("{} of {} entries", visible.len(), entries.len()).dimmed()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// codeagent settings show | set
// ---------------------------------------------------------------------------

pub fn run_settings_show() -> Result<()> {
    let session = Session::open();
    let settings = session.store.settings();
    println!("{}", "Settings".bold().cyan());
    println!("{}", "=".repeat(40));
    println!("  {} {}", "Backend URL: ".bold(), settings.backend_url);
    println!("  {} {}", "Workspace ID:".bold(), settings.workspace_id);

    let state = session.store.state();
    let repo = state.last_repo_path.as_deref().unwrap_or("-");
    println!(
        "  {} {} {}",
        "Repository:  ".bold(),
        repo,
        if state.repo_ingested {
            "(ingested)".green()
        } else {
            "(not ingested)".dimmed()
        }
    );
    Ok(())
}

/// Update the persisted backend URL and/or workspace id.
pub fn run_settings_set(backend_url: Option<&str>, workspace: Option<&str>) -> Result<()> {
    if backend_url.is_none() && workspace.is_none() {
        bail!("nothing to set: pass --backend-url and/or --workspace");
    }

    let mut session = Session::open();
    let current = session.store.settings().clone();
    let url = backend_url.unwrap_or(&current.backend_url).trim().to_string();
    let workspace = workspace.unwrap_or(&current.workspace_id).trim().to_string();
    session.store.update_settings(&url, &workspace)?;

    println!("{} Settings saved", "✓".green().bold());
    println!("  {} {}", "Backend URL: ".bold(), url);
    println!("  {} {}", "Workspace ID:".bold(), workspace);
    Ok(())
}

// ---------------------------------------------------------------------------
// codeagent panel
// ---------------------------------------------------------------------------

/// Emit the editor panel page.
///
/// The HTML goes to `out` when given. With `selection_file`, the
/// `setSelection` message for that file's contents is printed; otherwise
/// the HTML is printed when there is no `out`.
pub fn run_panel(selection_file: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let html = webview::panel_html(webview::DEFAULT_SCRIPT, &webview::generate_nonce(), "'self'")
        .context("failed to render editor panel")?;

    if let Some(out) = out {
        std::fs::write(out, &html)
            .with_context(|| format!("failed to write {}", out.display()))?;
        eprintln!("{} Panel written to {}", "✓".green().bold(), out.display());
    }

    match selection_file {
        Some(path) => {
            let code = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            println!("{}", PanelMessage::set_selection(code).to_json()?);
        }
        None if out.is_none() => print!("{html}"),
        None => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// codeagent activity
// ---------------------------------------------------------------------------

/// Show the most recent activity log entries.
pub fn run_activity(limit: usize) -> Result<()> {
    let Some(path) = activity::activity_log_path() else {
        bail!("cannot resolve home directory for the activity log");
    };
    let entries = ActivityLog::at(path).read_recent(limit);

    if entries.is_empty() {
        println!(
            "{}",
            "No activity yet. Actions from the dashboard and CLI are logged here.".yellow()
        );
        return Ok(());
    }

    println!("{}", "Recent Activity".bold().cyan());
    println!("{}", "=".repeat(70));
    println!(
        "  {:<20} {:<20} {:>3} {:>9} Error",
        "Time", "Action", "OK", "Latency"
    );
    println!("  {}", "-".repeat(68));
    for entry in &entries {
        print_activity_entry(entry);
    }
    Ok(())
}

fn print_activity_entry(entry: &ActivityEntry) {
    let time = chrono::DateTime::parse_from_rfc3339(&entry.timestamp)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| truncate(&entry.timestamp, 20));
    let ok = if entry.success {
        "✓".green()
    } else {
        "✗".red()
    };
    println!(
        "  {:<20} {:<20} {:>3} {:>7}ms {}",
        time,
        truncate(&entry.action, 20),
        ok,
        format_number(entry.latency_ms as usize),
        entry.error.as_deref().unwrap_or("").dimmed(),
    );
}

// ---------------------------------------------------------------------------
// codeagent config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective codeagent Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.codeagent/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.codeagent/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".codeagent.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            ".codeagent.toml (not found)".dimmed()
        );
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "CODEAGENT_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.codeagent/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path: PathBuf = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Edit the file to change the backend, server or logging defaults.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
        assert_eq!(truncate("héllo wörld", 3), "hé…");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn test_analysis_type_parsing() {
        assert_eq!(parse_analysis_type("review").unwrap(), AnalysisType::Review);
        assert_eq!(
            parse_analysis_type("test-generate").unwrap(),
            AnalysisType::TestGenerate
        );
        let err = parse_analysis_type("summarize").unwrap_err().to_string();
        assert!(err.contains("explain, review, debug, refactor, test_generate"));
    }

    #[test]
    fn test_service_health_words() {
        assert!(is_healthy("OK"));
        assert!(is_healthy("connected"));
        assert!(!is_healthy("down"));
    }
}
