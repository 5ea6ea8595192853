use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use codeagent::cli;

#[derive(Debug, Parser)]
#[command(name = "codeagent")]
#[command(about = "Client for the code-analysis backend: dashboard, CLI and editor panel")]
#[command(version)]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the local dashboard
    Serve {
        /// Listen address (default from `server.addr`)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open the dashboard in a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Check config, settings store and backend reachability
    Health,
    /// Start background ingestion of a local repository
    Ingest {
        /// Path to the repository on this machine
        path: String,
    },
    /// Ask the backend to analyze the ingested codebase
    Analyze {
        /// The question or task
        #[arg(trailing_var_arg = true, required = true)]
        query: Vec<String>,
        /// explain (default), review, debug, refactor, test_generate
        #[arg(long = "type")]
        analysis_type: Option<String>,
        /// Do not include codebase context
        #[arg(long)]
        no_codebase: bool,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Analyze a screenshot
    Screenshot {
        file: PathBuf,
        /// What to look for
        #[arg(long, default_value = "")]
        context: String,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Transcribe a recording and extract action items
    Audio {
        file: PathBuf,
        /// Comma-separated participant names
        #[arg(long, default_value = "")]
        participants: String,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List or apply the last analysis' suggested actions
    Actions {
        /// Numbers of the actions to apply, e.g. `1,3`
        #[arg(long, value_delimiter = ',', conflicts_with = "all")]
        select: Vec<usize>,
        /// Apply every suggested action
        #[arg(long)]
        all: bool,
    },
    /// List, filter or clear stored results
    History {
        /// Case-insensitive substring of the query
        #[arg(long, default_value = "")]
        search: String,
        /// code_analysis, screenshot, audio or all
        #[arg(long = "type")]
        kind: Option<String>,
        /// Delete all history on the backend
        #[arg(long)]
        clear: bool,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show or change the saved backend URL and workspace
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Emit the editor panel page
    Panel {
        /// Print the setSelection message for this file's contents
        #[arg(long)]
        selection_file: Option<PathBuf>,
        /// Write the panel HTML to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show recent activity log entries
    Activity {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// Print the saved settings
    Show,
    /// Save new settings
    Set {
        #[arg(long)]
        backend_url: Option<String>,
        #[arg(long)]
        workspace: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `health.interval_secs 30`
    Set { key: String, value: String },
    /// Restore the default config file
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve { addr, no_browser } => cli::run_serve(addr, no_browser),
        Commands::Health => cli::run_health(),
        Commands::Ingest { path } => cli::run_ingest(&path),
        Commands::Analyze {
            query,
            analysis_type,
            no_codebase,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_analyze(&query.join(" "), analysis_type.as_deref(), !no_codebase, fmt)
        }
        Commands::Screenshot {
            file,
            context,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_screenshot(&file, &context, fmt)
        }
        Commands::Audio {
            file,
            participants,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_audio(&file, &participants, fmt)
        }
        Commands::Actions { select, all } => cli::run_actions(&select, all),
        Commands::History {
            search,
            kind,
            clear,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(&search, kind.as_deref(), clear, fmt)
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => cli::run_settings_show(),
            SettingsAction::Set {
                backend_url,
                workspace,
            } => cli::run_settings_set(backend_url.as_deref(), workspace.as_deref()),
        },
        Commands::Panel {
            selection_file,
            out,
        } => cli::run_panel(selection_file.as_deref(), out.as_deref()),
        Commands::Activity { limit } => cli::run_activity(limit),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
