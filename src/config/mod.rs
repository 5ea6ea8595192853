/// Configuration system for codeagent.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::ClientConfig::default()`]
/// 2. **User global config**: `~/.codeagent/config.toml`
/// 3. **Project local config**: `.codeagent.toml` in the current directory
/// 4. **Environment variables**: `CODEAGENT_*` overrides (highest precedence)
///
/// The persisted user settings (backend URL, workspace id) live in the
/// settings store, not here. `[backend]` only supplies the values used
/// before anything has been saved.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::ClientConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges defaults → global TOML → project TOML → env vars.
pub fn load() -> ClientConfig {
    let layers = [global_config_path(), project_config_path()]
        .into_iter()
        .filter_map(load_toml_file);
    let mut config = merge_layers(layers);

    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Malformed files, and files whose values do not fit the schema, are
/// ignored so a bad edit never keeps the dashboard from starting.
fn load_toml_file(path: Option<PathBuf>) -> Option<toml::Table> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let table: toml::Table = toml::from_str(&content).ok()?;
    toml::Value::Table(table.clone())
        .try_into::<ClientConfig>()
        .ok()?;
    Some(table)
}

/// Deep-merge the raw layers in order, then fill the gaps with defaults.
///
/// Merging happens on the TOML tables rather than on typed configs: a
/// later layer only overrides the keys it actually sets.
fn merge_layers(layers: impl IntoIterator<Item = toml::Table>) -> ClientConfig {
    let mut merged = toml::Table::new();
    for layer in layers {
        merge_table(&mut merged, layer);
    }
    toml::Value::Table(merged).try_into().unwrap_or_default()
}

fn merge_table(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_table(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".codeagent").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".codeagent.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `CODEAGENT_ADDR`: dashboard listen address
/// - `CODEAGENT_OPEN_BROWSER`: open the browser on `serve` (`1`/`true`/`yes`/`on`)
/// - `CODEAGENT_BACKEND_URL`: default backend URL
/// - `CODEAGENT_WORKSPACE`: default workspace id
/// - `CODEAGENT_HEALTH_INTERVAL_SECS`: health poll interval
/// - `CODEAGENT_STORAGE_PATH`: settings store file
/// - `CODEAGENT_ACTIVITY_LOG`: activity log on/off
fn apply_env_overrides(config: &mut ClientConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from any variable source. Split out so tests can feed a
/// map instead of mutating the process environment.
fn apply_overrides_from(config: &mut ClientConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("CODEAGENT_ADDR")
        && !val.is_empty()
    {
        config.server.addr = val;
    }
    if let Some(val) = var("CODEAGENT_OPEN_BROWSER") {
        config.server.open_browser = is_truthy(&val);
    }
    if let Some(val) = var("CODEAGENT_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.default_url = val;
    }
    if let Some(val) = var("CODEAGENT_WORKSPACE")
        && !val.is_empty()
    {
        config.backend.default_workspace = val;
    }
    if let Some(val) = var("CODEAGENT_HEALTH_INTERVAL_SECS")
        && let Ok(secs) = val.parse::<u64>()
        && secs > 0
    {
        config.health.interval_secs = secs;
    }
    if let Some(val) = var("CODEAGENT_STORAGE_PATH")
        && !val.is_empty()
    {
        config.storage.path = val;
    }
    if let Some(val) = var("CODEAGENT_ACTIVITY_LOG") {
        config.logging.activity_log = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.codeagent/config.toml`.
///
/// Returns an error if the file already exists and `force` is false.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.codeagent/ directory")?;
    }

    fs::write(&path, ClientConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `health.interval_secs`) in the global config.
///
/// Starts from the existing file, or from serialized defaults when there is
/// none, so the value type of the key is always known.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&ClientConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        None => anyhow::bail!("unknown config key '{key}'"),
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
    };

    table.insert((*leaf).to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn table(src: &str) -> toml::Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn project_layer_only_overrides_its_own_keys() {
        let global = table(
            r#"
[server]
addr = "0.0.0.0:9000"

[backend]
default_url = "http://team:8000"
"#,
        );
        let project = table(
            r#"
[health]
interval_secs = 5

[backend]
default_workspace = "repo"
"#,
        );

        let config = merge_layers([global, project]);
        assert_eq!(config.server.addr, "0.0.0.0:9000");
        assert_eq!(config.backend.default_url, "http://team:8000");
        assert_eq!(config.backend.default_workspace, "repo");
        assert_eq!(config.health.interval_secs, 5);
        assert!(config.server.open_browser);
    }

    #[test]
    fn later_layer_wins_on_the_same_key() {
        let config = merge_layers([
            table("[health]\ninterval_secs = 30\n"),
            table("[health]\ninterval_secs = 15\n"),
        ]);
        assert_eq!(config.health.interval_secs, 15);
    }

    #[test]
    fn no_layers_gives_defaults() {
        let config = merge_layers([]);
        assert_eq!(config.server.addr, schema::DEFAULT_SERVER_ADDR);
        assert_eq!(config.health.interval_secs, 10);
    }

    #[test]
    fn layer_with_wrong_types_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[health]\ninterval_secs = \"soon\"\n").unwrap();
        assert!(load_toml_file(Some(path.clone())).is_none());

        fs::write(&path, "[health]\ninterval_secs = 20\n").unwrap();
        assert!(load_toml_file(Some(path)).is_some());
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ClientConfig::default();
        apply_overrides_from(
            &mut config,
            vars(&[
                ("CODEAGENT_ADDR", "0.0.0.0:9999"),
                ("CODEAGENT_BACKEND_URL", "http://backend:8000"),
                ("CODEAGENT_WORKSPACE", "team"),
                ("CODEAGENT_HEALTH_INTERVAL_SECS", "30"),
                ("CODEAGENT_OPEN_BROWSER", "0"),
                ("CODEAGENT_ACTIVITY_LOG", "false"),
            ]),
        );

        assert_eq!(config.server.addr, "0.0.0.0:9999");
        assert_eq!(config.backend.default_url, "http://backend:8000");
        assert_eq!(config.backend.default_workspace, "team");
        assert_eq!(config.health.interval_secs, 30);
        assert!(!config.server.open_browser);
        assert!(!config.logging.activity_log);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = ClientConfig::default();
        apply_overrides_from(
            &mut config,
            vars(&[
                ("CODEAGENT_ADDR", ""),
                ("CODEAGENT_HEALTH_INTERVAL_SECS", "soon"),
            ]),
        );
        assert_eq!(config.server.addr, schema::DEFAULT_SERVER_ADDR);
        assert_eq!(config.health.interval_secs, 10);

        apply_overrides_from(&mut config, vars(&[("CODEAGENT_HEALTH_INTERVAL_SECS", "0")]));
        assert_eq!(config.health.interval_secs, 10);
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root: toml::Value = toml::from_str(
            r#"
[backend]
default_url = "http://localhost:8000"
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "backend.default_url", "http://x:1").unwrap();
        assert_eq!(
            root["backend"]["default_url"].as_str(),
            Some("http://x:1")
        );
    }

    #[test]
    fn set_toml_value_updates_bool_and_integer() {
        let mut root: toml::Value = toml::from_str(
            r#"
[server]
open_browser = true

[health]
interval_secs = 10
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "server.open_browser", "off").unwrap();
        set_toml_value(&mut root, "health.interval_secs", "25").unwrap();

        assert_eq!(root["server"]["open_browser"].as_bool(), Some(false));
        assert_eq!(root["health"]["interval_secs"].as_integer(), Some(25));
    }

    #[test]
    fn set_toml_value_rejects_bad_input() {
        let mut root: toml::Value = toml::from_str(
            r#"
[health]
interval_secs = 10
"#,
        )
        .unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "v").is_err());
        assert!(set_toml_value(&mut root, "health.unknown", "v").is_err());
        assert!(set_toml_value(&mut root, "health.interval_secs", "ten").is_err());
    }

    #[test]
    fn show_effective_config_parses_back() {
        let toml_str = show_effective_config().unwrap();
        let _: ClientConfig = toml::from_str(&toml_str).unwrap();
    }
}
