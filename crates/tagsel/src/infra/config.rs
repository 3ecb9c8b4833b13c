//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".tagsel/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub select: Select,
    #[serde(default)]
    pub lookup: Lookup,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub ui: Ui,
}

/// Options steering the selection session.
///
/// Fields are optional so a layer only overrides what it spells out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Select {
    #[serde(default)]
    no_select_for_one_match: Option<bool>,
    #[serde(default)]
    kill_artifact_buffers: Option<bool>,
    #[serde(default)]
    go_if_unambiguous: Option<bool>,
    #[serde(default)]
    highlight_after_jump: Option<bool>,
    #[serde(default)]
    highlight_duration: Option<f64>,
    #[serde(default)]
    use_short_name_completion: Option<bool>,
}

impl Select {
    fn default_highlight_duration() -> f64 {
        0.5
    }

    /// Jump straight to a lone match instead of presenting a list.
    pub fn no_select_for_one_match(&self) -> bool {
        self.no_select_for_one_match.unwrap_or(true)
    }

    /// Close sources that were opened only while probing.
    pub fn kill_artifact_buffers(&self) -> bool {
        self.kill_artifact_buffers.unwrap_or(true)
    }

    /// Skip the number prompt when a typed digit identifies exactly one tag.
    pub fn go_if_unambiguous(&self) -> bool {
        self.go_if_unambiguous.unwrap_or(false)
    }

    pub fn highlight_after_jump(&self) -> bool {
        self.highlight_after_jump.unwrap_or(true)
    }

    pub fn highlight_duration(&self) -> Duration {
        self.highlight_duration
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
            .unwrap_or_else(|| Duration::from_secs_f64(Self::default_highlight_duration()))
    }

    /// Consumed by hosts that offer identifier completion.
    pub fn use_short_name_completion(&self) -> bool {
        self.use_short_name_completion.unwrap_or(false)
    }

    pub fn set_no_select_for_one_match(&mut self, value: bool) {
        self.no_select_for_one_match = Some(value);
    }

    pub fn set_kill_artifact_buffers(&mut self, value: bool) {
        self.kill_artifact_buffers = Some(value);
    }

    pub fn set_go_if_unambiguous(&mut self, value: bool) {
        self.go_if_unambiguous = Some(value);
    }

    pub fn set_highlight_after_jump(&mut self, value: bool) {
        self.highlight_after_jump = Some(value);
    }
}

/// Which lookup primitive backs the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Grep,
    Table,
}

impl std::str::FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grep" => Ok(Backend::Grep),
            "table" => Ok(Backend::Table),
            other => anyhow::bail!("unknown lookup backend '{other}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lookup {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "Lookup::default_table")]
    pub table: PathBuf,
}

impl Lookup {
    fn default_table() -> PathBuf {
        PathBuf::from(".tagsel/tags.json")
    }
}

impl Default for Lookup {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            root: None,
            ignore_case: false,
            exclude: vec!["target/".into(), ".git/".into(), "*.min.js".into()],
            table: Self::default_table(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(default = "History::default_max_entries")]
    pub max_entries: usize,
}

impl History {
    fn default_max_entries() -> usize {
        64
    }
}

impl Default for History {
    fn default() -> Self {
        Self {
            max_entries: Self::default_max_entries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ui {
    #[serde(default = "Ui::default_theme")]
    pub theme: String,
    #[serde(default = "Ui::default_preview_lines")]
    pub preview_lines: usize,
}

impl Ui {
    fn default_theme() -> String {
        "base16-ocean.dark".into()
    }

    fn default_preview_lines() -> usize {
        40
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            theme: Self::default_theme(),
            preview_lines: Self::default_preview_lines(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    backend: Option<String>,
    no_select_for_one_match: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            backend: env::var("TAGSEL_BACKEND").ok(),
            no_select_for_one_match: env::var("TAGSEL_NO_SELECT_FOR_ONE_MATCH").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(backend: &str, no_select_for_one_match: &str) -> Self {
        Self {
            backend: Some(backend.to_owned()),
            no_select_for_one_match: Some(no_select_for_one_match.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            select: merge_select(self.select, other.select),
            lookup: merge_lookup(self.lookup, other.lookup),
            history: merge_history(self.history, other.history),
            ui: merge_ui(self.ui, other.ui),
        }
    }
}

fn merge_select(mut base: Select, overlay: Select) -> Select {
    if let Some(value) = overlay.no_select_for_one_match {
        base.no_select_for_one_match = Some(value);
    }
    if let Some(value) = overlay.kill_artifact_buffers {
        base.kill_artifact_buffers = Some(value);
    }
    if let Some(value) = overlay.go_if_unambiguous {
        base.go_if_unambiguous = Some(value);
    }
    if let Some(value) = overlay.highlight_after_jump {
        base.highlight_after_jump = Some(value);
    }
    if let Some(value) = overlay.highlight_duration {
        base.highlight_duration = Some(value);
    }
    if let Some(value) = overlay.use_short_name_completion {
        base.use_short_name_completion = Some(value);
    }
    base
}

fn merge_lookup(base: Lookup, overlay: Lookup) -> Lookup {
    let mut exclude: BTreeSet<String> = base.exclude.into_iter().collect();
    exclude.extend(overlay.exclude);

    Lookup {
        backend: if overlay.backend != Backend::default() {
            overlay.backend
        } else {
            base.backend
        },
        root: overlay.root.or(base.root),
        ignore_case: overlay.ignore_case || base.ignore_case,
        exclude: exclude.into_iter().collect(),
        table: if overlay.table != Lookup::default_table() {
            overlay.table
        } else {
            base.table
        },
    }
}

fn merge_history(base: History, overlay: History) -> History {
    History {
        max_entries: if overlay.max_entries != History::default_max_entries() {
            overlay.max_entries
        } else {
            base.max_entries
        },
    }
}

fn merge_ui(base: Ui, overlay: Ui) -> Ui {
    Ui {
        theme: if overlay.theme != Ui::default_theme() {
            overlay.theme
        } else {
            base.theme
        },
        preview_lines: if overlay.preview_lines != Ui::default_preview_lines() {
            overlay.preview_lines
        } else {
            base.preview_lines
        },
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("tagsel/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

/// Nearest ancestor of `start` holding a `.git` directory.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(backend) = env.backend {
        config.lookup.backend = backend.parse()?;
    }
    if let Some(raw) = env.no_select_for_one_match {
        let value = parse_flag(&raw)
            .with_context(|| format!("invalid TAGSEL_NO_SELECT_FOR_ONE_MATCH value '{raw}'"))?;
        config.select.set_no_select_for_one_match(value);
    }
    Ok(config)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.lookup.backend, Backend::Grep);
        assert!(config.select.no_select_for_one_match());
        assert!(config.select.kill_artifact_buffers());
        assert!(!config.select.go_if_unambiguous());
        assert_eq!(config.select.highlight_duration(), Duration::from_millis(500));
        assert!(config.lookup.exclude.contains(&"target/".into()));
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[select]
go_if_unambiguous = true
kill_artifact_buffers = false
[lookup]
exclude = ["vendor/"]
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".tagsel"))?;
        fs::create_dir_all(workspace_dir.join(".git"))?;
        fs::write(
            workspace_dir.join(".tagsel/config.toml"),
            r#"
[select]
kill_artifact_buffers = true
highlight_duration = 1.5
[lookup]
backend = "table"
"#,
        )?;

        let global_path = Some(global);
        let workspace_path = Some(workspace_dir.join(".tagsel/config.toml"));

        let config =
            Config::load_with_layers(global_path, workspace_path, EnvOverrides::default())?;

        assert!(config.select.go_if_unambiguous());
        assert!(config.select.kill_artifact_buffers());
        assert_eq!(config.select.highlight_duration(), Duration::from_millis(1500));
        assert_eq!(config.lookup.backend, Backend::Table);
        assert!(config.lookup.exclude.contains(&"vendor/".into()));
        assert!(config.lookup.exclude.contains(&"target/".into()));

        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("table", "off");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.lookup.backend, Backend::Table);
        assert!(!config.select.no_select_for_one_match());
        Ok(())
    }

    #[test]
    fn invalid_env_backend_is_rejected() {
        let overrides = EnvOverrides::for_tests("etags", "on");
        assert!(Config::load_with_layers(None, None, overrides).is_err());
    }

    #[test]
    fn negative_highlight_duration_falls_back() -> Result<()> {
        let config = Config::from_str("[select]\nhighlight_duration = -2.0\n")?;
        assert_eq!(config.select.highlight_duration(), Duration::from_millis(500));
        Ok(())
    }

    #[test]
    fn oversized_highlight_duration_falls_back() -> Result<()> {
        let config = Config::from_str("[select]\nhighlight_duration = 1e30\n")?;
        assert_eq!(config.select.highlight_duration(), Duration::from_millis(500));
        Ok(())
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }
}
