//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::model::Language;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".sgpick/config.toml";

/// Layered configuration loaded from defaults, user, workspace, explicit file, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub tools: Tools,
    #[serde(default)]
    pub selector: Selector,
    #[serde(default)]
    pub search: Search,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub context_lines: Option<usize>,
    #[serde(default)]
    pub preview_lines: Option<usize>,
    #[serde(default)]
    pub editor: Option<String>,
    #[serde(default)]
    pub color: Option<bool>,
}

impl Defaults {
    const LANGUAGE: Language = Language::Python;

    /// Configured language; unknown identifiers fall back to Python.
    pub fn language(&self) -> Language {
        match self.language.as_deref().map(str::parse::<Language>) {
            Some(Ok(language)) => language,
            Some(Err(err)) => {
                tracing::warn!(error = %err, fallback = %Self::LANGUAGE, "ignoring configured language");
                Self::LANGUAGE
            }
            None => Self::LANGUAGE,
        }
    }

    pub fn theme(&self) -> &str {
        self.theme.as_deref().unwrap_or("base16-ocean.dark")
    }

    pub fn context_lines(&self) -> usize {
        self.context_lines.unwrap_or(5)
    }

    pub fn preview_lines(&self) -> usize {
        self.preview_lines.unwrap_or(20)
    }

    pub fn editor(&self) -> Option<&str> {
        self.editor.as_deref().filter(|editor| !editor.trim().is_empty())
    }

    pub fn color(&self) -> bool {
        self.color.unwrap_or(true)
    }
}

/// Program names of the external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Tools {
    #[serde(default)]
    pub matcher: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub text_search: Option<String>,
}

impl Tools {
    pub fn matcher(&self) -> &str {
        self.matcher.as_deref().unwrap_or("ast-grep")
    }

    pub fn selector(&self) -> &str {
        self.selector.as_deref().unwrap_or("fzf")
    }

    pub fn text_search(&self) -> &str {
        self.text_search.as_deref().unwrap_or("rg")
    }

    /// Every program a session cannot start without.
    pub fn required(&self) -> Vec<String> {
        vec![
            self.matcher().to_owned(),
            self.selector().to_owned(),
            self.text_search().to_owned(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Selector {
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub preview_window: Option<String>,
    #[serde(default)]
    pub bindings: Option<Vec<String>>,
    #[serde(default)]
    pub preview_command: Option<String>,
}

impl Selector {
    pub fn height(&self) -> &str {
        self.height.as_deref().unwrap_or("80%")
    }

    pub fn preview_window(&self) -> &str {
        self.preview_window.as_deref().unwrap_or("right:60%:wrap")
    }

    pub fn bindings(&self) -> &[String] {
        self.bindings.as_deref().unwrap_or_default()
    }

    pub fn preview_command(&self) -> Option<&str> {
        self.preview_command
            .as_deref()
            .filter(|command| !command.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Search {
    #[serde(default)]
    pub globs: Vec<String>,
}

/// Presentation settings resolved once and handed to each component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub color: bool,
    pub theme: String,
    pub context_lines: usize,
    pub preview_lines: usize,
}

impl Default for Presentation {
    fn default() -> Self {
        Config::default().presentation()
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    language: Option<String>,
    editor: Option<String>,
    theme: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            language: env::var("SGPICK_LANGUAGE").ok(),
            editor: env::var("SGPICK_EDITOR").ok(),
            theme: env::var("SGPICK_THEME").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(language: &str, editor: &str) -> Self {
        Self {
            language: Some(language.to_owned()),
            editor: Some(editor.to_owned()),
            theme: None,
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, an optional
    /// explicit file, and env overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        if let Some(path) = explicit
            && !path.exists()
        {
            anyhow::bail!("config file not found: {}", path.display());
        }
        Self::load_with_layers(global, workspace, explicit.map(Path::to_path_buf), env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        explicit: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        for path in [global, workspace, explicit].into_iter().flatten() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config layer");
                layers.push(Self::from_file(&path)?);
            }
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            tools: merge_tools(self.tools, other.tools),
            selector: merge_selector(self.selector, other.selector),
            search: merge_search(self.search, other.search),
        }
    }

    /// Snapshot of the settings that shape console and preview output.
    pub fn presentation(&self) -> Presentation {
        Presentation {
            color: self.defaults.color(),
            theme: self.defaults.theme().to_owned(),
            context_lines: self.defaults.context_lines(),
            preview_lines: self.defaults.preview_lines(),
        }
    }
}

fn merge_defaults(mut base: Defaults, overlay: Defaults) -> Defaults {
    if overlay.language.is_some() {
        base.language = overlay.language;
    }
    if overlay.theme.is_some() {
        base.theme = overlay.theme;
    }
    if overlay.context_lines.is_some() {
        base.context_lines = overlay.context_lines;
    }
    if overlay.preview_lines.is_some() {
        base.preview_lines = overlay.preview_lines;
    }
    if overlay.editor.is_some() {
        base.editor = overlay.editor;
    }
    if overlay.color.is_some() {
        base.color = overlay.color;
    }
    base
}

fn merge_tools(base: Tools, overlay: Tools) -> Tools {
    Tools {
        matcher: overlay.matcher.or(base.matcher),
        selector: overlay.selector.or(base.selector),
        text_search: overlay.text_search.or(base.text_search),
    }
}

fn merge_selector(base: Selector, overlay: Selector) -> Selector {
    let bindings = match (base.bindings, overlay.bindings) {
        (Some(mut base), Some(overlay)) => {
            for binding in overlay {
                if !base.contains(&binding) {
                    base.push(binding);
                }
            }
            Some(base)
        }
        (base, overlay) => overlay.or(base),
    };

    Selector {
        height: overlay.height.or(base.height),
        preview_window: overlay.preview_window.or(base.preview_window),
        bindings,
        preview_command: overlay.preview_command.or(base.preview_command),
    }
}

fn merge_search(base: Search, overlay: Search) -> Search {
    let mut globs: BTreeSet<String> = base.globs.into_iter().collect();
    globs.extend(overlay.globs);
    Search {
        globs: globs.into_iter().collect(),
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("sgpick/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| candidate.join(".git").exists())
        .map(Path::to_path_buf)
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(language) = env.language {
        config.defaults.language = Some(language);
    }
    if let Some(editor) = env.editor {
        config.defaults.editor = Some(editor);
    }
    if let Some(theme) = env.theme {
        config.defaults.theme = Some(theme);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.defaults.language(), Language::Python);
        assert_eq!(config.defaults.context_lines(), 5);
        assert_eq!(config.tools.required(), vec!["ast-grep", "fzf", "rg"]);
        assert!(
            config
                .selector
                .bindings()
                .contains(&"ctrl-/:toggle-preview".to_owned())
        );
    }

    #[test]
    fn merge_global_workspace_and_explicit() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[defaults]
language = "rs"
context_lines = 8
[search]
globs = ["!vendor/**"]
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".sgpick"))?;
        fs::write(
            workspace_dir.join(".sgpick/config.toml"),
            r#"
[tools]
matcher = "sg"
[selector]
bindings = ["ctrl-y:execute-silent(echo {1})"]
[search]
globs = ["!target/**"]
"#,
        )?;

        let explicit = temp.path().join("extra.toml");
        fs::write(&explicit, "[defaults]\ncontext_lines = 2\n")?;

        let config = Config::load_with_layers(
            Some(global),
            Some(workspace_dir.join(".sgpick/config.toml")),
            Some(explicit),
            EnvOverrides::default(),
        )?;

        assert_eq!(config.defaults.language(), Language::Rust);
        assert_eq!(config.defaults.context_lines(), 2);
        assert_eq!(config.tools.matcher(), "sg");
        assert_eq!(config.tools.selector(), "fzf");
        assert!(config.search.globs.contains(&"!vendor/**".into()));
        assert!(config.search.globs.contains(&"!target/**".into()));
        let bindings = config.selector.bindings();
        assert!(bindings.contains(&"ctrl-/:toggle-preview".to_owned()));
        assert!(bindings.contains(&"ctrl-y:execute-silent(echo {1})".to_owned()));
        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("go", "hx");
        let config = Config::load_with_layers(None, None, None, overrides)?;
        assert_eq!(config.defaults.language(), Language::Go);
        assert_eq!(config.defaults.editor(), Some("hx"));
        Ok(())
    }

    #[test]
    fn unknown_language_falls_back() -> Result<()> {
        let overrides = EnvOverrides::for_tests("cobol", "vi");
        let config = Config::load_with_layers(None, None, None, overrides)?;
        assert_eq!(config.defaults.language(), Language::Python);
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

    #[test]
    fn repo_root_is_nearest_git_ancestor() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested)?;
        fs::create_dir_all(temp.path().join("a/.git"))?;
        assert_eq!(find_repo_root(&nested), Some(temp.path().join("a")));
        Ok(())
    }
}
