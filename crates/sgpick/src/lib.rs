pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;
pub mod ui;

use std::env;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::app::catalog::examples;
use crate::app::preview::PreviewService;
use crate::cli::Cli;
use crate::domain::model::Language;
use crate::infra::capability::{CapabilityChecker, Verified};
use crate::infra::config::{Config, Presentation};
use crate::ui::app::{Collaborators, Exit, SessionApp, SessionOptions};
use crate::ui::console::{Console, render_catalog};

pub fn init(verbosity: u8) {
    infra::logging::init(verbosity);
}

/// Run one invocation to completion and report how the process should exit.
pub fn run(cli: Cli) -> Exit {
    let mut console = Console::stderr(io::stderr().is_terminal());

    if let Some(shell) = cli.completions {
        Cli::write_completions(shell, &mut io::stdout());
        return Exit::Success;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            console.error(format!("{err:#}"));
            return Exit::Usage;
        }
    };
    let presentation = config.presentation();

    if let Some(target) = cli.preview_target() {
        return match target {
            Ok((file, line)) => render_preview(&file, line, &presentation),
            Err(err) => err.exit(),
        };
    }

    let language = cli.language.unwrap_or_else(|| config.defaults.language());
    if cli.examples {
        let color = presentation.color && io::stdout().is_terminal();
        print!("{}", render_catalog(language.name(), examples(language), color));
        return Exit::Success;
    }

    let verified = match CapabilityChecker::new().verify(&config.tools.required()) {
        Ok(verified) => verified,
        Err(err) => {
            console.error(err);
            console.info("Install the missing tools and make sure they are on PATH.");
            return Exit::MissingCapability;
        }
    };

    start_session(&cli, &config, &presentation, language, verified).unwrap_or_else(|err| {
        console.error(format!("{err:#}"));
        Exit::SearchFailed
    })
}

fn start_session(
    cli: &Cli,
    config: &Config,
    presentation: &Presentation,
    language: Language,
    verified: Verified,
) -> Result<Exit> {
    let cwd = env::current_dir().context("failed to read working directory")?;
    let root = infra::git::project_root(&cwd);
    let scope = match cli.path.as_deref() {
        Some(path) => resolve_scope(&cwd, &root, path)?,
        None => None,
    };
    let preview_command = config
        .selector
        .preview_command()
        .map(str::to_owned)
        .unwrap_or_else(default_preview_command);
    tracing::info!(root = %root.display(), language = %language, "starting session");

    let mut app = SessionApp::new(
        verified,
        SessionOptions {
            language,
            root,
            scope,
            preview_command,
        },
        presentation,
        Collaborators::from_config(config),
        Console::stderr(presentation.color && io::stderr().is_terminal()),
        ui::prompt::for_stdin(),
    );

    if cli.multi {
        let end = app.run_multi(&cli.patterns)?;
        let mut stdout = io::stdout().lock();
        for line in &end.selected {
            writeln!(stdout, "{line}").context("failed to write selection")?;
        }
        Ok(end.exit)
    } else {
        app.run(cli.patterns.first().map(String::as_str))
    }
}

fn render_preview(file: &Path, line: usize, presentation: &Presentation) -> Exit {
    let service = PreviewService::new(presentation);
    match service.context(file, line, presentation.preview_lines) {
        Ok(window) => {
            print!("{}", window.render(presentation.color));
            Exit::Success
        }
        Err(err) => {
            println!("{err:#}");
            Exit::Usage
        }
    }
}

/// Express a user-supplied search path relative to the project root. `None` means the whole project.
fn resolve_scope(cwd: &Path, root: &Path, path: &Path) -> Result<Option<PathBuf>> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    if !absolute.exists() {
        return Err(anyhow!("search path not found: {}", path.display()));
    }
    match absolute.strip_prefix(root) {
        Ok(relative) if relative.as_os_str().is_empty() => Ok(None),
        Ok(relative) => Ok(Some(relative.to_path_buf())),
        Err(_) => Ok(Some(absolute)),
    }
}

/// `<this executable> --preview {1} {2}`, quoted for the shell the selector runs it in.
fn default_preview_command() -> String {
    let program = env::current_exe()
        .map(|path| shell_quote(&path.to_string_lossy()))
        .unwrap_or_else(|_| "sgpick".to_owned());
    format!("{program} --preview {{1}} {{2}}")
}

fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scope_is_relative_to_root() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("src"))?;
        let root = dir.path();
        assert_eq!(
            resolve_scope(root, root, Path::new("src"))?,
            Some(PathBuf::from("src"))
        );
        assert_eq!(resolve_scope(root, root, root)?, None);
        assert!(resolve_scope(root, root, Path::new("missing")).is_err());
        Ok(())
    }

    #[test]
    fn preview_command_quotes_program() {
        assert_eq!(shell_quote("/opt/my tools/sgpick"), "'/opt/my tools/sgpick'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert!(default_preview_command().ends_with(" --preview {1} {2}"));
    }
}
