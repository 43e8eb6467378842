//! Fuzzy selector adapter around `fzf`.

use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

use crate::domain::model::FIELD_DELIMITER;
use crate::infra::config::Selector as SelectorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Single,
    Multi,
}

/// Everything the selector needs for one run.
#[derive(Debug, Clone)]
pub struct SelectorRequest<'a> {
    pub lines: Vec<&'a str>,
    /// Preview command; `{1}` is the path field and `{2}` the line field of the highlighted item.
    pub preview: &'a str,
    pub mode: SelectionMode,
    pub header: Option<&'a str>,
    /// Directory the selector and its preview command run in.
    pub cwd: Option<&'a Path>,
}

/// Presents lines for interactive choice. An empty return means the user cancelled.
pub trait FuzzySelector {
    fn select(&self, request: &SelectorRequest<'_>) -> Result<Vec<String>>;
}

impl<S: FuzzySelector + ?Sized> FuzzySelector for &S {
    fn select(&self, request: &SelectorRequest<'_>) -> Result<Vec<String>> {
        (**self).select(request)
    }
}

#[derive(Debug, Clone)]
pub struct Fzf {
    program: String,
    height: String,
    preview_window: String,
    bindings: Vec<String>,
}

impl Fzf {
    pub fn new(program: impl Into<String>, config: &SelectorConfig) -> Self {
        Self {
            program: program.into(),
            height: config.height().to_owned(),
            preview_window: config.preview_window().to_owned(),
            bindings: config.bindings().to_vec(),
        }
    }

    fn command(&self, request: &SelectorRequest<'_>) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("--ansi")
            .arg("--delimiter")
            .arg(FIELD_DELIMITER.to_string())
            .arg("--preview")
            .arg(request.preview)
            .arg("--preview-window")
            .arg(&self.preview_window)
            .arg("--height")
            .arg(&self.height);
        if request.mode == SelectionMode::Multi {
            command.arg("--multi");
        }
        if let Some(header) = request.header {
            command.arg("--header").arg(header);
        }
        for binding in &self.bindings {
            command.arg("--bind").arg(binding);
        }
        if let Some(cwd) = request.cwd {
            command.current_dir(cwd);
        }
        command
    }
}

impl FuzzySelector for Fzf {
    fn select(&self, request: &SelectorRequest<'_>) -> Result<Vec<String>> {
        let mut child = self
            .command(request)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn selector: {}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = request.lines.join("\n");
            match stdin.write_all(input.as_bytes()) {
                Ok(()) => {}
                // The user may pick before all input is consumed.
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
                Err(err) => return Err(err).context("failed to feed selector"),
            }
        }

        let output = child
            .wait_with_output()
            .context("selector did not exit cleanly")?;

        match output.status.code() {
            Some(0) => Ok(String::from_utf8_lossy(&output.stdout)
                .lines()
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect()),
            // 1: nothing matched the query, 130: aborted with Esc or Ctrl-C.
            Some(1) | Some(130) => Ok(Vec::new()),
            Some(code) => Err(anyhow!("{} exited with status {code}", self.program)),
            None => Ok(Vec::new()),
        }
    }
}
