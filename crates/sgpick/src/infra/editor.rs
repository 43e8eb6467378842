//! Launching the user's editor at a file location.

use std::env;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow};

/// Opens a file positioned at a one-based line and waits for the editor to exit.
pub trait EditorLauncher {
    fn open(&self, path: &Path, line: usize) -> Result<()>;
}

impl<E: EditorLauncher + ?Sized> EditorLauncher for &E {
    fn open(&self, path: &Path, line: usize) -> Result<()> {
        (**self).open(path, line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEditor {
    program: String,
    args: Vec<String>,
}

impl SystemEditor {
    /// Resolve from an explicit command, then `$VISUAL`, then `$EDITOR`, then `vi`.
    pub fn resolve(configured: Option<&str>) -> Self {
        let command = configured
            .map(str::to_owned)
            .or_else(|| env::var("VISUAL").ok())
            .or_else(|| env::var("EDITOR").ok())
            .filter(|command| !command.trim().is_empty())
            .unwrap_or_else(|| "vi".to_owned());
        Self::from_command(&command)
    }

    /// Split a command such as `code -w` into program and leading arguments.
    pub fn from_command(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_owned);
        let program = parts.next().unwrap_or_else(|| "vi".to_owned());
        Self {
            program,
            args: parts.collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments that place the cursor on `line`, following each editor's convention.
    fn location_args(&self, path: &Path, line: usize) -> Vec<String> {
        let binary = Path::new(&self.program)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.program);
        let location = format!("{}:{line}", path.display());

        match binary {
            "code" | "codium" | "code-insiders" => vec!["--goto".into(), location],
            "subl" | "hx" | "helix" | "zed" | "micro" => vec![location],
            _ => vec![format!("+{line}"), path.display().to_string()],
        }
    }
}

impl EditorLauncher for SystemEditor {
    fn open(&self, path: &Path, line: usize) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .args(self.location_args(path, line))
            .status()
            .with_context(|| format!("failed to launch editor: {}", self.program))?;
        if status.success() {
            Ok(())
        } else {
            Err(anyhow!("editor {} exited with status {status}", self.program))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vim_style_editors_take_plus_line() {
        let editor = SystemEditor::from_command("nvim");
        assert_eq!(
            editor.location_args(Path::new("src/main.rs"), 42),
            vec!["+42", "src/main.rs"]
        );
    }

    #[test]
    fn vscode_uses_goto() {
        let editor = SystemEditor::from_command("/usr/local/bin/code --wait");
        assert_eq!(editor.program(), "/usr/local/bin/code");
        assert_eq!(editor.args, vec!["--wait"]);
        assert_eq!(
            editor.location_args(Path::new("a.py"), 3),
            vec!["--goto", "a.py:3"]
        );
    }

    #[test]
    fn helix_takes_path_with_line_suffix() {
        let editor = SystemEditor::from_command("hx");
        assert_eq!(editor.location_args(Path::new("lib.zig"), 7), vec!["lib.zig:7"]);
    }

    #[test]
    fn configured_command_wins() {
        let editor = SystemEditor::resolve(Some("micro"));
        assert_eq!(editor.program(), "micro");
    }
}
