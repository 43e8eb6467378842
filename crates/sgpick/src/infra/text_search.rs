//! Literal reference search through `rg`.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result, anyhow};

use crate::domain::model::Language;

/// Finds literal occurrences of a word, one `path:line:column:text` line per hit.
pub trait TextSearcher {
    fn search(&self, literal: &str, language: Language, root: &Path) -> Result<Vec<String>>;
}

impl<T: TextSearcher + ?Sized> TextSearcher for &T {
    fn search(&self, literal: &str, language: Language, root: &Path) -> Result<Vec<String>> {
        (**self).search(literal, language, root)
    }
}

#[derive(Debug, Clone)]
pub struct Ripgrep {
    program: String,
}

impl Ripgrep {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, literal: &str, language: Language, root: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args([
                "--vimgrep",
                "--fixed-strings",
                "--word-regexp",
                "--color",
                "never",
                "--type",
                language.text_search_type(),
                "--",
                literal,
            ])
            .current_dir(root);
        command
    }

    /// Exit 1 means no lines matched. Exit 2 with hits means some files could not be read;
    /// the hits are kept and the error is logged.
    fn hits(&self, output: &Output) -> Result<Vec<String>> {
        let hits: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect();
        if output.status.success() {
            return Ok(hits);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        match output.status.code() {
            Some(1) => Ok(Vec::new()),
            Some(2) if !hits.is_empty() => {
                tracing::warn!(
                    program = %self.program,
                    diagnostic = %stderr.trim_end(),
                    hits = hits.len(),
                    "reference search was incomplete"
                );
                Ok(hits)
            }
            _ => Err(anyhow!("{} failed: {}", self.program, stderr.trim_end())),
        }
    }
}

impl TextSearcher for Ripgrep {
    fn search(&self, literal: &str, language: Language, root: &Path) -> Result<Vec<String>> {
        let output = self
            .command(literal, language, root)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to execute {} for '{literal}'", self.program))?;

        self.hits(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_searches_whole_words_of_one_type() {
        let rg = Ripgrep::new("rg");
        let command = rg.command("-unwrap", Language::Rust, Path::new("/repo"));
        let args: Vec<_> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--vimgrep",
                "--fixed-strings",
                "--word-regexp",
                "--color",
                "never",
                "--type",
                "rust",
                "--",
                "-unwrap",
            ]
        );
        assert_eq!(command.get_current_dir(), Some(Path::new("/repo")));
    }

    #[cfg(unix)]
    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        use std::os::unix::process::ExitStatusExt;
        Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_files_keep_found_hits() {
        let rg = Ripgrep::new("rg");
        let found = rg
            .hits(&output(2, "src/a.rs:3:5:unwrap\n", "src/secret.rs: Permission denied\n"))
            .unwrap();
        assert_eq!(found, vec!["src/a.rs:3:5:unwrap"]);
    }

    #[cfg(unix)]
    #[test]
    fn exit_codes_without_hits() {
        let rg = Ripgrep::new("rg");
        assert!(rg.hits(&output(1, "", "")).unwrap().is_empty());
        let err = rg.hits(&output(2, "", "regex parse error\n")).unwrap_err();
        assert_eq!(err.to_string(), "rg failed: regex parse error");
    }
}
