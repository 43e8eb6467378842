//! Structural matcher adapter around `ast-grep`.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::domain::model::{FIELD_DELIMITER, Pattern};

/// What to search for and where.
#[derive(Debug, Clone, Copy)]
pub struct MatchQuery<'a> {
    pub pattern: &'a Pattern,
    /// Directory the matcher runs in; results are relative to it.
    pub root: &'a Path,
    /// Restrict the search to one file or directory.
    pub scope: Option<&'a Path>,
}

/// Exit information of one matcher run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatcherStatus {
    pub success: bool,
    pub diagnostic: String,
}

/// Runs a structural search, writing one delimited result line per match into `sink`.
pub trait StructuralMatcher {
    fn run(&self, query: &MatchQuery<'_>, sink: &mut dyn Write) -> Result<MatcherStatus>;
}

impl<M: StructuralMatcher + ?Sized> StructuralMatcher for &M {
    fn run(&self, query: &MatchQuery<'_>, sink: &mut dyn Write) -> Result<MatcherStatus> {
        (**self).run(query, sink)
    }
}

#[derive(Debug, Clone)]
pub struct AstGrep {
    program: String,
    globs: Vec<String>,
}

impl AstGrep {
    pub fn new(program: impl Into<String>, globs: Vec<String>) -> Self {
        Self {
            program: program.into(),
            globs,
        }
    }

    fn command(&self, query: &MatchQuery<'_>) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("run")
            .arg("--pattern")
            .arg(query.pattern.text())
            .arg("--lang")
            .arg(query.pattern.language().matcher_id())
            .arg("--json=stream");
        for glob in &self.globs {
            command.arg("--globs").arg(glob);
        }
        if let Some(scope) = query.scope {
            command.arg(scope);
        }
        command.current_dir(query.root);
        command
    }
}

impl StructuralMatcher for AstGrep {
    fn run(&self, query: &MatchQuery<'_>, sink: &mut dyn Write) -> Result<MatcherStatus> {
        let mut diagnostics = tempfile::tempfile().context("failed to create diagnostics buffer")?;
        let stderr = diagnostics
            .try_clone()
            .context("failed to share diagnostics buffer")?;

        let mut child = self
            .command(query)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::from(stderr))
            .spawn()
            .with_context(|| format!("failed to spawn matcher: {}", self.program))?;

        tracing::debug!(pattern = query.pattern.text(), program = %self.program, "matcher started");

        let streamed = match child.stdout.take() {
            Some(stdout) => stream_records(stdout, sink),
            None => Err(anyhow!("matcher stdout unavailable")),
        };
        if let Err(err) = streamed {
            if let Err(kill) = child.kill() {
                tracing::debug!(error = %kill, "matcher already exited");
            }
            if let Err(wait) = child.wait() {
                tracing::debug!(error = %wait, "failed to reap matcher");
            }
            return Err(err);
        }

        let status = child.wait().context("matcher did not exit cleanly")?;
        Ok(MatcherStatus {
            success: status.success(),
            diagnostic: read_diagnostics(&mut diagnostics)?,
        })
    }
}

/// Copy matcher stdout into `sink` line by line. Invalid UTF-8 is replaced, not rejected.
fn stream_records(stdout: impl Read, sink: &mut dyn Write) -> Result<()> {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .context("failed to read matcher output")?;
        if read == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        writeln!(sink, "{}", to_result_line(line)).context("failed to buffer match")?;
    }
}

fn read_diagnostics(file: &mut File) -> Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut raw = Vec::new();
    file.read_to_end(&mut raw)?;
    Ok(String::from_utf8_lossy(&raw).trim_end().to_owned())
}

#[derive(Debug, Deserialize)]
struct JsonMatch {
    file: String,
    #[serde(default)]
    lines: String,
    range: JsonRange,
}

#[derive(Debug, Deserialize)]
struct JsonRange {
    start: JsonPosition,
}

#[derive(Debug, Deserialize)]
struct JsonPosition {
    line: usize,
    column: usize,
}

/// Convert one `--json=stream` record into `path:line:column:snippet`.
/// Records that do not decode are passed through untouched.
fn to_result_line(record: &str) -> String {
    match serde_json::from_str::<JsonMatch>(record) {
        Ok(found) => {
            let snippet = found.lines.lines().next().unwrap_or_default().trim();
            format!(
                "{file}{d}{line}{d}{column}{d}{snippet}",
                file = found.file,
                line = found.range.start.line + 1,
                column = found.range.start.column + 1,
                d = FIELD_DELIMITER,
            )
        }
        Err(err) => {
            tracing::debug!(error = %err, "matcher record is not JSON");
            record.to_owned()
        }
    }
}
