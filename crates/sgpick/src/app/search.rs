//! Search executor: runs the structural matcher and turns its output into a [`ResultSet`].

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;

use crate::domain::errors::SessionError;
use crate::domain::model::{Pattern, ResultSet, SearchResult};
use crate::infra::matcher::{MatchQuery, StructuralMatcher};

/// Outcome of one successful search call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    pub results: ResultSet,
    /// Lines dropped because they lacked a path or line field, one warning each.
    pub dropped: Vec<String>,
    /// Matcher diagnostics reported alongside a successful run (for example unreadable files).
    pub diagnostic: Option<String>,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Parse buffered result lines, keeping matcher order and dropping duplicates.
pub fn collect_results<I, S>(lines: I) -> SearchOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut outcome = SearchOutcome::default();
    for line in lines {
        let line = line.as_ref().trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        match SearchResult::parse(line) {
            Ok(result) => {
                outcome.results.insert(result);
            }
            Err(err) => {
                tracing::warn!(line, error = %err, "dropping malformed result line");
                outcome.dropped.push(line.to_owned());
            }
        }
    }
    outcome
}

pub struct SearchExecutor<M> {
    matcher: M,
    root: PathBuf,
    scratch_dir: Option<PathBuf>,
}

impl<M: StructuralMatcher> SearchExecutor<M> {
    pub fn new(matcher: M, root: impl Into<PathBuf>) -> Self {
        Self {
            matcher,
            root: root.into(),
            scratch_dir: None,
        }
    }

    /// Place scratch files in `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[cfg(test)]
    pub(crate) fn matcher(&self) -> &M {
        &self.matcher
    }

    /// Run `pattern` over the project, or over `scope` when given.
    ///
    /// Zero matches is an empty outcome, not a failure. A non-zero matcher exit with diagnostic
    /// text is a [`SessionError::SearchFailure`] carrying that text verbatim. The scratch file
    /// holding raw output is removed before this returns on every path.
    pub fn execute(
        &self,
        pattern: &Pattern,
        scope: Option<&Path>,
    ) -> Result<SearchOutcome, SessionError> {
        let scratch = self.scratch_file()?;
        let query = MatchQuery {
            pattern,
            root: &self.root,
            scope,
        };

        let status = {
            let mut writer = BufWriter::new(scratch.as_file());
            let status = self
                .matcher
                .run(&query, &mut writer)
                .map_err(|err| SessionError::SearchFailure {
                    diagnostic: format!("{err:#}"),
                })?;
            writer.flush().context("failed to flush scratch file")?;
            status
        };

        let diagnostic = Some(status.diagnostic).filter(|text| !text.trim().is_empty());
        if !status.success
            && let Some(diagnostic) = diagnostic.as_ref()
        {
            tracing::debug!(pattern = pattern.text(), "matcher reported failure");
            return Err(SessionError::SearchFailure {
                diagnostic: diagnostic.clone(),
            });
        }

        let reader = BufReader::new(scratch.reopen().context("failed to reopen scratch file")?);
        let lines = reader
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("failed to read scratch file")?;
        scratch.close().context("failed to remove scratch file")?;

        let mut outcome = collect_results(lines);
        outcome.diagnostic = diagnostic;
        tracing::info!(
            pattern = pattern.text(),
            matches = outcome.results.len(),
            dropped = outcome.dropped.len(),
            "search finished"
        );
        Ok(outcome)
    }

    fn scratch_file(&self) -> Result<NamedTempFile, SessionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("sgpick-").suffix(".out");
        let file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("failed to create scratch file")?;
        Ok(file)
    }
}
