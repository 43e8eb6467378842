//! Action dispatcher: performs the follow-up chosen for a selected hit.

use std::path::{Path, PathBuf};

use crate::app::preview::{ContextWindow, PreviewService};
use crate::app::search::{SearchExecutor, SearchOutcome, collect_results};
use crate::domain::errors::{DomainError, SessionError};
use crate::domain::model::{ActionChoice, Pattern, SearchResult};
use crate::domain::pattern::extract_identifier;
use crate::infra::clipboard::ClipboardSink;
use crate::infra::editor::EditorLauncher;
use crate::infra::matcher::StructuralMatcher;
use crate::infra::text_search::TextSearcher;

/// Where the menu goes after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuStep {
    /// Show the action menu again for the same hit.
    Stay,
    /// Leave the menu and go back to the top-level prompt.
    ReturnToTop,
    /// Terminate the session.
    EndSession,
}

/// What an action produced, for the caller to render.
#[derive(Debug)]
pub enum ActionOutcome {
    Opened { location: String },
    Context(ContextWindow),
    FileMatches { path: PathBuf, outcome: SearchOutcome },
    Copied { path: PathBuf },
    CopyFailed { path: PathBuf, reason: String },
    References { identifier: String, outcome: SearchOutcome },
    ReferencesUnavailable(DomainError),
    Exit,
}

impl ActionOutcome {
    pub fn next_step(&self) -> MenuStep {
        match self {
            ActionOutcome::Opened { .. } => MenuStep::ReturnToTop,
            ActionOutcome::Exit => MenuStep::EndSession,
            _ => MenuStep::Stay,
        }
    }
}

/// External collaborators the actions hand work to.
pub struct ActionTools<'a> {
    pub editor: &'a dyn EditorLauncher,
    pub clipboard: &'a dyn ClipboardSink,
    pub references: &'a dyn TextSearcher,
}

pub struct ActionDispatcher<'a, M> {
    executor: &'a SearchExecutor<M>,
    preview: &'a PreviewService,
    context_lines: usize,
    tools: ActionTools<'a>,
}

impl<'a, M: StructuralMatcher> ActionDispatcher<'a, M> {
    pub fn new(
        executor: &'a SearchExecutor<M>,
        preview: &'a PreviewService,
        context_lines: usize,
        tools: ActionTools<'a>,
    ) -> Self {
        Self {
            executor,
            preview,
            context_lines,
            tools,
        }
    }

    /// Perform `choice` for `result`, found by `pattern`.
    ///
    /// Errors are local to the action: the caller reports them and shows the menu again.
    pub fn perform(
        &self,
        choice: ActionChoice,
        result: &SearchResult,
        pattern: &Pattern,
    ) -> Result<ActionOutcome, SessionError> {
        tracing::debug!(action = choice.label(), path = %result.path().display(), "dispatching");
        match choice {
            ActionChoice::OpenInEditor => {
                self.tools
                    .editor
                    .open(&self.absolute(result.path()), result.line())?;
                Ok(ActionOutcome::Opened {
                    location: result.location(),
                })
            }
            ActionChoice::ShowContext => {
                let window = self.preview.context(
                    &self.absolute(result.path()),
                    result.line(),
                    self.context_lines,
                )?;
                Ok(ActionOutcome::Context(window))
            }
            ActionChoice::ShowAllInFile => {
                let outcome = self.executor.execute(pattern, Some(result.path()))?;
                Ok(ActionOutcome::FileMatches {
                    path: result.path().to_path_buf(),
                    outcome,
                })
            }
            ActionChoice::CopyPath => {
                let path = self.absolute(result.path());
                match self.tools.clipboard.copy(&path.to_string_lossy()) {
                    Ok(()) => Ok(ActionOutcome::Copied { path }),
                    Err(err) => Ok(ActionOutcome::CopyFailed {
                        path,
                        reason: format!("{err:#}"),
                    }),
                }
            }
            ActionChoice::FindReferences => {
                let identifier = match extract_identifier(pattern) {
                    Ok(identifier) => identifier,
                    Err(err) => return Ok(ActionOutcome::ReferencesUnavailable(err)),
                };
                let lines = self.tools.references.search(
                    &identifier,
                    pattern.language(),
                    self.executor.root(),
                )?;
                Ok(ActionOutcome::References {
                    identifier,
                    outcome: collect_results(lines),
                })
            }
            ActionChoice::Exit => Ok(ActionOutcome::Exit),
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.executor.root().join(path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    use anyhow::{Result, anyhow};

    use crate::app::search::tests::ScriptedMatcher;
    use crate::domain::model::Language;
    use crate::infra::config::Presentation;

    #[derive(Default)]
    pub(crate) struct RecordingEditor {
        pub opened: RefCell<Vec<(PathBuf, usize)>>,
        pub fail: bool,
    }

    impl EditorLauncher for RecordingEditor {
        fn open(&self, path: &Path, line: usize) -> Result<()> {
            if self.fail {
                return Err(anyhow!("editor vi exited with status 1"));
            }
            self.opened.borrow_mut().push((path.to_path_buf(), line));
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingClipboard {
        pub copied: RefCell<Vec<String>>,
        pub fail: bool,
    }

    impl ClipboardSink for RecordingClipboard {
        fn copy(&self, text: &str) -> Result<()> {
            if self.fail {
                return Err(anyhow!("no clipboard backend"));
            }
            self.copied.borrow_mut().push(text.to_owned());
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct CannedSearcher {
        pub lines: Vec<&'static str>,
        pub queries: RefCell<Vec<(String, Language)>>,
    }

    impl TextSearcher for CannedSearcher {
        fn search(&self, literal: &str, language: Language, _root: &Path) -> Result<Vec<String>> {
            self.queries
                .borrow_mut()
                .push((literal.to_owned(), language));
            Ok(self.lines.iter().map(|line| line.to_string()).collect())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        executor: SearchExecutor<ScriptedMatcher>,
        preview: PreviewService,
        editor: RecordingEditor,
        clipboard: RecordingClipboard,
        searcher: CannedSearcher,
    }

    impl Fixture {
        fn new(matcher: ScriptedMatcher) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let body: String = (1..=20).map(|n| format!("line_{n} = {n}\n")).collect();
            fs::write(dir.path().join("app.py"), body).unwrap();
            let executor = SearchExecutor::new(matcher, dir.path());
            let presentation = Presentation {
                color: false,
                ..Presentation::default()
            };
            Self {
                dir,
                executor,
                preview: PreviewService::new(&presentation),
                editor: RecordingEditor::default(),
                clipboard: RecordingClipboard::default(),
                searcher: CannedSearcher {
                    lines: vec!["app.py:3:1:line_3.unwrap()", "lib.py:9:4:x.unwrap()"],
                    ..CannedSearcher::default()
                },
            }
        }

        fn dispatcher(&self) -> ActionDispatcher<'_, ScriptedMatcher> {
            ActionDispatcher::new(
                &self.executor,
                &self.preview,
                2,
                ActionTools {
                    editor: &self.editor,
                    clipboard: &self.clipboard,
                    references: &self.searcher,
                },
            )
        }
    }

    fn hit() -> SearchResult {
        SearchResult::parse("app.py:10:1:line_10 = 10").unwrap()
    }

    fn pattern(text: &str) -> Pattern {
        Pattern::new(text, Language::Python).unwrap()
    }

    #[test]
    fn open_in_editor_returns_to_top_level() -> Result<()> {
        let fixture = Fixture::new(ScriptedMatcher::default());
        let outcome =
            fixture
                .dispatcher()
                .perform(ActionChoice::OpenInEditor, &hit(), &pattern("$X"))?;
        assert_eq!(outcome.next_step(), MenuStep::ReturnToTop);
        assert_eq!(
            fixture.editor.opened.borrow().as_slice(),
            &[(fixture.dir.path().join("app.py"), 10)]
        );
        Ok(())
    }

    #[test]
    fn editor_failure_is_reported_to_caller() {
        let mut fixture = Fixture::new(ScriptedMatcher::default());
        fixture.editor.fail = true;
        let err = fixture
            .dispatcher()
            .perform(ActionChoice::OpenInEditor, &hit(), &pattern("$X"))
            .unwrap_err();
        assert!(err.to_string().contains("exited with status 1"));
    }

    #[test]
    fn show_context_stays_in_menu() -> Result<()> {
        let fixture = Fixture::new(ScriptedMatcher::default());
        let outcome =
            fixture
                .dispatcher()
                .perform(ActionChoice::ShowContext, &hit(), &pattern("$X"))?;
        assert_eq!(outcome.next_step(), MenuStep::Stay);
        let ActionOutcome::Context(window) = outcome else {
            panic!("expected context window");
        };
        assert_eq!(window.start_line, 8);
        assert_eq!(window.end_line(), 12);
        Ok(())
    }

    #[test]
    fn show_all_scopes_search_to_the_file() -> Result<()> {
        let matcher = ScriptedMatcher::default().with(
            "$X = $Y",
            vec!["app.py:1:1:line_1 = 1", "other.py:2:1:z = 2", "app.py:2:1:line_2 = 2"],
        );
        let fixture = Fixture::new(matcher);
        let outcome =
            fixture
                .dispatcher()
                .perform(ActionChoice::ShowAllInFile, &hit(), &pattern("$X = $Y"))?;
        let ActionOutcome::FileMatches { path, outcome } = outcome else {
            panic!("expected file matches");
        };
        assert_eq!(path, PathBuf::from("app.py"));
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(
            fixture.executor_calls(),
            vec![("$X = $Y".to_owned(), Some(PathBuf::from("app.py")))]
        );
        Ok(())
    }

    #[test]
    fn copy_failure_is_not_fatal() -> Result<()> {
        let mut fixture = Fixture::new(ScriptedMatcher::default());
        let outcome =
            fixture
                .dispatcher()
                .perform(ActionChoice::CopyPath, &hit(), &pattern("$X"))?;
        assert!(matches!(outcome, ActionOutcome::Copied { .. }));
        assert_eq!(
            fixture.clipboard.copied.borrow().as_slice(),
            &[fixture.dir.path().join("app.py").to_string_lossy().into_owned()]
        );

        fixture.clipboard.fail = true;
        let outcome =
            fixture
                .dispatcher()
                .perform(ActionChoice::CopyPath, &hit(), &pattern("$X"))?;
        assert!(matches!(outcome, ActionOutcome::CopyFailed { .. }));
        assert_eq!(outcome.next_step(), MenuStep::Stay);
        Ok(())
    }

    #[test]
    fn find_references_uses_extracted_identifier() -> Result<()> {
        let fixture = Fixture::new(ScriptedMatcher::default());
        let outcome = fixture.dispatcher().perform(
            ActionChoice::FindReferences,
            &hit(),
            &pattern("$X.unwrap()"),
        )?;
        let ActionOutcome::References { identifier, outcome } = outcome else {
            panic!("expected references");
        };
        assert_eq!(identifier, "unwrap");
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(
            fixture.searcher.queries.borrow().as_slice(),
            &[("unwrap".to_owned(), Language::Python)]
        );
        Ok(())
    }

    #[test]
    fn find_references_without_identifier_skips_search() -> Result<()> {
        let fixture = Fixture::new(ScriptedMatcher::default());
        let outcome = fixture.dispatcher().perform(
            ActionChoice::FindReferences,
            &hit(),
            &pattern("print($$$)"),
        )?;
        assert!(matches!(
            outcome,
            ActionOutcome::ReferencesUnavailable(DomainError::UnextractableIdentifier(_))
        ));
        assert!(fixture.searcher.queries.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn exit_ends_session() -> Result<()> {
        let fixture = Fixture::new(ScriptedMatcher::default());
        let outcome = fixture
            .dispatcher()
            .perform(ActionChoice::Exit, &hit(), &pattern("$X"))?;
        assert_eq!(outcome.next_step(), MenuStep::EndSession);
        Ok(())
    }

    impl Fixture {
        fn executor_calls(&self) -> Vec<(String, Option<PathBuf>)> {
            self.executor.matcher().calls.borrow().clone()
        }
    }
}
