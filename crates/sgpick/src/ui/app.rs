//! Interactive session loop: top-level prompt, result selection, and the action menu.

use std::path::PathBuf;

use anyhow::Result;

use crate::app::actions::{ActionDispatcher, ActionOutcome, ActionTools, MenuStep};
use crate::app::catalog::{examples, examples_for_id};
use crate::app::multi::aggregate;
use crate::app::preview::PreviewService;
use crate::app::search::{SearchExecutor, SearchOutcome};
use crate::app::select::ResultSelector;
use crate::app::session::Session;
use crate::domain::errors::SessionError;
use crate::domain::model::{ActionChoice, Language, Pattern, SearchResult};
use crate::infra::capability::Verified;
use crate::infra::clipboard::{ClipboardSink, SystemClipboard};
use crate::infra::config::{Config, Presentation};
use crate::infra::editor::{EditorLauncher, SystemEditor};
use crate::infra::matcher::{AstGrep, StructuralMatcher};
use crate::infra::selector::{FuzzySelector, Fzf};
use crate::infra::text_search::{Ripgrep, TextSearcher};
use crate::ui::console::Console;
use crate::ui::prompt::{Input, Prompter};

const HELP: &str = "Type a pattern to search. Commands: :examples [id], :lang <id>, :rerun, :help, :quit";

/// How the process should end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    /// The session ended right after a failed search, or every multi-mode pattern failed.
    SearchFailed,
    Usage,
    MissingCapability,
}

impl Exit {
    pub fn code(self) -> u8 {
        match self {
            Exit::Success => 0,
            Exit::SearchFailed => 1,
            Exit::Usage => 2,
            Exit::MissingCapability => 3,
        }
    }
}

impl From<Exit> for std::process::ExitCode {
    fn from(exit: Exit) -> Self {
        std::process::ExitCode::from(exit.code())
    }
}

/// Result of a multi-pattern run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiEnd {
    /// Raw lines the user marked, in selector order.
    pub selected: Vec<String>,
    pub exit: Exit,
}

/// Processes and sinks the session hands work to.
pub struct Collaborators<M, S> {
    pub matcher: M,
    pub selector: S,
    pub references: Box<dyn TextSearcher>,
    pub editor: Box<dyn EditorLauncher>,
    pub clipboard: Box<dyn ClipboardSink>,
}

impl Collaborators<AstGrep, Fzf> {
    pub fn from_config(config: &Config) -> Self {
        Self {
            matcher: AstGrep::new(config.tools.matcher(), config.search.globs.clone()),
            selector: Fzf::new(config.tools.selector(), &config.selector),
            references: Box::new(Ripgrep::new(config.tools.text_search())),
            editor: Box::new(SystemEditor::resolve(config.defaults.editor())),
            clipboard: Box::new(SystemClipboard::new()),
        }
    }
}

/// Where and how a session searches.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub language: Language,
    pub root: PathBuf,
    /// Restricts top-level searches; relative to `root`.
    pub scope: Option<PathBuf>,
    /// Preview command handed to the selector.
    pub preview_command: String,
}

/// Top-level prompt commands.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Empty,
    Search(String),
    /// Catalog for the active language, or for the given identifier.
    Examples(Option<String>),
    Language(String),
    Rerun,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Command::Search(line.to_owned()));
    };

    let command = command.trim_start();
    let (verb, rest) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(verb, rest)| (verb, rest.trim()));

    match verb {
        "examples" | "ex" => Ok(Command::Examples(
            Some(rest).filter(|id| !id.is_empty()).map(str::to_owned),
        )),
        "lang" | "language" => {
            if rest.is_empty() {
                return Err("lang command requires an identifier".to_owned());
            }
            Ok(Command::Language(rest.to_owned()))
        }
        "rerun" | "r" => Ok(Command::Rerun),
        "help" | "h" => Ok(Command::Help),
        "quit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command ':{other}'")),
    }
}

pub struct SessionApp<M, S> {
    session: Session,
    executor: SearchExecutor<M>,
    selector: ResultSelector<S>,
    references: Box<dyn TextSearcher>,
    editor: Box<dyn EditorLauncher>,
    clipboard: Box<dyn ClipboardSink>,
    preview: PreviewService,
    context_lines: usize,
    scope: Option<PathBuf>,
    console: Console,
    prompter: Box<dyn Prompter>,
    verified: Verified,
}

impl<M: StructuralMatcher, S: FuzzySelector> SessionApp<M, S> {
    /// Build a session. Requires proof that the external tools are present.
    pub fn new(
        verified: Verified,
        options: SessionOptions,
        presentation: &Presentation,
        collaborators: Collaborators<M, S>,
        console: Console,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            session: Session::new(options.language),
            executor: SearchExecutor::new(collaborators.matcher, &options.root),
            selector: ResultSelector::new(collaborators.selector, options.preview_command)
                .in_root(&options.root),
            references: collaborators.references,
            editor: collaborators.editor,
            clipboard: collaborators.clipboard,
            preview: PreviewService::new(presentation),
            context_lines: presentation.context_lines,
            scope: options.scope,
            console,
            prompter,
            verified,
        }
    }

    /// Run the interactive loop until the user quits. `initial` runs before the first prompt.
    pub fn run(&mut self, initial: Option<&str>) -> Result<Exit> {
        tracing::debug!(
            root = %self.executor.root().display(),
            tools = ?self.verified.programs(),
            "session started"
        );
        self.console.info(HELP);

        if let Some(text) = initial
            && self.search_text(text)? == MenuStep::EndSession
        {
            return Ok(self.finish());
        }

        loop {
            let label = format!("sg[{}]", self.session.language());
            let line = match self.prompter.read(&label)? {
                Input::Line(line) => line,
                Input::Interrupted => continue,
                Input::Eof => break,
            };

            let step = match parse_command(&line) {
                Ok(Command::Empty) => MenuStep::Stay,
                Ok(Command::Search(text)) => self.search_text(&text)?,
                Ok(Command::Examples(None)) => {
                    let language = self.session.language();
                    self.console.catalog(language.name(), examples(language));
                    MenuStep::Stay
                }
                Ok(Command::Examples(Some(id))) => {
                    let name = id
                        .parse::<Language>()
                        .map_or_else(|_| id.clone(), |language| language.name().to_owned());
                    self.console.catalog(&name, examples_for_id(&id));
                    MenuStep::Stay
                }
                Ok(Command::Language(id)) => {
                    match id.parse::<Language>() {
                        Ok(language) => {
                            self.session.set_language(language);
                            self.console
                                .success(format!("Language set to {}", language.name()));
                        }
                        Err(err) => self.console.error(err),
                    }
                    MenuStep::Stay
                }
                Ok(Command::Rerun) => match self.session.pattern().cloned() {
                    Some(pattern) => self.search(pattern)?,
                    None => {
                        self.console.warn("Nothing to rerun yet.");
                        MenuStep::Stay
                    }
                },
                Ok(Command::Help) => {
                    self.console.info(HELP);
                    MenuStep::Stay
                }
                Ok(Command::Quit) => MenuStep::EndSession,
                Err(message) => {
                    self.console.error(message);
                    MenuStep::Stay
                }
            };

            if step == MenuStep::EndSession {
                break;
            }
        }

        Ok(self.finish())
    }

    /// Aggregate several patterns, let the user mark hits, and return the marked lines.
    pub fn run_multi(&mut self, seeds: &[String]) -> Result<MultiEnd> {
        let texts = if seeds.is_empty() {
            self.read_patterns()?
        } else {
            seeds.to_vec()
        };

        let language = self.session.language();
        let mut patterns = Vec::with_capacity(texts.len());
        for text in texts {
            match Pattern::new(text, language) {
                Ok(pattern) => patterns.push(pattern),
                Err(err) => self.console.warn(format!("skipping pattern: {err}")),
            }
        }

        let aggregation = match aggregate(&self.executor, &patterns) {
            Ok(aggregation) => aggregation,
            Err(SessionError::NoPatternsProvided) => {
                self.console.error(SessionError::NoPatternsProvided);
                return Ok(MultiEnd {
                    selected: Vec::new(),
                    exit: Exit::Usage,
                });
            }
            Err(err) => return Err(err.into()),
        };

        for failure in &aggregation.failures {
            self.console
                .error(format!("pattern '{}' failed", failure.pattern.text()));
            self.console.block(&failure.diagnostic);
        }
        self.report_dropped(&aggregation.dropped);

        let exit = if aggregation.all_failed() {
            Exit::SearchFailed
        } else {
            Exit::Success
        };
        if aggregation.results.is_empty() {
            self.console.info("No matches for any pattern.");
            return Ok(MultiEnd {
                selected: Vec::new(),
                exit,
            });
        }

        let header = format!(
            "{} patterns | {} matches | Tab marks, Enter confirms",
            patterns.len(),
            aggregation.results.len()
        );
        let selected = match self
            .selector
            .select_many(&aggregation.results, Some(&header))
        {
            Ok(Some(chosen)) => chosen.iter().map(|r| r.raw().to_owned()).collect(),
            Ok(None) => {
                self.console.info("No selection.");
                Vec::new()
            }
            Err(err) => {
                self.console.error(format!("{err:#}"));
                Vec::new()
            }
        };

        Ok(MultiEnd { selected, exit })
    }

    fn read_patterns(&mut self) -> Result<Vec<String>> {
        self.console
            .info("Enter one pattern per line; an empty line starts the search.");
        let mut texts = Vec::new();
        loop {
            let label = format!("pattern {}", texts.len() + 1);
            match self.prompter.read(&label)? {
                Input::Line(line) if line.trim().is_empty() => break,
                Input::Line(line) => texts.push(line),
                Input::Eof => break,
                Input::Interrupted => return Ok(Vec::new()),
            }
        }
        Ok(texts)
    }

    fn search_text(&mut self, text: &str) -> Result<MenuStep> {
        match Pattern::new(text, self.session.language()) {
            Ok(pattern) => self.search(pattern),
            Err(err) => {
                self.console.error(err);
                Ok(MenuStep::Stay)
            }
        }
    }

    fn search(&mut self, pattern: Pattern) -> Result<MenuStep> {
        self.session.begin_search(pattern.clone());
        let outcome = match self.executor.execute(&pattern, self.scope.as_deref()) {
            Ok(outcome) => {
                self.session.record_search(false);
                outcome
            }
            Err(err) => {
                self.session.record_search(true);
                self.report_error(err);
                return Ok(MenuStep::Stay);
            }
        };

        self.report_outcome_notes(&outcome);
        if outcome.is_empty() {
            self.console.info(format!("No matches for {pattern}."));
            return Ok(MenuStep::Stay);
        }

        let header = format!("{pattern} | {} matches", outcome.results.len());
        let chosen = match self.selector.select_one(&outcome.results, Some(&header)) {
            Ok(chosen) => chosen,
            Err(err) => {
                self.console.error(format!("{err:#}"));
                return Ok(MenuStep::Stay);
            }
        };
        let Some(result) = chosen else {
            self.console.info("No selection.");
            return Ok(MenuStep::Stay);
        };

        self.session.select(result.clone());
        let step = self.action_menu(&result, &pattern)?;
        self.session.clear_selection();
        Ok(match step {
            MenuStep::EndSession => MenuStep::EndSession,
            MenuStep::Stay | MenuStep::ReturnToTop => MenuStep::Stay,
        })
    }

    fn action_menu(&mut self, result: &SearchResult, pattern: &Pattern) -> Result<MenuStep> {
        loop {
            self.console.menu(result);
            let choice = match self.prompter.read("action")? {
                Input::Line(line) if line.trim().is_empty() => continue,
                Input::Line(line) => match line.parse::<ActionChoice>() {
                    Ok(choice) => choice,
                    Err(err) => {
                        self.console.error(err);
                        continue;
                    }
                },
                Input::Interrupted => return Ok(MenuStep::ReturnToTop),
                Input::Eof => return Ok(MenuStep::EndSession),
            };

            let performed = {
                let dispatcher = ActionDispatcher::new(
                    &self.executor,
                    &self.preview,
                    self.context_lines,
                    ActionTools {
                        editor: self.editor.as_ref(),
                        clipboard: self.clipboard.as_ref(),
                        references: self.references.as_ref(),
                    },
                );
                dispatcher.perform(choice, result, pattern)
            };

            match performed {
                Ok(outcome) => {
                    let step = outcome.next_step();
                    self.report_action(outcome);
                    if step != MenuStep::Stay {
                        return Ok(step);
                    }
                }
                Err(err) => self.report_error(err),
            }
        }
    }

    fn report_action(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Opened { location } => self.console.success(format!("Opened {location}")),
            ActionOutcome::Context(window) => {
                let rendered = window.render(self.console.color());
                self.console.block(&rendered);
            }
            ActionOutcome::FileMatches { path, outcome } => {
                self.report_outcome_notes(&outcome);
                if outcome.is_empty() {
                    self.console
                        .info(format!("No matches in {}.", path.display()));
                } else {
                    self.console.results(
                        format!("Matches in {}", path.display()),
                        &outcome.results,
                    );
                }
            }
            ActionOutcome::Copied { path } => {
                self.console.success(format!("Copied {}", path.display()))
            }
            ActionOutcome::CopyFailed { path, reason } => self
                .console
                .warn(format!("could not copy {}: {reason}", path.display())),
            ActionOutcome::References {
                identifier,
                outcome,
            } => {
                self.report_outcome_notes(&outcome);
                if outcome.is_empty() {
                    self.console
                        .info(format!("No references to '{identifier}'."));
                } else {
                    self.console
                        .results(format!("References to '{identifier}'"), &outcome.results);
                }
            }
            ActionOutcome::ReferencesUnavailable(err) => self.console.warn(err),
            ActionOutcome::Exit => {}
        }
    }

    fn report_outcome_notes(&mut self, outcome: &SearchOutcome) {
        self.report_dropped(&outcome.dropped);
        if let Some(diagnostic) = &outcome.diagnostic {
            self.console.warn("the matcher reported problems:");
            self.console.block(diagnostic);
        }
    }

    fn report_dropped(&mut self, dropped: &[String]) {
        for line in dropped {
            self.console.warn(format!("ignored malformed result line: {line}"));
        }
    }

    fn report_error(&mut self, err: SessionError) {
        match err {
            SessionError::SearchFailure { diagnostic } => {
                self.console.error("search failed");
                self.console.block(&diagnostic);
            }
            other => self.console.error(format!("{other:#}")),
        }
    }

    fn finish(&self) -> Exit {
        if self.session.last_search_failed() {
            Exit::SearchFailed
        } else {
            Exit::Success
        }
    }
}
