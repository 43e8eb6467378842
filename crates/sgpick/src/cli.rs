//! Command-line arguments.

use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::Shell;

use crate::domain::model::Language;

/// Create the clap styles used for help output.
fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sgpick",
    version,
    about = "Interactive structural code search: find with ast-grep, pick with fzf, then act",
    styles = cli_styles()
)]
pub struct Cli {
    #[arg(
        short,
        long = "pattern",
        value_name = "TEXT",
        action = ArgAction::Append,
        help = "Structural pattern to run first; repeat with --multi to search several at once"
    )]
    pub patterns: Vec<String>,
    #[arg(
        short,
        long,
        value_enum,
        value_name = "ID",
        help = "Language of the patterns (default: config value, then py)"
    )]
    pub language: Option<Language>,
    #[arg(long, help = "Run several patterns, merge the hits, and print the ones you mark")]
    pub multi: bool,
    #[arg(long, help = "Print example patterns for the language and exit")]
    pub examples: bool,
    #[arg(
        short = 'C',
        long = "path",
        value_name = "PATH",
        help = "Restrict the initial search to a file or directory (default: whole project)"
    )]
    pub path: Option<PathBuf>,
    #[arg(long, value_name = "FILE", help = "Additional configuration file to merge")]
    pub config: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,
    #[arg(long, value_enum, value_name = "SHELL", help = "Print a shell completion script and exit")]
    pub completions: Option<Shell>,
    /// Render the preview pane for the fuzzy selector.
    #[arg(long, num_args = 2, value_names = ["FILE", "LINE"], hide = true)]
    pub preview: Option<Vec<String>>,
}

impl Cli {
    /// Parse process arguments, exiting with a usage error on invalid combinations.
    pub fn parse_args() -> Self {
        let cli = Self::parse();
        if let Err(err) = cli.validate() {
            err.exit();
        }
        cli
    }

    fn validate(&self) -> Result<(), clap::Error> {
        if !self.multi && self.patterns.len() > 1 {
            return Err(Self::command().error(
                ErrorKind::TooManyValues,
                "--pattern may be given more than once only together with --multi",
            ));
        }
        if self.patterns.iter().any(|pattern| pattern.trim().is_empty()) {
            return Err(Self::command().error(
                ErrorKind::InvalidValue,
                "--pattern must not be empty",
            ));
        }
        Ok(())
    }

    /// Target of the hidden `--preview FILE LINE` mode.
    pub fn preview_target(&self) -> Option<Result<(PathBuf, usize), clap::Error>> {
        let values = self.preview.as_ref()?;
        let [file, line] = values.as_slice() else {
            return Some(Err(Self::command().error(
                ErrorKind::WrongNumberOfValues,
                "--preview takes a file and a line",
            )));
        };
        Some(
            line.trim()
                .parse::<usize>()
                .map(|line| (PathBuf::from(file), line))
                .map_err(|_| {
                    Self::command().error(
                        ErrorKind::InvalidValue,
                        format!("invalid preview line '{line}'"),
                    )
                }),
        )
    }

    pub fn write_completions(shell: Shell, out: &mut dyn std::io::Write) {
        let mut command = Self::command();
        let name = command.get_name().to_owned();
        clap_complete::generate(shell, &mut command, name, out);
    }
}
