//! Domain models for patterns, search hits, and session actions.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::ValueEnum;

use crate::domain::errors::DomainError;

/// Separator between the fields of a result line (`path:line[:column[:snippet]]`).
pub const FIELD_DELIMITER: char = ':';

/// Target languages known to the pattern catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum Language {
    #[value(name = "py", alias = "python")]
    Python,
    #[value(name = "js", alias = "javascript")]
    JavaScript,
    #[value(name = "ts", alias = "typescript")]
    TypeScript,
    #[value(name = "rs", alias = "rust")]
    Rust,
    #[value(name = "go", alias = "golang")]
    Go,
    #[value(name = "zig")]
    Zig,
    #[value(name = "rb", alias = "ruby")]
    Ruby,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Rust,
        Language::Go,
        Language::Zig,
        Language::Ruby,
    ];

    /// Short identifier used on the command line and in configuration.
    pub fn id(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Rust => "rs",
            Language::Go => "go",
            Language::Zig => "zig",
            Language::Ruby => "rb",
        }
    }

    /// Human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Rust => "Rust",
            Language::Go => "Go",
            Language::Zig => "Zig",
            Language::Ruby => "Ruby",
        }
    }

    /// Language name understood by `ast-grep --lang`.
    pub fn matcher_id(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Zig => "zig",
            Language::Ruby => "ruby",
        }
    }

    /// File type understood by `rg --type`.
    pub fn text_search_type(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Zig => "zig",
            Language::Ruby => "ruby",
        }
    }

    /// Reserved words that never name a user symbol.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &[
                "def", "class", "return", "if", "elif", "else", "for", "while", "in", "is",
                "not", "and", "or", "import", "from", "as", "with", "try", "except",
                "finally", "raise", "lambda", "yield", "pass", "async", "await", "None",
                "True", "False", "self",
            ],
            Language::JavaScript | Language::TypeScript => &[
                "function", "class", "return", "if", "else", "for", "while", "const", "let",
                "var", "new", "this", "import", "from", "export", "default", "async",
                "await", "try", "catch", "finally", "throw", "typeof", "instanceof", "null",
                "undefined", "true", "false", "interface", "type", "as", "any",
            ],
            Language::Rust => &[
                "fn", "let", "mut", "pub", "impl", "struct", "enum", "trait", "for", "in",
                "if", "else", "match", "return", "use", "mod", "self", "Self", "where",
                "unsafe", "async", "await", "move", "ref", "const", "static", "dyn", "loop",
                "while", "true", "false", "crate",
            ],
            Language::Go => &[
                "func", "return", "if", "else", "for", "range", "go", "defer", "var",
                "const", "type", "struct", "interface", "package", "import", "nil", "err",
                "true", "false", "switch", "case", "select", "chan", "map",
            ],
            Language::Zig => &[
                "fn", "pub", "const", "var", "return", "try", "catch", "if", "else",
                "while", "for", "defer", "errdefer", "struct", "enum", "union", "comptime",
                "null", "undefined", "true", "false", "orelse",
            ],
            Language::Ruby => &[
                "def", "end", "class", "module", "do", "if", "elsif", "else", "unless",
                "while", "until", "return", "yield", "self", "nil", "true", "false",
                "require", "begin", "rescue", "ensure", "raise",
            ],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Language {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Language::ALL
            .into_iter()
            .find(|language| {
                needle.eq_ignore_ascii_case(language.id())
                    || needle.eq_ignore_ascii_case(language.matcher_id())
            })
            .ok_or_else(|| DomainError::UnknownLanguage(needle.to_owned()))
    }
}

/// A structural query bound to exactly one language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    text: String,
    language: Language,
}

impl Pattern {
    pub fn new(text: impl Into<String>, language: Language) -> Result<Self, DomainError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyPattern);
        }
        Ok(Self {
            text: trimmed.to_owned(),
            language,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.text, self.language)
    }
}

/// One located hit, parsed from a delimited result line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    raw: String,
    path: PathBuf,
    line: usize,
    column: Option<usize>,
    snippet: Option<String>,
}

impl SearchResult {
    /// Parse a `path:line[:column[:snippet]]` line. The raw text is kept as the identity of the hit.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let malformed = || DomainError::MalformedResultLine(raw.to_owned());

        let mut fields = raw.splitn(3, FIELD_DELIMITER);
        let path = fields.next().filter(|path| !path.is_empty()).ok_or_else(malformed)?;
        let line = fields
            .next()
            .and_then(|line| line.trim().parse::<usize>().ok())
            .filter(|line| *line > 0)
            .ok_or_else(malformed)?;

        let (column, snippet) = match fields.next() {
            None => (None, None),
            Some(rest) => split_column(rest),
        };

        Ok(Self {
            raw: raw.to_owned(),
            path: PathBuf::from(path),
            line,
            column,
            snippet,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn snippet(&self) -> Option<&str> {
        self.snippet.as_deref()
    }

    /// `path:line`, the form editors and humans expect.
    pub fn location(&self) -> String {
        format!("{}{FIELD_DELIMITER}{}", self.path.display(), self.line)
    }
}

fn split_column(rest: &str) -> (Option<usize>, Option<String>) {
    if let Some((column, snippet)) = rest.split_once(FIELD_DELIMITER)
        && let Ok(column) = column.trim().parse::<usize>()
    {
        return (Some(column), Some(snippet.to_owned()).filter(|s| !s.is_empty()));
    }

    match rest.trim().parse::<usize>() {
        Ok(column) => (Some(column), None),
        Err(_) => (None, Some(rest.to_owned()).filter(|s| !s.is_empty())),
    }
}

/// Ordered, deduplicated collection of hits. Identity is the raw result line.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    results: Vec<SearchResult>,
    seen: HashSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hit unless an identical line is already present. Returns whether it was added.
    pub fn insert(&mut self, result: SearchResult) -> bool {
        if !self.seen.insert(result.raw.clone()) {
            return false;
        }
        self.results.push(result);
        true
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.results.iter()
    }

    /// Raw lines in set order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(SearchResult::raw)
    }

    /// Look up a hit by its raw line.
    pub fn find(&self, raw: &str) -> Option<&SearchResult> {
        if !self.seen.contains(raw) {
            return None;
        }
        self.results.iter().find(|result| result.raw == raw)
    }

    /// Union several sets, drop duplicates, and order lines lexicographically.
    pub fn union_sorted(sets: impl IntoIterator<Item = ResultSet>) -> ResultSet {
        let mut merged: Vec<SearchResult> = sets.into_iter().flat_map(|set| set.results).collect();
        merged.sort_by(|a, b| a.raw.cmp(&b.raw));
        merged.into_iter().collect()
    }
}

impl PartialEq for ResultSet {
    fn eq(&self, other: &Self) -> bool {
        self.results == other.results
    }
}

impl Eq for ResultSet {}

impl FromIterator<SearchResult> for ResultSet {
    fn from_iter<T: IntoIterator<Item = SearchResult>>(iter: T) -> Self {
        let mut set = ResultSet::new();
        for result in iter {
            set.insert(result);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Follow-up actions offered once a hit is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionChoice {
    OpenInEditor,
    ShowContext,
    ShowAllInFile,
    CopyPath,
    FindReferences,
    Exit,
}

impl ActionChoice {
    pub const ALL: [ActionChoice; 6] = [
        ActionChoice::OpenInEditor,
        ActionChoice::ShowContext,
        ActionChoice::ShowAllInFile,
        ActionChoice::CopyPath,
        ActionChoice::FindReferences,
        ActionChoice::Exit,
    ];

    /// Single-key shortcut shown in the menu.
    pub fn key(&self) -> char {
        match self {
            ActionChoice::OpenInEditor => 'o',
            ActionChoice::ShowContext => 'c',
            ActionChoice::ShowAllInFile => 'a',
            ActionChoice::CopyPath => 'y',
            ActionChoice::FindReferences => 'r',
            ActionChoice::Exit => 'q',
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionChoice::OpenInEditor => "Open in editor",
            ActionChoice::ShowContext => "Show context",
            ActionChoice::ShowAllInFile => "Show all matches in this file",
            ActionChoice::CopyPath => "Copy file path",
            ActionChoice::FindReferences => "Find references",
            ActionChoice::Exit => "Exit",
        }
    }

    /// One-based position in the menu.
    pub fn number(&self) -> usize {
        Self::ALL
            .iter()
            .position(|choice| choice == self)
            .map_or(0, |index| index + 1)
    }
}

impl FromStr for ActionChoice {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let input = value.trim().to_ascii_lowercase();
        let invalid = || DomainError::InvalidMenuChoice(value.trim().to_owned());

        if let Ok(number) = input.parse::<usize>() {
            return number
                .checked_sub(1)
                .and_then(|index| Self::ALL.get(index).copied())
                .ok_or_else(invalid);
        }

        match input.as_str() {
            "o" | "open" | "edit" => Ok(ActionChoice::OpenInEditor),
            "c" | "context" => Ok(ActionChoice::ShowContext),
            "a" | "all" => Ok(ActionChoice::ShowAllInFile),
            "y" | "copy" => Ok(ActionChoice::CopyPath),
            "r" | "refs" | "references" => Ok(ActionChoice::FindReferences),
            "q" | "quit" | "exit" => Ok(ActionChoice::Exit),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_result_line() {
        let result = SearchResult::parse("src/app.py:12:5:def handler(event):").unwrap();
        assert_eq!(result.path(), Path::new("src/app.py"));
        assert_eq!(result.line(), 12);
        assert_eq!(result.column(), Some(5));
        assert_eq!(result.snippet(), Some("def handler(event):"));
        assert_eq!(result.location(), "src/app.py:12");
    }

    #[test]
    fn snippet_may_contain_delimiters() {
        let result = SearchResult::parse("a.rs:3:1:let x: u8 = y;").unwrap();
        assert_eq!(result.snippet(), Some("let x: u8 = y;"));
    }

    #[test]
    fn column_is_optional() {
        let result = SearchResult::parse("lib/x.rb:7").unwrap();
        assert_eq!(result.line(), 7);
        assert_eq!(result.column(), None);

        let result = SearchResult::parse("lib/x.rb:7:puts value").unwrap();
        assert_eq!(result.column(), None);
        assert_eq!(result.snippet(), Some("puts value"));
    }

    #[test]
    fn rejects_lines_without_location() {
        for raw in ["no delimiter here", ":12:3:x", "file.go:zero:1", "file.go:0:1:x", ""] {
            assert!(
                matches!(
                    SearchResult::parse(raw),
                    Err(DomainError::MalformedResultLine(_))
                ),
                "{raw} should be malformed"
            );
        }
    }

    #[test]
    fn result_set_deduplicates_in_insertion_order() {
        let set: ResultSet = ["b.py:2:1:x", "a.py:1:1:y", "b.py:2:1:x"]
            .into_iter()
            .map(|raw| SearchResult::parse(raw).unwrap())
            .collect();
        let lines: Vec<_> = set.lines().collect();
        assert_eq!(lines, vec!["b.py:2:1:x", "a.py:1:1:y"]);
        assert!(set.find("a.py:1:1:y").is_some());
        assert!(set.find("c.py:1:1:z").is_none());
    }

    #[test]
    fn union_sorted_orders_lexicographically() {
        let first: ResultSet = ["z.go:1:1:a", "a.go:9:1:b"]
            .into_iter()
            .map(|raw| SearchResult::parse(raw).unwrap())
            .collect();
        let second: ResultSet = ["a.go:9:1:b", "m.go:4:2:c"]
            .into_iter()
            .map(|raw| SearchResult::parse(raw).unwrap())
            .collect();
        let merged = ResultSet::union_sorted([first, second]);
        let lines: Vec<_> = merged.lines().collect();
        assert_eq!(lines, vec!["a.go:9:1:b", "m.go:4:2:c", "z.go:1:1:a"]);
    }

    #[test]
    fn language_parses_short_and_long_names() {
        assert_eq!("py".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("Rust".parse::<Language>().unwrap(), Language::Rust);
        assert_eq!(" go ".parse::<Language>().unwrap(), Language::Go);
        assert!(matches!(
            "cobol".parse::<Language>(),
            Err(DomainError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn pattern_rejects_blank_text() {
        assert_eq!(
            Pattern::new("   ", Language::Go),
            Err(DomainError::EmptyPattern)
        );
        let pattern = Pattern::new("  fmt.Println($$$) ", Language::Go).unwrap();
        assert_eq!(pattern.text(), "fmt.Println($$$)");
    }

    #[test]
    fn action_choice_accepts_numbers_keys_and_words() {
        assert_eq!("1".parse::<ActionChoice>(), Ok(ActionChoice::OpenInEditor));
        assert_eq!("r".parse::<ActionChoice>(), Ok(ActionChoice::FindReferences));
        assert_eq!("Copy".parse::<ActionChoice>(), Ok(ActionChoice::CopyPath));
        assert_eq!("6".parse::<ActionChoice>(), Ok(ActionChoice::Exit));
        assert!("7".parse::<ActionChoice>().is_err());
        assert!("0".parse::<ActionChoice>().is_err());
        assert!("launch".parse::<ActionChoice>().is_err());
        assert_eq!(ActionChoice::ShowAllInFile.number(), 3);
    }
}
