//! Transient state of one interactive run.

use crate::domain::model::{Language, Pattern, SearchResult};

/// Active language, last pattern, and current selection. Nothing here outlives the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    language: Language,
    pattern: Option<Pattern>,
    selected: Option<SearchResult>,
    last_search_failed: bool,
}

impl Session {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            pattern: None,
            selected: None,
            last_search_failed: false,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switch language. The active pattern belongs to the old language and is discarded.
    pub fn set_language(&mut self, language: Language) {
        if self.language != language {
            self.language = language;
            self.pattern = None;
            self.selected = None;
        }
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// Start a new search step with `pattern`, clearing the previous selection.
    pub fn begin_search(&mut self, pattern: Pattern) {
        self.language = pattern.language();
        self.pattern = Some(pattern);
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&SearchResult> {
        self.selected.as_ref()
    }

    pub fn select(&mut self, result: SearchResult) {
        self.selected = Some(result);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn record_search(&mut self, failed: bool) {
        self.last_search_failed = failed;
    }

    pub fn last_search_failed(&self) -> bool {
        self.last_search_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_search_resets_selection_and_adopts_language() {
        let mut session = Session::new(Language::Python);
        session.select(SearchResult::parse("a.py:1:1:x").unwrap());
        session.begin_search(Pattern::new("$X.unwrap()", Language::Rust).unwrap());
        assert_eq!(session.language(), Language::Rust);
        assert!(session.selected().is_none());
        assert_eq!(session.pattern().map(Pattern::text), Some("$X.unwrap()"));
    }

    #[test]
    fn switching_language_discards_pattern() {
        let mut session = Session::new(Language::Go);
        session.begin_search(Pattern::new("defer $CALL", Language::Go).unwrap());
        session.set_language(Language::Go);
        assert!(session.pattern().is_some());
        session.set_language(Language::Zig);
        assert!(session.pattern().is_none());
    }
}
