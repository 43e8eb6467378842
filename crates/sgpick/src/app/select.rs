//! Result selector: hands a [`ResultSet`] to the fuzzy selector and maps choices back to hits.

use std::path::PathBuf;

use anyhow::Result;

use crate::domain::model::{ResultSet, SearchResult};
use crate::infra::selector::{FuzzySelector, SelectionMode, SelectorRequest};

pub struct ResultSelector<S> {
    selector: S,
    preview: String,
    root: Option<PathBuf>,
}

impl<S: FuzzySelector> ResultSelector<S> {
    pub fn new(selector: S, preview: impl Into<String>) -> Self {
        Self {
            selector,
            preview: preview.into(),
            root: None,
        }
    }

    /// Run the selector in `root` so relative result paths resolve for the preview command.
    pub fn in_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Choose exactly one hit. `None` means the user cancelled.
    pub fn select_one(
        &self,
        results: &ResultSet,
        header: Option<&str>,
    ) -> Result<Option<SearchResult>> {
        let chosen = self.run(results, SelectionMode::Single, header)?;
        Ok(chosen.into_iter().next())
    }

    /// Choose any number of hits. `None` means the user cancelled.
    pub fn select_many(
        &self,
        results: &ResultSet,
        header: Option<&str>,
    ) -> Result<Option<Vec<SearchResult>>> {
        let chosen = self.run(results, SelectionMode::Multi, header)?;
        Ok(Some(chosen).filter(|chosen| !chosen.is_empty()))
    }

    fn run(
        &self,
        results: &ResultSet,
        mode: SelectionMode,
        header: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        if results.is_empty() {
            return Ok(Vec::new());
        }

        let request = SelectorRequest {
            lines: results.lines().collect(),
            preview: &self.preview,
            mode,
            header,
            cwd: self.root.as_deref(),
        };
        let picked = self.selector.select(&request)?;

        let mut chosen = Vec::with_capacity(picked.len());
        for line in picked {
            match results.find(&line) {
                Some(result) => chosen.push(result.clone()),
                None => tracing::warn!(line = %line, "selector returned an unknown line"),
            }
        }
        Ok(chosen)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Selector that replays queued answers and records the requests it saw.
    #[derive(Default)]
    pub(crate) struct QueuedSelector {
        pub answers: RefCell<VecDeque<Vec<String>>>,
        pub seen: RefCell<Vec<(Vec<String>, SelectionMode, String)>>,
    }

    impl QueuedSelector {
        pub(crate) fn answering(answers: &[&[&str]]) -> Self {
            let queue = answers
                .iter()
                .map(|answer| answer.iter().map(|s| s.to_string()).collect())
                .collect();
            Self {
                answers: RefCell::new(queue),
                seen: RefCell::default(),
            }
        }
    }

    impl FuzzySelector for QueuedSelector {
        fn select(&self, request: &SelectorRequest<'_>) -> Result<Vec<String>> {
            self.seen.borrow_mut().push((
                request.lines.iter().map(|s| s.to_string()).collect(),
                request.mode,
                request.preview.to_owned(),
            ));
            Ok(self.answers.borrow_mut().pop_front().unwrap_or_default())
        }
    }

    fn results(lines: &[&str]) -> ResultSet {
        lines
            .iter()
            .map(|raw| SearchResult::parse(raw).unwrap())
            .collect()
    }

    #[test]
    fn single_select_returns_first_choice_only() -> Result<()> {
        let selector = QueuedSelector::answering(&[&["b.py:2:1:y", "a.py:1:1:x"]]);
        let chooser = ResultSelector::new(&selector, "preview {1} {2}");
        let chosen = chooser.select_one(&results(&["a.py:1:1:x", "b.py:2:1:y"]), None)?;
        assert_eq!(chosen.map(|r| r.location()), Some("b.py:2".to_owned()));

        let seen = selector.seen.borrow();
        assert_eq!(seen[0].1, SelectionMode::Single);
        assert_eq!(seen[0].2, "preview {1} {2}");
        assert_eq!(seen[0].0, vec!["a.py:1:1:x", "b.py:2:1:y"]);
        Ok(())
    }

    #[test]
    fn cancellation_is_no_selection() -> Result<()> {
        let selector = QueuedSelector::answering(&[&[], &[]]);
        let chooser = ResultSelector::new(&selector, "p");
        let set = results(&["a.py:1:1:x"]);
        assert_eq!(chooser.select_one(&set, None)?, None);
        assert_eq!(chooser.select_many(&set, None)?, None);
        Ok(())
    }

    #[test]
    fn multi_select_returns_all_known_choices() -> Result<()> {
        let selector =
            QueuedSelector::answering(&[&["a.py:1:1:x", "ghost.py:9:9:z", "c.py:3:1:w"]]);
        let chooser = ResultSelector::new(&selector, "p");
        let chosen = chooser
            .select_many(&results(&["a.py:1:1:x", "c.py:3:1:w"]), Some("header"))?
            .expect("selection");
        let lines: Vec<_> = chosen.iter().map(SearchResult::raw).collect();
        assert_eq!(lines, vec!["a.py:1:1:x", "c.py:3:1:w"]);
        assert_eq!(selector.seen.borrow()[0].1, SelectionMode::Multi);
        Ok(())
    }

    #[test]
    fn empty_result_set_skips_selector() -> Result<()> {
        let selector = QueuedSelector::default();
        let chooser = ResultSelector::new(&selector, "p");
        assert_eq!(chooser.select_one(&ResultSet::new(), None)?, None);
        assert!(selector.seen.borrow().is_empty());
        Ok(())
    }
}
