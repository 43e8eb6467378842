//! Multi-pattern aggregation: run several patterns and merge their hits.

use crate::app::search::SearchExecutor;
use crate::domain::errors::SessionError;
use crate::domain::model::{Pattern, ResultSet};
use crate::infra::matcher::StructuralMatcher;

/// A pattern whose search failed, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFailure {
    pub pattern: Pattern,
    pub diagnostic: String,
}

#[derive(Debug, Default)]
pub struct Aggregation {
    /// Union of every successful pattern's hits, sorted by raw line.
    pub results: ResultSet,
    pub failures: Vec<PatternFailure>,
    /// Malformed lines dropped across all patterns.
    pub dropped: Vec<String>,
    /// Number of patterns that ran.
    pub attempted: usize,
}

impl Aggregation {
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failures.len() == self.attempted
    }
}

/// Run every pattern against the whole project and merge the results.
///
/// A failing pattern is recorded and skipped; the others still contribute. The merged set does
/// not depend on pattern order.
pub fn aggregate<M: StructuralMatcher>(
    executor: &SearchExecutor<M>,
    patterns: &[Pattern],
) -> Result<Aggregation, SessionError> {
    if patterns.is_empty() {
        return Err(SessionError::NoPatternsProvided);
    }

    let mut aggregation = Aggregation {
        attempted: patterns.len(),
        ..Aggregation::default()
    };
    let mut sets = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        match executor.execute(pattern, None) {
            Ok(outcome) => {
                aggregation.dropped.extend(outcome.dropped);
                sets.push(outcome.results);
            }
            Err(SessionError::SearchFailure { diagnostic }) => {
                tracing::warn!(pattern = pattern.text(), "pattern failed, skipping");
                aggregation.failures.push(PatternFailure {
                    pattern: pattern.clone(),
                    diagnostic,
                });
            }
            Err(other) => {
                tracing::warn!(pattern = pattern.text(), error = %other, "pattern failed, skipping");
                aggregation.failures.push(PatternFailure {
                    pattern: pattern.clone(),
                    diagnostic: other.to_string(),
                });
            }
        }
    }

    aggregation.results = ResultSet::union_sorted(sets);
    tracing::info!(
        patterns = patterns.len(),
        failed = aggregation.failures.len(),
        matches = aggregation.results.len(),
        "aggregation finished"
    );
    Ok(aggregation)
}
