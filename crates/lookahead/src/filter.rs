//! Candidate filtering and ranking.
//!
//! A [`Filter`] is a pure function of `(candidates, query, max_results)`. The
//! engine does not care how a filter ranks or truncates, only that the same
//! inputs always produce the same output. Three strategies ship with the
//! crate:
//!
//! - [`RelevanceFilter`]: multi-field substring match ordered by relevance
//!   tier (exact label, label prefix, everything else), then by label.
//! - [`InstantFilter`]: label/category match in input order, for small lists
//!   that are filtered on every keystroke.
//! - [`AlphabeticalFilter`]: multi-field match ordered purely by label.

use std::{cmp::Ordering, fmt, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{Level, instrument};

use crate::{candidate::Candidate, error::FilterError};

/// Selects and orders candidates for a query.
pub trait Filter: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str {
        "custom"
    }

    fn filter(
        &self,
        candidates: &[Candidate],
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Candidate>, FilterError>;
}

impl<F> Filter for F
where
    F: Fn(&[Candidate], &str, usize) -> Result<Vec<Candidate>, FilterError> + Send + Sync,
{
    fn filter(
        &self,
        candidates: &[Candidate],
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Candidate>, FilterError> {
        self(candidates, query, max_results)
    }
}

/// Relevance bucket of a match, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    /// Label equals the query, ignoring case.
    Exact,
    /// Label starts with the query, ignoring case.
    Prefix,
    /// Matched somewhere else: inside the label, category or description.
    Substring,
}

impl MatchTier {
    /// Both arguments must already be lowercase.
    pub fn classify(label: &str, needle: &str) -> Self {
        if label == needle {
            Self::Exact
        } else if label.starts_with(needle) {
            Self::Prefix
        } else {
            Self::Substring
        }
    }
}

/// Lowercased needle, or `None` when the query is blank.
fn needle(query: &str) -> Option<String> {
    if query.trim().is_empty() {
        None
    } else {
        Some(query.to_lowercase())
    }
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

/// Case-insensitive label order, falling back to the raw label so ties are
/// still deterministic.
fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// The default filter: tiered relevance over label, category and description.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceFilter;

impl Filter for RelevanceFilter {
    fn name(&self) -> &str {
        "relevance"
    }

    #[instrument(skip_all, level = Level::TRACE, name = "relevance_filter", fields(query = %query))]
    fn filter(
        &self,
        candidates: &[Candidate],
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Candidate>, FilterError> {
        let Some(needle) = needle(query) else {
            return Ok(Vec::new());
        };

        Ok(candidates
            .iter()
            .filter_map(|candidate| {
                let label = candidate.label.to_lowercase();
                let hit = label.contains(&needle)
                    || contains(candidate.category.as_deref(), &needle)
                    || contains(candidate.description.as_deref(), &needle);
                hit.then(|| (MatchTier::classify(&label, &needle), candidate))
            })
            .sorted_by(|(tier_a, a), (tier_b, b)| {
                tier_a
                    .cmp(tier_b)
                    .then_with(|| compare_labels(&a.label, &b.label))
            })
            .take(max_results)
            .map(|(_, candidate)| candidate.clone())
            .collect())
    }
}

/// Label or category substring match, kept in input order.
///
/// Never returns more than `limit` results, whatever the engine asks for.
#[derive(Debug, Clone, Copy)]
pub struct InstantFilter {
    pub limit: usize,
}

impl Default for InstantFilter {
    fn default() -> Self {
        Self { limit: 8 }
    }
}

impl Filter for InstantFilter {
    fn name(&self) -> &str {
        "instant"
    }

    fn filter(
        &self,
        candidates: &[Candidate],
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Candidate>, FilterError> {
        let Some(needle) = needle(query) else {
            return Ok(Vec::new());
        };

        Ok(candidates
            .iter()
            .filter(|c| {
                contains(Some(c.label.as_str()), &needle) || contains(c.category.as_deref(), &needle)
            })
            .take(self.limit.min(max_results))
            .cloned()
            .collect())
    }
}

/// Multi-field match ordered alphabetically by label, capped at `limit`.
#[derive(Debug, Clone, Copy)]
pub struct AlphabeticalFilter {
    pub limit: usize,
}

impl Default for AlphabeticalFilter {
    fn default() -> Self {
        Self { limit: 6 }
    }
}

impl Filter for AlphabeticalFilter {
    fn name(&self) -> &str {
        "alphabetical"
    }

    fn filter(
        &self,
        candidates: &[Candidate],
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Candidate>, FilterError> {
        let Some(needle) = needle(query) else {
            return Ok(Vec::new());
        };

        Ok(candidates
            .iter()
            .filter(|c| c.fields().any(|field| contains(Some(field), &needle)))
            .sorted_by(|a, b| compare_labels(&a.label, &b.label))
            .take(self.limit.min(max_results))
            .cloned()
            .collect())
    }
}

/// Built-in filters selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStrategy {
    #[default]
    Relevance,
    Instant,
    Alphabetical,
}

impl FilterStrategy {
    pub fn build(self) -> Box<dyn Filter> {
        match self {
            Self::Relevance => Box::new(RelevanceFilter),
            Self::Instant => Box::new(InstantFilter::default()),
            Self::Alphabetical => Box::new(AlphabeticalFilter::default()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Instant => "instant",
            Self::Alphabetical => "alphabetical",
        }
    }
}

impl fmt::Display for FilterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relevance" => Ok(Self::Relevance),
            "instant" => Ok(Self::Instant),
            "alphabetical" => Ok(Self::Alphabetical),
            other => Err(format!(
                "unknown filter {other:?}; expected relevance, instant or alphabetical"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> Vec<Candidate> {
        vec![
            Candidate::builder()
                .id("1")
                .label("JavaScript")
                .category("Programming Language")
                .description("Dynamic programming language for web development")
                .build(),
            Candidate::builder()
                .id("2")
                .label("TypeScript")
                .category("Programming Language")
                .description("JavaScript with static type definitions")
                .build(),
            Candidate::builder()
                .id("4")
                .label("Java")
                .category("Programming Language")
                .build(),
            Candidate::builder()
                .id("6")
                .label("React")
                .category("Frontend Framework")
                .description("JavaScript library for building user interfaces")
                .build(),
            Candidate::builder()
                .id("11")
                .label("MongoDB")
                .category("Database")
                .build(),
        ]
    }

    fn labels(results: &[Candidate]) -> Vec<&str> {
        results.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn exact_match_ranks_first() {
        let candidates = vec![Candidate::new("a", "JavaScript"), Candidate::new("b", "Java")];
        let results = RelevanceFilter.filter(&candidates, "Java", 10).unwrap();
        assert_eq!(labels(&results), vec!["Java", "JavaScript"]);
    }

    #[test]
    fn tiers_then_labels() {
        let results = RelevanceFilter.filter(&catalog(), "java", 10).unwrap();
        // exact, prefix, then description matches alphabetically
        assert_eq!(
            labels(&results),
            vec!["Java", "JavaScript", "React", "TypeScript"]
        );
    }

    #[test]
    fn matches_category_and_description() {
        let results = RelevanceFilter.filter(&catalog(), "DATABASE", 10).unwrap();
        assert_eq!(labels(&results), vec!["MongoDB"]);

        let results = RelevanceFilter.filter(&catalog(), "user interfaces", 10).unwrap();
        assert_eq!(labels(&results), vec!["React"]);
    }

    #[test]
    fn blank_query_matches_nothing() {
        assert!(RelevanceFilter.filter(&catalog(), "   ", 10).unwrap().is_empty());
        assert!(RelevanceFilter.filter(&catalog(), "", 10).unwrap().is_empty());
        assert!(RelevanceFilter.filter(&[], "java", 10).unwrap().is_empty());
    }

    #[test]
    fn truncates_after_sorting() {
        let results = RelevanceFilter.filter(&catalog(), "java", 2).unwrap();
        assert_eq!(labels(&results), vec!["Java", "JavaScript"]);
    }

    #[test]
    fn filtering_is_deterministic() {
        let candidates = catalog();
        let first = RelevanceFilter.filter(&candidates, "script", 10).unwrap();
        let second = RelevanceFilter.filter(&candidates, "script", 10).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn instant_filter_keeps_input_order() {
        let results = InstantFilter::default()
            .filter(&catalog(), "script", 10)
            .unwrap();
        assert_eq!(labels(&results), vec!["JavaScript", "TypeScript"]);

        // descriptions are not searched
        let results = InstantFilter::default()
            .filter(&catalog(), "user interfaces", 10)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn alphabetical_filter_caps_results() {
        let filter = AlphabeticalFilter { limit: 2 };
        let results = filter.filter(&catalog(), "a", 10).unwrap();
        assert_eq!(labels(&results), vec!["Java", "JavaScript"]);
    }

    #[test]
    fn closures_are_filters() {
        let first_only = |candidates: &[Candidate], _: &str, _: usize| {
            Ok::<Vec<Candidate>, FilterError>(candidates.iter().take(1).cloned().collect())
        };
        let results = first_only.filter(&catalog(), "anything", 10).unwrap();
        assert_eq!(labels(&results), vec!["JavaScript"]);
        assert_eq!(Filter::name(&first_only), "custom");
    }

    #[test]
    fn strategy_round_trips_through_str() {
        for strategy in [
            FilterStrategy::Relevance,
            FilterStrategy::Instant,
            FilterStrategy::Alphabetical,
        ] {
            assert_eq!(strategy.to_string().parse::<FilterStrategy>(), Ok(strategy));
            assert_eq!(strategy.build().name(), strategy.as_str());
        }
        assert!("fuzzy".parse::<FilterStrategy>().is_err());
    }
}
