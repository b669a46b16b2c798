use serde::Serialize;

use crate::FeatureCollection;

/// Queries shorter than this (in characters, after trimming) are not run.
pub const MIN_QUERY_CHARS: usize = 2;

/// Maximum number of hits returned for one query.
pub const MAX_HITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Position of the feature in its collection.
    pub index: usize,
    pub name: String,
}

/// Result of a search.
///
/// `TooShort` means the query was not run at all, which a UI shows differently
/// from a query that ran and matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "hits", rename_all = "camelCase")]
pub enum SearchOutcome {
    TooShort,
    Matches(Vec<SearchHit>),
}

impl SearchOutcome {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::TooShort => &[],
            SearchOutcome::Matches(hits) => hits,
        }
    }

    pub fn is_too_short(&self) -> bool {
        matches!(self, SearchOutcome::TooShort)
    }
}

/// Lower-cased feature names in collection order.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    names: Vec<(String, String)>,
}

impl SearchIndex {
    pub fn build(collection: &FeatureCollection) -> Self {
        Self {
            names: collection
                .iter()
                .map(|f| (f.name().to_lowercase(), f.name().to_string()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-insensitive substring match, first `MAX_HITS` in collection order.
    pub fn query(&self, text: &str) -> SearchOutcome {
        let needle = text.trim().to_lowercase();
        if needle.chars().count() < MIN_QUERY_CHARS {
            return SearchOutcome::TooShort;
        }
        let hits = self
            .names
            .iter()
            .enumerate()
            .filter(|(_, (lower, _))| lower.contains(&needle))
            .take(MAX_HITS)
            .map(|(index, (_, name))| SearchHit {
                index,
                name: name.clone(),
            })
            .collect();
        SearchOutcome::Matches(hits)
    }
}
