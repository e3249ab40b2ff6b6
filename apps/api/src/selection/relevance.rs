//! Feature relevance: word-overlap scoring of a request against indexed features.

use std::collections::HashSet;

use crate::context::index::{ContextIndex, FeatureMention};
use crate::text::word_set;

/// Minimum shared words between request and feature name to flag an overlap.
const CONFLICT_MIN_OVERLAP: usize = 2;

/// Flags indexed features whose names share at least two words with the request.
///
/// Presence only, in index order. No overlap anywhere means an empty list.
pub fn find_conflicts(request: &str, index: &ContextIndex) -> Vec<String> {
    let request_words = word_set(request);

    index
        .features
        .iter()
        .filter(|feature| {
            word_set(&feature.name).intersection(&request_words).count() >= CONFLICT_MIN_OVERLAP
        })
        .map(|feature| {
            format!(
                "Potential overlap with existing feature: '{}' from {}",
                feature.name, feature.source_document
            )
        })
        .collect()
}

/// Ranks features by |request ∩ (name ∪ context)|, keeps positive scores,
/// sorts descending (stable on ties) and truncates to `limit`.
pub fn rank_features<'a>(
    request: &str,
    index: &'a ContextIndex,
    limit: usize,
) -> Vec<&'a FeatureMention> {
    let request_words = word_set(request);

    let mut scored: Vec<(usize, &FeatureMention)> = index
        .features
        .iter()
        .filter_map(|feature| {
            let vocabulary: HashSet<String> = word_set(&feature.name)
                .into_iter()
                .chain(word_set(&feature.local_context))
                .collect();
            let score = vocabulary.intersection(&request_words).count();
            (score > 0).then_some((score, feature))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, f)| f).collect()
}
