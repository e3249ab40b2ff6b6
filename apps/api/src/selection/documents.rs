//! Document selection and truncation, the primary and secondary levers for
//! keeping example documents inside the prompt budget.

use crate::corpus::Document;
use crate::text::{is_section_heading, take_chars, word_set};

/// Below this many selected documents we backfill for style reference.
const MIN_STYLE_DOCS: usize = 3;
const FILENAME_WEIGHT: usize = 3;
const CONTENT_SAMPLE_CHARS: usize = 2000;

const HEAD_SHARE: f64 = 0.3;
const TAIL_SHARE: f64 = 0.2;
const HEAD_LINES: usize = 50;
const TAIL_LINES: usize = 30;
const MAX_SAMPLED_SECTIONS: usize = 5;
const SECTION_LINES: usize = 20;

pub const KEY_SECTIONS_MARKER: &str = "\n\n[... key sections ...]\n\n";
pub const END_MARKER: &str = "\n\n[... end ...]\n\n";

/// Picks at most `max_docs` documents relevant to `request`.
///
/// Small corpora are returned whole, in order. Otherwise documents are scored
/// `3 × filename overlap + overlap with the first 2000 chars`, sorted
/// descending (stable), and backfilled in corpus order when fewer than three
/// were picked from a corpus of at least three.
pub fn select_documents<'a>(
    request: &str,
    documents: &'a [Document],
    max_docs: usize,
) -> Vec<&'a Document> {
    if documents.len() <= max_docs {
        return documents.iter().collect();
    }

    let request_words = word_set(request);
    let mut scored: Vec<(usize, usize, &Document)> = documents
        .iter()
        .enumerate()
        .map(|(position, doc)| {
            let filename_words = word_set(&doc.filename.replace(['.', '_'], " "));
            let content_words = word_set(take_chars(&doc.content, CONTENT_SAMPLE_CHARS));
            let score = FILENAME_WEIGHT * filename_words.intersection(&request_words).count()
                + content_words.intersection(&request_words).count();
            (score, position, doc)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let mut selected: Vec<(usize, &Document)> = scored
        .into_iter()
        .take(max_docs)
        .map(|(_, position, doc)| (position, doc))
        .collect();

    if selected.len() < MIN_STYLE_DOCS && documents.len() >= MIN_STYLE_DOCS {
        for (position, doc) in documents.iter().enumerate() {
            if selected.len() >= MIN_STYLE_DOCS {
                break;
            }
            if !selected.iter().any(|(p, _)| *p == position) {
                selected.push((position, doc));
            }
        }
    }

    selected.into_iter().map(|(_, doc)| doc).collect()
}

/// Shrinks a document to `max_chars` while keeping its shape: the opening
/// lines, a sample of `##` sections and the closing lines.
///
/// Output never exceeds `max_chars` characters, and the same input always
/// produces the same output.
pub fn truncate(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let header_indices: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_section_heading(line))
        .map(|(i, _)| i)
        .collect();

    let head_budget = (max_chars as f64 * HEAD_SHARE) as usize;
    let tail_budget = (max_chars as f64 * TAIL_SHARE) as usize;
    let middle_budget = max_chars - head_budget - tail_budget;

    let head = lines[..lines.len().min(HEAD_LINES)].join("\n");

    let mut middle = String::new();
    if !header_indices.is_empty() {
        let step = (header_indices.len() / MAX_SAMPLED_SECTIONS).max(1);
        for &idx in header_indices.iter().step_by(step).take(MAX_SAMPLED_SECTIONS) {
            let end = (idx + SECTION_LINES).min(lines.len());
            middle.push_str(&lines[idx..end].join("\n"));
            middle.push_str("\n\n");
        }
    }

    let tail = lines[lines.len().saturating_sub(TAIL_LINES)..].join("\n");

    let mut result = take_chars(&head, head_budget).to_string();
    if !middle.is_empty() {
        result.push_str(KEY_SECTIONS_MARKER);
        result.push_str(take_chars(&middle, middle_budget));
    }
    result.push_str(END_MARKER);
    result.push_str(take_chars(&tail, tail_budget));

    take_chars(&result, max_chars).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn docs(specs: &[(&str, &str)]) -> Vec<Document> {
        specs.iter().map(|(n, c)| Document::new(*n, *c)).collect()
    }

    #[test]
    fn test_small_corpus_returned_unchanged() {
        let corpus = docs(&[("b.md", "x"), ("a.md", "y")]);
        let selected = select_documents("anything", &corpus, 5);
        let names: Vec<_> = selected.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["b.md", "a.md"]);
    }

    #[test]
    fn test_filename_matches_outweigh_content() {
        let corpus = docs(&[
            ("misc.md", "battle pass rewards tiers"),
            ("battle_pass.md", "unrelated"),
            ("shop.md", "gems"),
            ("events.md", "calendar"),
        ]);
        let selected = select_documents("battle pass tiers", &corpus, 2);
        let names: Vec<_> = selected.iter().map(|d| d.filename.as_str()).collect();
        // battle_pass.md: 3*2 = 6; misc.md: 3 content words
        assert_eq!(names, vec!["battle_pass.md", "misc.md", "shop.md"]);
    }

    #[test]
    fn test_backfill_to_three_for_style_reference() {
        let corpus = docs(&[("a.md", "x"), ("b.md", "y"), ("c.md", "z"), ("d.md", "w")]);
        let selected = select_documents("z", &corpus, 1);
        let names: Vec<_> = selected.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["c.md", "a.md", "b.md"]);
    }

    #[test]
    fn test_never_more_than_max_docs_when_max_at_least_three() {
        let corpus: Vec<Document> = (0..10)
            .map(|i| Document::new(format!("doc{i}.md"), "text"))
            .collect();
        assert_eq!(select_documents("text", &corpus, 4).len(), 4);
    }

    #[test]
    fn test_truncate_short_document_unchanged() {
        assert_eq!(truncate("short", 100), "short");
    }

    #[test]
    fn test_truncate_keeps_head_sections_and_tail() {
        let mut content = String::from("Intro line\n");
        for i in 0..12 {
            content.push_str(&format!("## Section {i}\n"));
            for j in 0..30 {
                content.push_str(&format!("detail {i}-{j}\n"));
            }
        }
        content.push_str("Closing line");

        let out = truncate(&content, 4000);
        assert!(out.chars().count() <= 4000);
        assert!(out.starts_with("Intro line"));
        assert!(out.contains("[... key sections ...]"));
        assert!(out.contains("[... end ...]"));
        assert!(out.ends_with("Closing line"));
        // 12 headers → step 2 → sections 0, 2, 4, 6, 8 sampled
        assert!(out.contains("## Section 0\n"));
        assert!(out.contains("## Section 8\n"));
    }

    #[test]
    fn test_truncate_without_headers_skips_section_marker() {
        let content = "line\n".repeat(2000);
        let out = truncate(&content, 500);
        assert!(!out.contains("[... key sections ...]"));
        assert!(out.contains("[... end ...]"));
    }

    #[test]
    fn test_truncate_is_deterministic() {
        let content = "## A\nbody\n".repeat(500);
        assert_eq!(truncate(&content, 700), truncate(&content, 700));
    }

    proptest! {
        #[test]
        fn prop_truncate_never_exceeds_budget(
            content in "(## [a-z]{1,8}\n|[a-zé ]{0,40}\n){0,200}",
            max_chars in 0usize..3000,
        ) {
            let out = truncate(&content, max_chars);
            prop_assert!(out.chars().count() <= max_chars);
            if content.chars().count() <= max_chars {
                prop_assert_eq!(out, content);
            }
        }
    }
}
