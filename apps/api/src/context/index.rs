//! Context Index: a corpus-wide knowledge summary built in one scan.
//!
//! Everything here is pure and deterministic: the same corpus always yields the
//! same index. Caching and persistence live in `context::cache`.

use serde::{Deserialize, Serialize};

use crate::corpus::Document;
use crate::text::{char_len, heading_text, is_section_heading, take_chars};

// ────────────────────────────────────────────────────────────────────────────
// Controlled vocabularies
// ────────────────────────────────────────────────────────────────────────────

/// Game-domain terms whose frequency is tracked across the corpus.
pub const GAME_TERMS: &[&str] = &[
    "player", "reward", "currency", "level", "progression", "unlock",
    "shop", "purchase", "daily", "quest", "mission", "achievement",
    "leaderboard", "tournament", "event", "season", "battle pass",
    "inventory", "collection", "upgrade", "boost", "power-up",
    "matchmaking", "pvp", "pve", "multiplayer", "social",
    "notification", "popup", "modal", "screen", "flow", "ui",
];

/// UI vocabulary recorded by presence only.
pub const UI_KEYWORDS: &[&str] = &[
    "button", "header", "footer", "popup", "modal", "screen",
    "tab", "menu", "icon", "banner", "card", "list",
];

/// `Label:` prefixes that mark a UI field line in prior specs.
pub const UI_FIELD_LABELS: &[&str] = &["Header:", "CTA:", "Mockup:", "Sub text:"];

/// Sentence openers typical of the house writing style.
pub const PHRASE_INDICATORS: &[&str] = &[
    "This feature", "The player", "When the user", "Upon",
    "The goal is", "This allows", "Players can", "The system",
];

pub const MAX_TERMS: usize = 50;
pub const FEATURE_CONTEXT_LINES: usize = 5;
pub const FEATURE_CONTEXT_CHARS: usize = 500;
pub const FLOW_CONTEXT_LINES: usize = 10;
pub const FLOW_CONTEXT_CHARS: usize = 800;
const STYLE_SAMPLE_DOCS: usize = 5;
const STYLE_INTROS: usize = 2;
const STYLE_INTRO_CHARS: usize = 500;
const STYLE_MAX_PHRASES: usize = 10;
const STYLE_PHRASE_CHARS: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub document_count: usize,
    pub total_chars: usize,
}

/// A second-level heading seen in a source document. Duplicates across
/// documents are kept: they signal prior art.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMention {
    pub name: String,
    pub source_document: String,
    /// At most `FEATURE_CONTEXT_CHARS` characters.
    pub local_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patterns {
    pub section_headers: Vec<String>,
    pub ui_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMention {
    pub name: String,
    pub source_document: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSample {
    pub avg_line_length: usize,
    pub sample_intros: Vec<String>,
    pub common_phrases: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextIndex {
    pub stats: CorpusStats,
    pub features: Vec<FeatureMention>,
    /// Ordered by count descending, ties in `GAME_TERMS` order.
    pub terminology: Vec<TermCount>,
    pub patterns: Patterns,
    pub ui_elements: Vec<String>,
    pub flows: Vec<FlowMention>,
    /// `None` for an empty corpus.
    pub style_sample: Option<StyleSample>,
}

impl ContextIndex {
    /// Scans every document once. An empty corpus yields a zero-count index.
    pub fn build(documents: &[Document]) -> Self {
        Self {
            stats: CorpusStats {
                document_count: documents.len(),
                total_chars: documents.iter().map(|d| char_len(&d.content)).sum(),
            },
            features: extract_features(documents),
            terminology: extract_terminology(documents),
            patterns: extract_patterns(documents),
            ui_elements: extract_ui_elements(documents),
            flows: extract_flows(documents),
            style_sample: build_style_sample(&documents[..documents.len().min(STYLE_SAMPLE_DOCS)]),
        }
    }

    /// The `n` most frequent terms.
    pub fn top_terms(&self, n: usize) -> impl Iterator<Item = &str> {
        self.terminology.iter().take(n).map(|t| t.term.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extractors
// ────────────────────────────────────────────────────────────────────────────

fn following_lines(lines: &[&str], idx: usize, count: usize) -> String {
    let end = (idx + 1 + count).min(lines.len());
    lines[(idx + 1).min(end)..end].join("\n")
}

fn extract_features(documents: &[Document]) -> Vec<FeatureMention> {
    let mut features = Vec::new();
    for doc in documents {
        let lines: Vec<&str> = doc.content.split('\n').collect();
        for (i, line) in lines.iter().enumerate() {
            if !is_section_heading(line) {
                continue;
            }
            let context = following_lines(&lines, i, FEATURE_CONTEXT_LINES);
            features.push(FeatureMention {
                name: heading_text(line),
                source_document: doc.filename.clone(),
                local_context: take_chars(&context, FEATURE_CONTEXT_CHARS).to_string(),
            });
        }
    }
    features
}

fn extract_terminology(documents: &[Document]) -> Vec<TermCount> {
    let mut counts = vec![0usize; GAME_TERMS.len()];
    for doc in documents {
        let lower = doc.content.to_lowercase();
        for (slot, term) in counts.iter_mut().zip(GAME_TERMS) {
            *slot += lower.matches(term).count();
        }
    }

    let mut table: Vec<TermCount> = GAME_TERMS
        .iter()
        .zip(counts)
        .map(|(term, count)| TermCount {
            term: term.to_string(),
            count,
        })
        .collect();
    // Stable: equal counts keep vocabulary order.
    table.sort_by(|a, b| b.count.cmp(&a.count));
    table.truncate(MAX_TERMS);
    table
}

fn extract_patterns(documents: &[Document]) -> Patterns {
    let mut patterns = Patterns::default();
    for doc in documents {
        for line in doc.content.split('\n') {
            if is_section_heading(line) {
                let header = heading_text(line);
                if !patterns.section_headers.contains(&header) {
                    patterns.section_headers.push(header);
                }
            }
            if UI_FIELD_LABELS.iter().any(|label| line.contains(label)) {
                patterns.ui_patterns.push(line.trim().to_string());
            }
        }
    }
    patterns
}

fn extract_ui_elements(documents: &[Document]) -> Vec<String> {
    let lowered: Vec<String> = documents.iter().map(|d| d.content.to_lowercase()).collect();
    UI_KEYWORDS
        .iter()
        .filter(|kw| lowered.iter().any(|text| text.contains(*kw)))
        .map(|kw| kw.to_string())
        .collect()
}

fn extract_flows(documents: &[Document]) -> Vec<FlowMention> {
    let mut flows = Vec::new();
    for doc in documents {
        let lines: Vec<&str> = doc.content.split('\n').collect();
        for (i, line) in lines.iter().enumerate() {
            if !(line.starts_with("##") && line.to_lowercase().contains("flow")) {
                continue;
            }
            let description = following_lines(&lines, i, FLOW_CONTEXT_LINES);
            flows.push(FlowMention {
                name: heading_text(line),
                source_document: doc.filename.clone(),
                description: take_chars(&description, FLOW_CONTEXT_CHARS).to_string(),
            });
        }
    }
    flows
}

fn build_style_sample(sample: &[Document]) -> Option<StyleSample> {
    if sample.is_empty() {
        return None;
    }
    let total_chars: usize = sample.iter().map(|d| char_len(&d.content)).sum();
    let total_lines: usize = sample.iter().map(|d| d.content.matches('\n').count()).sum();

    Some(StyleSample {
        avg_line_length: total_chars / total_lines.max(1),
        sample_intros: sample
            .iter()
            .take(STYLE_INTROS)
            .map(|d| take_chars(&d.content, STYLE_INTRO_CHARS).to_string())
            .collect(),
        common_phrases: extract_common_phrases(sample),
    })
}

/// First sentence per (document, indicator) pair that contains the indicator.
fn extract_common_phrases(documents: &[Document]) -> Vec<String> {
    let mut phrases = Vec::new();
    for doc in documents {
        for phrase in PHRASE_INDICATORS {
            if let Some(sentence) = doc.content.split('.').find(|s| s.contains(phrase)) {
                phrases.push(take_chars(sentence.trim(), STYLE_PHRASE_CHARS).to_string());
            }
        }
    }
    phrases.truncate(STYLE_MAX_PHRASES);
    phrases
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
