//! Context budget composition.
//!
//! Every piece of assembled context (ranked features, terminology, style
//! sample, example documents, extra sections) is charged against one total
//! character budget. Pieces are admitted in priority order and the last
//! admitted piece is cut to whatever remains, so the sum never exceeds the
//! budget. Fixed prompt instructions are not part of the budget.

use serde::Serialize;
use tracing::debug;

use crate::context::index::ContextIndex;
use crate::corpus::Document;
use crate::selection::documents::{select_documents, truncate};
use crate::selection::relevance::rank_features;
use crate::text::{char_len, take_chars};

const FEATURE_SNIPPET_CHARS: usize = 200;
const STYLE_SNIPPET_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    pub total_chars: usize,
    pub max_docs: usize,
    pub max_chars_per_doc: usize,
    pub max_features: usize,
    pub max_terms: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            total_chars: 80_000,
            max_docs: 5,
            max_chars_per_doc: 8_000,
            max_features: 10,
            max_terms: 15,
        }
    }
}

/// A named block of free-text context (edge cases, uploads, design export).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSection {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssembledContext {
    /// Relevant features, terminology and a style sample.
    pub knowledge: String,
    /// Selected and truncated example documents.
    pub examples: String,
    pub sections: Vec<ContextSection>,
    pub documents_used: Vec<String>,
}

impl AssembledContext {
    pub fn total_chars(&self) -> usize {
        char_len(&self.knowledge)
            + char_len(&self.examples)
            + self.sections.iter().map(|s| char_len(&s.text)).sum::<usize>()
    }
}

struct Allowance(usize);

impl Allowance {
    /// Charges `text` against the allowance, cutting it to what remains.
    fn admit(&mut self, text: &str) -> String {
        let admitted = take_chars(text, self.0).to_string();
        self.0 -= char_len(&admitted);
        admitted
    }

    fn fits(&self, text: &str) -> bool {
        char_len(text) <= self.0
    }
}

/// Renders the index knowledge block for `request`.
pub fn render_knowledge(request: &str, index: &ContextIndex, budget: &ContextBudget) -> String {
    let mut parts = vec!["RELEVANT FEATURES:".to_string()];
    for feature in rank_features(request, index, budget.max_features) {
        let snippet = take_chars(&feature.local_context, FEATURE_SNIPPET_CHARS).replace('\n', " ");
        parts.push(format!(
            "- {} ({}): {}...",
            feature.name, feature.source_document, snippet
        ));
    }

    let terms: Vec<&str> = index.top_terms(budget.max_terms).collect();
    parts.push(format!("\nTERMINOLOGY: {}", terms.join(", ")));

    if let Some(intro) = index
        .style_sample
        .as_ref()
        .and_then(|style| style.sample_intros.first())
    {
        parts.push(format!(
            "\nSTYLE SAMPLE: {}...",
            take_chars(intro, STYLE_SNIPPET_CHARS)
        ));
    }

    parts.join("\n")
}

/// Assembles all context pieces for one request inside `budget.total_chars`.
///
/// Priority: knowledge block, then example documents (selected, then each
/// truncated), then `sections` in the order given.
pub fn compose_context(
    request: &str,
    index: &ContextIndex,
    documents: &[Document],
    sections: Vec<ContextSection>,
    budget: &ContextBudget,
) -> AssembledContext {
    let mut allowance = Allowance(budget.total_chars);
    let knowledge = allowance.admit(&render_knowledge(request, index, budget));

    let selected = select_documents(request, documents, budget.max_docs);
    let mut examples = String::new();
    let mut documents_used = Vec::new();
    for (i, doc) in selected.iter().enumerate() {
        let content = truncate(&doc.content, budget.max_chars_per_doc);
        let block = format!("--- EXAMPLE {}: {} ---\n{}\n\n", i + 1, doc.filename, content);
        if !allowance.fits(&block) {
            let note = format!(
                "\n[... {} more documents available but truncated for token efficiency ...]\n",
                selected.len() - i
            );
            if allowance.fits(&note) {
                examples.push_str(&allowance.admit(&note));
            }
            break;
        }
        examples.push_str(&allowance.admit(&block));
        documents_used.push(doc.filename.clone());
    }

    let sections = sections
        .into_iter()
        .map(|section| ContextSection {
            text: allowance.admit(&section.text),
            label: section.label,
        })
        .collect();

    let assembled = AssembledContext {
        knowledge,
        examples,
        sections,
        documents_used,
    };
    debug!(
        "Assembled {} chars of context from {} documents (budget {})",
        assembled.total_chars(),
        assembled.documents_used.len(),
        budget.total_chars
    );
    assembled
}
