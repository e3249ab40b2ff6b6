//! GDD generation pipeline.
//!
//! reference material → conflicts + budgeted context → prompt → model
//! fallback chain → image placeholder substitution. Rendering the result
//! onto a deck template is left to [`crate::render`].

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::context::index::ContextIndex;
use crate::corpus::{self, CorpusError, CorpusPaths, Document};
use crate::figma::{self, FigmaApi, FigmaExport};
use crate::generation::prompts::build_generation_prompt;
use crate::llm_client::{generate_with_fallback, LlmError, TextCompletion, MAX_TOKENS, MODEL_CHAIN};
use crate::render::model::Deck;
use crate::render::placeholders::substitute_images;
use crate::selection::budget::ContextSection;
use crate::selection::{compose_context, find_conflicts, ContextBudget};

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub figma_token: Option<String>,
    pub figma_url: Option<String>,
}

impl GenerateRequest {
    /// Token and URL, when both are present and non-blank.
    pub fn figma_source(&self) -> Option<(&str, &str)> {
        let token = self.figma_token.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        let url = self.figma_url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        Some((token, url))
    }
}

/// Everything read from the data directory for one generation.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMaterial {
    pub documents: Vec<Document>,
    pub edge_cases: String,
    pub extra_context: String,
}

impl ReferenceMaterial {
    pub fn load(paths: &CorpusPaths) -> Result<Self, CorpusError> {
        Ok(Self {
            documents: corpus::load_reference_corpus(paths)?,
            edge_cases: corpus::load_edge_cases(&paths.edge_cases)?,
            extra_context: corpus::load_context_uploads(&paths.context_uploads)?,
        })
    }
}

/// Outcome of the optional design-file export.
#[derive(Debug, Default)]
pub enum DesignSource {
    #[default]
    None,
    Export(FigmaExport),
    Failed(String),
}

impl DesignSource {
    /// Exports the design file. A failure is kept as text for the prompt
    /// rather than failing the generation.
    pub async fn fetch(api: &dyn FigmaApi, url: &str) -> Self {
        info!("Fetching Figma data...");
        match figma::export(api, url).await {
            Ok(export) => DesignSource::Export(export),
            Err(e) => {
                warn!("Error fetching Figma data: {e}");
                DesignSource::Failed(e.to_string())
            }
        }
    }

    fn prompt_section(&self) -> Option<String> {
        match self {
            DesignSource::None => None,
            DesignSource::Export(export) => Some(export.prompt_section()),
            DesignSource::Failed(e) => Some(format!("Error fetching Figma data: {e}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedSpec {
    /// Generated markdown with image placeholders substituted.
    pub markdown: String,
    pub conflicts: Vec<String>,
    pub documents_used: Vec<String>,
    pub context_chars: usize,
}

fn context_sections(material: &ReferenceMaterial, design: &DesignSource) -> Vec<ContextSection> {
    let mut sections = Vec::new();
    let mut push = |label: &str, text: String| {
        if !text.trim().is_empty() {
            sections.push(ContextSection {
                label: label.to_string(),
                text,
            });
        }
    };
    push("Edge Cases", material.edge_cases.clone());
    push("Additional User Context", material.extra_context.clone());
    if let Some(text) = design.prompt_section() {
        push("Figma Data (JSON)", text);
    }
    sections
}

/// Runs one generation against the model chain.
pub async fn generate_spec(
    llm: &dyn TextCompletion,
    request: &str,
    index: &ContextIndex,
    material: &ReferenceMaterial,
    design: &DesignSource,
    budget: &ContextBudget,
) -> Result<GeneratedSpec, LlmError> {
    let conflicts = find_conflicts(request, index);
    if !conflicts.is_empty() {
        info!("Request overlaps existing features: {}", conflicts.join(", "));
    }

    let context = compose_context(
        request,
        index,
        &material.documents,
        context_sections(material, design),
        budget,
    );
    let prompt = build_generation_prompt(request, &context, &conflicts);
    info!(
        "Constructed prompt: {} chars ({} chars of context, {} example documents)",
        prompt.len(),
        context.total_chars(),
        context.documents_used.len()
    );

    let text = generate_with_fallback(llm, &prompt, MODEL_CHAIN, MAX_TOKENS).await?;

    let markdown = match design {
        DesignSource::Export(export) => {
            info!(
                "Substituting {} images and {} links into generated text",
                export.images.len(),
                export.links.len()
            );
            substitute_images(&text, &export.images, &export.links)
        }
        _ => text,
    };

    Ok(GeneratedSpec {
        markdown,
        conflicts,
        context_chars: context.total_chars(),
        documents_used: context.documents_used,
    })
}

/// Deck template: `explicit` when configured, else the first template in
/// `slides_dir`, else an empty deck. Unreadable templates degrade to empty.
pub fn load_template(explicit: Option<&Path>, slides_dir: &Path) -> Deck {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => corpus::find_template(slides_dir).unwrap_or_else(|e| {
            warn!("Template lookup failed: {e}");
            None
        }),
    };

    let Some(path) = path else {
        info!("No deck template found; rendering onto an empty deck");
        return Deck::default();
    };

    match Deck::load(&path) {
        Ok(deck) => {
            info!("Loaded deck template {} ({} slides)", path.display(), deck.slides.len());
            deck
        }
        Err(e) => {
            warn!("Could not load deck template: {e:#}");
            Deck::default()
        }
    }
}

/// Markdown as shown to the user: HTML tags removed.
pub fn strip_html_tags(markdown: &str) -> String {
    HTML_TAG.replace_all(markdown, "").into_owned()
}
