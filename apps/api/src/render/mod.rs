//! Template-driven deck rendering.
//!
//! markdown → [`markdown::parse`] → image prefetch → [`mapper::TemplateMapper`]
//! → [`filler::fill_slide`] for each logical slide, in order, against a deck
//! owned by the calling request.

pub mod filler;
pub mod image;
pub mod images;
pub mod mapper;
pub mod markdown;
pub mod model;
pub mod placeholders;
pub mod triggers;

use std::collections::HashMap;

use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::text::strip_bullet;
use images::ImageFetcher;
use mapper::{Placement, SlideMap, TemplateMapper};
use markdown::ParsedDocument;
use model::{Deck, Paragraph, Slide};

/// One row of the placement report returned alongside the deck.
#[derive(Debug, Clone, Serialize)]
pub struct SlidePlacement {
    pub header: String,
    pub slide_index: usize,
    pub strategy: &'static str,
}

impl SlidePlacement {
    fn new(header: &str, placement: Placement) -> Self {
        let strategy = match placement {
            Placement::Explicit(_) => "explicit",
            Placement::Cloned(..) => "cloned",
            Placement::Matched(_) => "matched",
            Placement::Created(_) => "created",
        };
        Self {
            header: header.to_string(),
            slide_index: placement.index(),
            strategy,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedDeck {
    pub title: Option<String>,
    pub deck: Deck,
    pub placements: Vec<SlidePlacement>,
}

/// A freshly created generic slide has no triggers, so its body simply
/// lists the content lines.
fn write_body(slide: &mut Slide, lines: &[String]) {
    if let Some(body) = slide.containers.first_mut() {
        body.paragraphs = lines
            .iter()
            .map(|l| Paragraph::plain(strip_bullet(l)))
            .collect();
    }
}

/// Places and fills every parsed slide. Never fails: unmatched sections get
/// a new slide, missing images degrade to link text.
pub fn fill_deck(
    mut deck: Deck,
    doc: &ParsedDocument,
    map: &SlideMap,
    images: &HashMap<String, Bytes>,
) -> RenderedDeck {
    let mut mapper = TemplateMapper::new(&deck, map);
    let mut placements = Vec::with_capacity(doc.slides.len());

    for logical in &doc.slides {
        let placement = mapper.place(&mut deck, &logical.header);
        let slide = &mut deck.slides[placement.index()];
        match placement {
            Placement::Created(_) => write_body(slide, &logical.content_lines),
            _ => filler::fill_slide(slide, &logical.content_lines, images),
        }
        placements.push(SlidePlacement::new(&logical.header, placement));
    }

    RenderedDeck {
        title: doc.title.clone(),
        deck,
        placements,
    }
}

/// Parses `markdown`, downloads the images it references, and fills a copy
/// of `template`.
pub async fn render_markdown(
    template: Deck,
    markdown: &str,
    map: &SlideMap,
    fetcher: &dyn ImageFetcher,
) -> RenderedDeck {
    let doc = markdown::parse(markdown);
    info!("Parsed {} slides from markdown", doc.slides.len());

    let urls = images::image_urls(&doc.slides);
    let images = images::download_all(fetcher, urls).await;

    fill_deck(template, &doc, map, &images)
}
