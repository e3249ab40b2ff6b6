//! Logical slide → destination template slide.
//!
//! Precedence, first hit wins:
//! 1. explicit keyword table (singleton sections at fixed positions)
//! 2. cloning the UI or Flow master
//! 3. fuzzy title match against unconsumed template slides
//! 4. a new generic slide appended to the deck

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::render::markdown::SlideKind;
use crate::render::model::{Deck, Slide};

/// Explicit header keyword → template slide index, matched as a substring of
/// the lowercased header in declaration order. Loaded from JSON as a flat
/// list of `[keyword, index]` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideMap(pub Vec<(String, usize)>);

impl Default for SlideMap {
    fn default() -> Self {
        let entries = [
            ("problem statements", 2),
            ("vision", 3),
            ("vision and anti-vision", 3),
            ("anti-vision", 3),
            ("business goals", 4),
            ("design goals", 4),
            ("opportunity identified", 5),
            ("opportunities", 5),
            ("expected upsides", 6),
            ("overview", 7),
            ("edge cases", 10),
            ("ui dev requirement", 11),
            ("sound requirement", 12),
            ("experimentation plan", 13),
            ("tracking requirement", 14),
            ("analysis plan", 15),
        ];
        Self(entries.iter().map(|(k, i)| (k.to_string(), *i)).collect())
    }
}

impl SlideMap {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading slide map {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing slide map {}", path.display()))
    }

    pub fn lookup(&self, normalized_header: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(keyword, _)| normalized_header.contains(keyword.as_str()))
            .map(|(_, index)| *index)
    }
}

/// Where a logical slide ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Explicit(usize),
    Cloned(SlideKind, usize),
    Matched(usize),
    Created(usize),
}

impl Placement {
    pub fn index(&self) -> usize {
        match *self {
            Placement::Explicit(i)
            | Placement::Cloned(_, i)
            | Placement::Matched(i)
            | Placement::Created(i) => i,
        }
    }
}

fn master_kind(title: &str) -> Option<SlideKind> {
    let title = title.trim().to_lowercase();
    if title.contains("<screen name>") || title.ends_with(" ui") {
        Some(SlideKind::Ui)
    } else if title.contains("<flow name>") || title.ends_with(" flow") {
        Some(SlideKind::Flow)
    } else {
        None
    }
}

/// Tracks masters and consumed slides for one deck while it is filled.
pub struct TemplateMapper<'m> {
    map: &'m SlideMap,
    ui_master: Option<usize>,
    flow_master: Option<usize>,
    consumed: Vec<bool>,
}

impl<'m> TemplateMapper<'m> {
    /// Detects the masters. When a template has several candidates the first
    /// one is used.
    pub fn new(deck: &Deck, map: &'m SlideMap) -> Self {
        let mut ui_master = None;
        let mut flow_master = None;
        for (i, slide) in deck.slides.iter().enumerate() {
            match master_kind(&slide.title) {
                Some(SlideKind::Ui) if ui_master.is_none() => ui_master = Some(i),
                Some(SlideKind::Flow) if flow_master.is_none() => flow_master = Some(i),
                _ => {}
            }
        }
        if let Some(i) = ui_master {
            debug!("Found UI master at index {i}");
        }
        if let Some(i) = flow_master {
            debug!("Found Flow master at index {i}");
        }
        Self {
            map,
            ui_master,
            flow_master,
            consumed: vec![false; deck.slides.len()],
        }
    }

    fn is_master(&self, index: usize) -> bool {
        Some(index) == self.ui_master || Some(index) == self.flow_master
    }

    fn master_for(&self, kind: SlideKind) -> Option<usize> {
        match kind {
            SlideKind::Ui => self.ui_master,
            SlideKind::Flow => self.flow_master,
        }
    }

    fn append(&mut self, deck: &mut Deck, slide: Slide) -> usize {
        deck.slides.push(slide);
        self.consumed.push(true);
        deck.slides.len() - 1
    }

    /// Picks (or creates) the destination slide for `header`.
    pub fn place(&mut self, deck: &mut Deck, header: &str) -> Placement {
        let normalized = header.trim().to_lowercase();

        // Several sections may share one explicit slot (vision + anti-vision).
        if let Some(index) = self.map.lookup(&normalized) {
            if index < deck.slides.len() && !self.is_master(index) {
                self.consumed[index] = true;
                info!("Mapped '{header}' to template slide {index}");
                return Placement::Explicit(index);
            }
            debug!("Explicit slot {index} for '{header}' is not usable");
        }

        if let Some(kind) = SlideKind::classify(&normalized) {
            if let Some(master) = self.master_for(kind) {
                let clone = deck.slides[master].clone_as(header);
                let index = self.append(deck, clone);
                info!("Cloned {kind:?} master for '{header}' as slide {index}");
                return Placement::Cloned(kind, index);
            }
        }

        if !normalized.is_empty() {
            let hit = deck.slides.iter().enumerate().position(|(i, slide)| {
                let title = slide.title.trim().to_lowercase();
                !self.consumed[i]
                    && !self.is_master(i)
                    && !title.is_empty()
                    && (title.contains(&normalized) || normalized.contains(&title))
            });
            if let Some(index) = hit {
                self.consumed[index] = true;
                info!("Title matched existing slide {index} for '{header}'");
                return Placement::Matched(index);
            }
        }

        let index = self.append(deck, Slide::generic(header));
        info!("Created new slide {index} for '{header}'");
        Placement::Created(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::model::{Container, Rect};

    fn template(titles: &[&str]) -> Deck {
        Deck {
            slides: titles
                .iter()
                .map(|t| {
                    let mut s = Slide::titled(*t);
                    s.containers
                        .push(Container::with_text(Rect::new(0, 0, 10, 10), "<add text>"));
                    s
                })
                .collect(),
            ..Default::default()
        }
    }

    fn standard_template() -> Deck {
        let mut titles = vec!["Cover", "Index", "Problem Statements", "Vision", "Goals", "Opportunity",
            "Upsides", "Overview", "<Screen name> UI", "<Flow name> Flow", "Edge Cases"];
        titles.push("Feature Timeline");
        template(&titles)
    }

    #[test]
    fn test_explicit_table_allows_shared_slot() {
        let mut deck = standard_template();
        let map = SlideMap::default();
        let mut mapper = TemplateMapper::new(&deck, &map);
        assert_eq!(mapper.place(&mut deck, "Vision"), Placement::Explicit(3));
        assert_eq!(mapper.place(&mut deck, "Anti-Vision"), Placement::Explicit(3));
        assert_eq!(mapper.place(&mut deck, "Edge Cases"), Placement::Explicit(10));
    }

    #[test]
    fn test_out_of_range_explicit_slot_falls_through() {
        let mut deck = template(&["Cover", "Tracking Requirement"]);
        let map = SlideMap::default();
        let mut mapper = TemplateMapper::new(&deck, &map);
        // slot 14 does not exist in a two-slide deck; the title match still works
        assert_eq!(mapper.place(&mut deck, "Tracking Requirement"), Placement::Matched(1));
    }

    #[test]
    fn test_masters_cloned_for_each_instance() {
        let mut deck = standard_template();
        let before = deck.slides.len();
        let map = SlideMap::default();
        let mut mapper = TemplateMapper::new(&deck, &map);

        let a = mapper.place(&mut deck, "Login Screen UI");
        let b = mapper.place(&mut deck, "Shop UI");
        let c = mapper.place(&mut deck, "Onboarding Flow");
        assert_eq!(a, Placement::Cloned(SlideKind::Ui, before));
        assert_eq!(b, Placement::Cloned(SlideKind::Ui, before + 1));
        assert_eq!(c, Placement::Cloned(SlideKind::Flow, before + 2));
        assert_eq!(deck.slides[before].title, "Login Screen UI");
        assert_eq!(deck.slides[before].containers, deck.slides[8].containers);
        assert_eq!(deck.slides[8].title, "<Screen name> UI", "master itself untouched");
    }

    #[test]
    fn test_fuzzy_match_consumes_slide() {
        let mut deck = standard_template();
        let map = SlideMap::default();
        let mut mapper = TemplateMapper::new(&deck, &map);
        assert_eq!(mapper.place(&mut deck, "Timeline"), Placement::Matched(11));
        assert!(matches!(mapper.place(&mut deck, "Timeline"), Placement::Created(_)));
    }

    #[test]
    fn test_unknown_section_creates_fresh_slide_each_time() {
        let mut deck = standard_template();
        let before = deck.slides.len();
        let map = SlideMap::default();
        let mut mapper = TemplateMapper::new(&deck, &map);

        let first = mapper.place(&mut deck, "Unknown Custom Section");
        let second = mapper.place(&mut deck, "Another Unmapped Topic");
        assert_eq!(first, Placement::Created(before));
        assert_eq!(second, Placement::Created(before + 1));
        assert_eq!(deck.slides[before].title, "Unknown Custom Section");
        assert_ne!(first.index(), second.index());
    }

    #[test]
    fn test_empty_template_always_falls_back() {
        let mut deck = Deck::default();
        let map = SlideMap::default();
        let mut mapper = TemplateMapper::new(&deck, &map);
        for header in ["Vision", "Login UI", "Checkout Flow", "Overview"] {
            assert!(matches!(mapper.place(&mut deck, header), Placement::Created(_)));
        }
        assert_eq!(deck.slides.len(), 4);
    }

    #[test]
    fn test_slide_map_json_preserves_order() {
        let map: SlideMap = serde_json::from_str(r#"[["vision", 1], ["goals", 2]]"#).unwrap();
        assert_eq!(map.lookup("design goals"), Some(2));
        assert_eq!(map.lookup("vision and goals"), Some(1));
        assert_eq!(map.lookup("credits"), None);
    }
}
