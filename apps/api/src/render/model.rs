//! In-memory deck model. Templates are loaded from JSON, mutated by a single
//! generation request, and serialized back out once filling is done.
//!
//! Geometry is in EMU (English Metric Units, 914400 per inch) so positions
//! copied from presentation files keep their exact values.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SLIDE_WIDTH: i64 = 12_192_000;
pub const DEFAULT_SLIDE_HEIGHT: i64 = 6_858_000;

/// Body area of the generic "title and content" layout.
pub const GENERIC_BODY_BOUNDS: Rect = Rect {
    left: 838_200,
    top: 1_825_625,
    width: 10_515_600,
    height: 4_351_338,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub const fn new(left: i64, top: i64, width: i64, height: i64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.left + other.width <= self.left + self.width
            && other.top + other.height <= self.top + self.height
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub runs: Vec<TextRun>,
    /// Bullet indentation level.
    #[serde(default)]
    pub level: u8,
}

impl Paragraph {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            runs: vec![TextRun::plain(text)],
            level: 0,
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Drops every run but keeps the paragraph (and its level) in place.
    pub fn clear(&mut self) {
        self.runs.clear();
    }
}

/// A text box or shape with a text frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub bounds: Rect,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl Container {
    pub fn with_text(bounds: Rect, text: &str) -> Self {
        let mut container = Self {
            bounds,
            paragraphs: Vec::new(),
        };
        container.set_text(text);
        container
    }

    /// Full text, paragraphs joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replaces the whole text frame, one paragraph per line.
    pub fn set_text(&mut self, text: &str) {
        self.paragraphs = text.split('\n').map(Paragraph::plain).collect();
    }

    /// Empties the text frame. The container itself stays on the slide.
    pub fn clear(&mut self) {
        self.paragraphs.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(|p| p.text().trim().is_empty())
    }
}

/// An image placed on a slide. Pixel size is kept alongside the placed
/// bounds so consumers can check the aspect ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub source_url: String,
    pub bounds: Rect,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub pictures: Vec<Picture>,
}

impl Slide {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// A new slide with the generic title-and-content layout.
    pub fn generic(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            containers: vec![Container {
                bounds: GENERIC_BODY_BOUNDS,
                paragraphs: Vec::new(),
            }],
            pictures: Vec::new(),
        }
    }

    /// Copy of this slide's placeholder structure under a new title.
    /// Pictures are not carried over.
    pub fn clone_as(&self, title: &str) -> Self {
        Self {
            title: title.to_string(),
            containers: self.containers.clone(),
            pictures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    #[serde(default = "default_width")]
    pub slide_width: i64,
    #[serde(default = "default_height")]
    pub slide_height: i64,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

fn default_width() -> i64 {
    DEFAULT_SLIDE_WIDTH
}

fn default_height() -> i64 {
    DEFAULT_SLIDE_HEIGHT
}

impl Default for Deck {
    fn default() -> Self {
        Self {
            slide_width: DEFAULT_SLIDE_WIDTH,
            slide_height: DEFAULT_SLIDE_HEIGHT,
            slides: Vec::new(),
        }
    }
}

impl Deck {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Loads a JSON template from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading deck template {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing deck template {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_text_roundtrips_lines() {
        let mut c = Container::with_text(Rect::default(), "Header : x\nSub text : y");
        assert_eq!(c.paragraphs.len(), 2);
        assert_eq!(c.text(), "Header : x\nSub text : y");
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.text(), "");
    }

    #[test]
    fn test_deck_json_defaults() {
        let deck = Deck::from_json(
            r#"{"slides":[{"title":"Vision","containers":[{"bounds":{"left":0,"top":0,"width":10,"height":10},
                "paragraphs":[{"runs":[{"text":"<add vision here>"}]}]}]}]}"#,
        )
        .unwrap();
        assert_eq!(deck.slide_width, DEFAULT_SLIDE_WIDTH);
        assert_eq!(deck.slides[0].containers[0].text(), "<add vision here>");
        assert!(deck.slides[0].pictures.is_empty());
    }

    #[test]
    fn test_clone_as_copies_structure_not_pictures() {
        let mut master = Slide::titled("<Screen name> UI");
        master
            .containers
            .push(Container::with_text(Rect::new(0, 0, 5, 5), "Header : <add header>"));
        master.pictures.push(Picture {
            source_url: "u".into(),
            bounds: Rect::default(),
            pixel_width: 1,
            pixel_height: 1,
        });
        let clone = master.clone_as("Login UI");
        assert_eq!(clone.title, "Login UI");
        assert_eq!(clone.containers, master.containers);
        assert!(clone.pictures.is_empty());
    }

    #[test]
    fn test_rect_contains() {
        let outer = Rect::new(0, 0, 100, 100);
        assert!(outer.contains(&Rect::new(10, 10, 80, 80)));
        assert!(!outer.contains(&Rect::new(10, 10, 95, 10)));
    }
}
