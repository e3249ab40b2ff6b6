//! Frame extraction and the prompt-facing summary of a Figma file.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::{FigmaFile, Node};
use crate::text::{char_len, take_chars};

pub const SUMMARY_MAX_FRAMES: usize = 20;
pub const SUMMARY_FRAME_TEXT_CHARS: usize = 500;
pub const SUMMARY_MAX_TRANSITIONS: usize = 10;
pub const SUMMARY_MAX_CHARS: usize = 10_000;
const TRUNCATED_MARKER: &str = "\n... [truncated]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameSummary {
    pub id: String,
    pub name: String,
    pub text_content: Vec<String>,
    pub transitions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub id: String,
    pub name: String,
    pub frames: Vec<FrameSummary>,
}

/// Everything the generator needs from one Figma file.
#[derive(Debug, Clone, Default)]
pub struct FigmaExport {
    pub file_key: String,
    pub pages: Vec<PageSummary>,
    /// Frame id → rendered image URL.
    pub images: HashMap<String, String>,
    /// Frame id → deep link into the Figma editor.
    pub links: HashMap<String, String>,
}

/// File key from a `/file/<key>/...` or `/design/<key>/...` URL. Anything
/// else is assumed to already be a key.
pub fn parse_file_key(url: &str) -> String {
    for marker in ["figma.com/file/", "figma.com/design/"] {
        if let Some((_, rest)) = url.split_once(marker) {
            let key = rest.split(['/', '?']).next().unwrap_or(rest);
            if !key.is_empty() {
                return key.to_string();
            }
        }
    }
    url.to_string()
}

pub fn deep_link(file_key: &str, node_id: &str) -> String {
    format!(
        "https://www.figma.com/design/{file_key}?node-id={}",
        urlencoding::encode(node_id)
    )
}

/// Characters of every TEXT node under `node`, depth first.
pub fn collect_text(node: &Node) -> Vec<String> {
    let mut texts = Vec::new();
    if node.node_type == "TEXT" {
        texts.push(node.characters.clone().unwrap_or_default());
    }
    for child in &node.children {
        texts.extend(collect_text(child));
    }
    texts
}

/// Top-level frames of every page.
pub fn extract_pages(file: &FigmaFile) -> Vec<PageSummary> {
    file.document
        .children
        .iter()
        .map(|page| PageSummary {
            id: page.id.clone(),
            name: page.name.clone(),
            frames: page
                .children
                .iter()
                .filter(|n| n.node_type == "FRAME")
                .map(|frame| FrameSummary {
                    id: frame.id.clone(),
                    name: frame.name.clone(),
                    text_content: collect_text(frame),
                    transitions: frame.transition_node_id.iter().cloned().collect(),
                })
                .collect(),
        })
        .collect()
}

#[derive(Serialize)]
struct CompactFrame<'a> {
    id: &'a str,
    name: &'a str,
    text_content: String,
}

#[derive(Serialize)]
struct CompactTransition<'a> {
    from: &'a str,
    to: &'a str,
}

#[derive(Serialize)]
struct CompactSummary<'a> {
    frames: Vec<CompactFrame<'a>>,
    transitions: Vec<CompactTransition<'a>>,
}

impl FigmaExport {
    fn frames(&self) -> impl Iterator<Item = &FrameSummary> {
        self.pages.iter().flat_map(|p| p.frames.iter())
    }

    /// Frame ids, names, text and transitions as JSON, bounded for prompt use.
    pub fn compact_summary(&self) -> String {
        let summary = CompactSummary {
            frames: self
                .frames()
                .take(SUMMARY_MAX_FRAMES)
                .map(|f| CompactFrame {
                    id: &f.id,
                    name: &f.name,
                    text_content: take_chars(&f.text_content.join(" | "), SUMMARY_FRAME_TEXT_CHARS)
                        .to_string(),
                })
                .collect(),
            transitions: self
                .frames()
                .flat_map(|f| f.transitions.iter().map(move |to| CompactTransition { from: &f.id, to }))
                .take(SUMMARY_MAX_TRANSITIONS)
                .collect(),
        };

        let json = serde_json::to_string(&summary).unwrap_or_default();
        if char_len(&json) <= SUMMARY_MAX_CHARS {
            return json;
        }
        let keep = SUMMARY_MAX_CHARS - char_len(TRUNCATED_MARKER);
        format!("{}{TRUNCATED_MARKER}", take_chars(&json, keep))
    }

    /// Frame ids the model may reference with `{{FIGMA_IMAGE:<id>}}`.
    pub fn mockup_catalog(&self) -> String {
        let mut out =
            String::from("AVAILABLE MOCKUPS (Use these Frame IDs to reference images):\n");
        let names: HashMap<&str, &str> =
            self.frames().map(|f| (f.id.as_str(), f.name.as_str())).collect();
        let sorted: BTreeMap<&String, &String> = self.images.iter().collect();
        for id in sorted.keys() {
            let name = names.get(id.as_str()).copied().unwrap_or("");
            out.push_str(&format!("- Frame ID: {id} ({name}, Image Available)\n"));
        }
        out
    }

    /// Summary plus catalog, as inserted into the generation prompt.
    pub fn prompt_section(&self) -> String {
        format!("{}\n\n{}", self.compact_summary(), self.mockup_catalog())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figma::testing::{node, text};

    #[test]
    fn test_parse_file_key_variants() {
        assert_eq!(parse_file_key("https://www.figma.com/file/ByKey123/Name"), "ByKey123");
        assert_eq!(
            parse_file_key("https://www.figma.com/design/K9?node-id=1-2"),
            "K9"
        );
        assert_eq!(parse_file_key("RawKey"), "RawKey");
    }

    #[test]
    fn test_collect_text_is_recursive() {
        let frame = node(
            "1:1",
            "Shop",
            "FRAME",
            vec![
                text("1:2", "Buy"),
                node("1:3", "Group", "GROUP", vec![text("1:4", "Cancel")]),
            ],
        );
        assert_eq!(collect_text(&frame), vec!["Buy", "Cancel"]);
    }

    fn export_with_frames(n: usize, text_len: usize) -> FigmaExport {
        let frames = (0..n)
            .map(|i| {
                let mut f = node(&format!("{i}:0"), &format!("Frame {i}"), "FRAME", vec![]);
                f.children.push(text(&format!("{i}:1"), &"x".repeat(text_len)));
                f.transition_node_id = Some(format!("{}:0", i + 1));
                f
            })
            .collect();
        let file = FigmaFile {
            document: node("0:0", "Doc", "DOCUMENT", vec![node("p", "Page", "CANVAS", frames)]),
        };
        FigmaExport {
            file_key: "K".to_string(),
            pages: extract_pages(&file),
            ..Default::default()
        }
    }

    #[test]
    fn test_compact_summary_limits() {
        let export = export_with_frames(30, 2000);
        let summary = export.compact_summary();
        assert!(char_len(&summary) <= SUMMARY_MAX_CHARS);

        let small = export_with_frames(25, 10);
        let parsed: serde_json::Value = serde_json::from_str(&small.compact_summary()).unwrap();
        assert_eq!(parsed["frames"].as_array().unwrap().len(), SUMMARY_MAX_FRAMES);
        assert_eq!(
            parsed["transitions"].as_array().unwrap().len(),
            SUMMARY_MAX_TRANSITIONS
        );
        assert_eq!(parsed["transitions"][0]["to"], "1:0");
    }

    #[test]
    fn test_mockup_catalog_lists_available_images() {
        let mut export = export_with_frames(2, 1);
        export.images.insert("1:0".to_string(), "https://img/1.png".to_string());
        let catalog = export.mockup_catalog();
        assert!(catalog.starts_with("AVAILABLE MOCKUPS"));
        assert!(catalog.contains("- Frame ID: 1:0 (Frame 1, Image Available)"));
        assert!(!catalog.contains("0:0"));
    }
}
