//! Generated-markdown → logical slides.
//!
//! The first heading of a document is always recorded as its title. It also
//! opens the first slide when it names a repeatable slide type (a UI screen
//! or a flow).

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogicalSlide {
    pub header: String,
    pub content_lines: Vec<String>,
}

impl LogicalSlide {
    fn open(header: &str) -> Self {
        Self {
            header: header.to_string(),
            content_lines: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    pub title: Option<String>,
    pub slides: Vec<LogicalSlide>,
}

/// Repeatable slide types, each backed by a master slide in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKind {
    Ui,
    Flow,
}

impl SlideKind {
    /// `ui` must appear as a whole word ("Login UI", "ui-kit"), `screen` and
    /// `flow` anywhere. UI wins when both match.
    pub fn classify(header: &str) -> Option<Self> {
        let lower = header.to_lowercase();
        let ui_token = lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token == "ui");
        if ui_token || lower.contains("screen") {
            Some(SlideKind::Ui)
        } else if lower.contains("flow") {
            Some(SlideKind::Flow)
        } else {
            None
        }
    }
}

enum ParseState {
    BeforeFirstHeading,
    InTitleOnly,
    InSlide(LogicalSlide),
}

/// Text of a `# ` or `## ` heading line, `None` for anything else.
fn heading(line: &str) -> Option<&str> {
    if line.starts_with("# ") || line.starts_with("## ") {
        Some(line.trim_start_matches('#').trim())
    } else {
        None
    }
}

/// Splits generated markdown into logical slides. Lines are trimmed and
/// blank lines skipped; content before the first slide is dropped.
pub fn parse(markdown: &str) -> ParsedDocument {
    let mut doc = ParsedDocument::default();
    let mut state = ParseState::BeforeFirstHeading;

    for line in markdown.lines().map(str::trim).filter(|l| !l.is_empty()) {
        state = match (state, heading(line)) {
            (ParseState::BeforeFirstHeading, Some(header)) => {
                doc.title = Some(header.to_string());
                if SlideKind::classify(header).is_some() {
                    ParseState::InSlide(LogicalSlide::open(header))
                } else {
                    ParseState::InTitleOnly
                }
            }
            (ParseState::InTitleOnly, Some(header)) => {
                ParseState::InSlide(LogicalSlide::open(header))
            }
            (ParseState::InSlide(done), Some(header)) => {
                doc.slides.push(done);
                ParseState::InSlide(LogicalSlide::open(header))
            }
            (ParseState::InSlide(mut slide), None) => {
                slide.content_lines.push(line.to_string());
                ParseState::InSlide(slide)
            }
            (other, None) => other,
        };
    }

    if let ParseState::InSlide(last) = state {
        doc.slides.push(last);
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_plain_first_heading_is_title() {
        let doc = parse("# Daily Rewards\nintro text\n## Overview\n- one\n- two");
        assert_eq!(doc.title.as_deref(), Some("Daily Rewards"));
        assert_eq!(doc.slides.len(), 1);
        assert_eq!(doc.slides[0].header, "Overview");
        assert_eq!(doc.slides[0].content_lines, vec!["- one", "- two"]);
    }

    #[test]
    fn test_slide_like_first_heading_is_title_and_opens_slide() {
        let doc = parse("## Login Screen UI\n- Header: Login\n## Onboarding Flow\n- Description: x");
        assert_eq!(doc.title.as_deref(), Some("Login Screen UI"));
        let headers: Vec<_> = doc.slides.iter().map(|s| s.header.as_str()).collect();
        assert_eq!(headers, vec!["Login Screen UI", "Onboarding Flow"]);
    }

    #[test]
    fn test_third_level_headings_are_content() {
        let doc = parse("# T\n## Edge Cases\n### Offline\nretry later");
        assert_eq!(doc.slides[0].content_lines, vec!["### Offline", "retry later"]);
    }

    #[test]
    fn test_empty_heading_slide_is_kept() {
        let doc = parse("# T\n## A\n## B\nb1");
        assert_eq!(doc.slides.len(), 2);
        assert!(doc.slides[0].content_lines.is_empty());
    }

    #[test]
    fn test_classify_ui_needs_whole_word() {
        assert_eq!(SlideKind::classify("Shop UI"), Some(SlideKind::Ui));
        assert_eq!(SlideKind::classify("Reward Screen"), Some(SlideKind::Ui));
        assert_eq!(SlideKind::classify("Purchase Flow"), Some(SlideKind::Flow));
        assert_eq!(SlideKind::classify("Build Requirements"), None, "'ui' inside 'build' is not a token");
        assert_eq!(SlideKind::classify("Overview"), None);
    }

    proptest! {
        #[test]
        fn prop_parse_is_idempotent(lines in prop::collection::vec(
            prop_oneof![
                "[a-z ]{0,12}",
                "[a-z ]{1,10}".prop_map(|s| format!("## {s}")),
                "[a-z ]{1,10}".prop_map(|s| format!("# {s} ui")),
                "[a-z]{1,6}: [a-z ]{0,10}".prop_map(|s| format!("- {s}")),
            ],
            0..30,
        )) {
            let markdown = lines.join("\n");
            prop_assert_eq!(parse(&markdown), parse(&markdown));

            // Every heading opens a slide except a plain first heading.
            let headings: Vec<&str> = markdown.lines().filter_map(|l| heading(l.trim())).collect();
            let doc = parse(&markdown);
            let title_only = headings
                .first()
                .map_or(false, |first| SlideKind::classify(first).is_none());
            prop_assert_eq!(doc.title.as_deref(), headings.first().copied());
            prop_assert_eq!(doc.slides.len(), headings.len() - usize::from(title_only));
        }
    }
}
