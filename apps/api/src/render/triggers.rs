//! Declared placeholder tables. Each entry pairs a parsed content key with the
//! template substrings that mark where its value belongs. Order matters: the
//! first matching entry wins for a container (or, in the UI details box, for
//! a line).
//!
//! Triggers are stored normalized (see [`normalize`]), so `Header :` and
//! `Header:` in a template both match `header:`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SPACE_BEFORE_COLON: Regex = Regex::new(r"\s+:").unwrap();
}

/// Lowercases and collapses whitespace before colons.
pub fn normalize(text: &str) -> String {
    SPACE_BEFORE_COLON
        .replace_all(&text.to_lowercase(), ":")
        .into_owned()
}

/// One rewritable line of the UI details box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiField {
    pub key: &'static str,
    pub trigger: &'static str,
    /// Label written back before the value. `None` writes the value alone.
    pub label: Option<&'static str>,
    pub bold_label: bool,
}

/// A container holding both of these is the UI details box.
pub const UI_FINGERPRINT: [&str; 2] = ["header:", "sub text:"];

pub const UI_FIELDS: &[UiField] = &[
    UiField { key: "header", trigger: "header:", label: Some("Header :"), bold_label: false },
    UiField { key: "sub text", trigger: "sub text:", label: Some("Sub text :"), bold_label: false },
    UiField { key: "cta", trigger: "cta:", label: Some("CTA :"), bold_label: false },
    UiField {
        key: "cta functionality",
        trigger: "<add cta functionality here>",
        label: None,
        bold_label: false,
    },
    UiField {
        key: "surfacing conditions",
        trigger: "surfacing conditions:",
        label: Some("Surfacing conditions :"),
        bold_label: true,
    },
    UiField {
        key: "popup priority",
        trigger: "popup priority:",
        label: Some("Popup Priority :"),
        bold_label: false,
    },
];

/// Hint line under the surfacing-conditions label. Cleared once the label
/// line carries the value.
pub const SURFACING_HINT: &str = "<add surfacing conditions";

/// How a generic container is written once its trigger matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    /// First match gets the image; later matches on the slide are cleared.
    ImageOnce,
    /// First match gets the text; later matches on the slide are cleared.
    TextOnce,
    /// Container rewritten as one paragraph per value line.
    Paragraphs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericField {
    pub key: &'static str,
    pub triggers: &'static [&'static str],
    pub rule: FillRule,
}

pub const MOCKUP_KEY: &str = "mockup";
pub const DESCRIPTION_KEY: &str = "description";

pub const GENERIC_FIELDS: &[GenericField] = &[
    GenericField { key: "vision", triggers: &["<add vision"], rule: FillRule::Paragraphs },
    GenericField { key: "anti-vision", triggers: &["<add anti vision"], rule: FillRule::Paragraphs },
    GenericField { key: "business goals", triggers: &["<add business goals"], rule: FillRule::Paragraphs },
    GenericField { key: "design goals", triggers: &["<add design goals"], rule: FillRule::Paragraphs },
    GenericField {
        key: MOCKUP_KEY,
        triggers: &["<add mock link here", "mockup"],
        rule: FillRule::ImageOnce,
    },
    GenericField {
        key: DESCRIPTION_KEY,
        triggers: &["<add flow description", "description"],
        rule: FillRule::TextOnce,
    },
];

/// Flow slides pair containers by these substrings, description first.
pub const FLOW_DESCRIPTION_MARKER: &str = "description";
pub const FLOW_MOCK_MARKER: &str = "mock";

/// Every key some table can place.
pub fn is_placeable_key(key: &str) -> bool {
    UI_FIELDS.iter().any(|f| f.key == key) || GENERIC_FIELDS.iter().any(|f| f.key == key)
}

pub fn is_ui_details(normalized_text: &str) -> bool {
    UI_FINGERPRINT.iter().all(|t| normalized_text.contains(t))
}

/// UI fields whose trigger occurs in a normalized line, in table order.
pub fn ui_fields_in(normalized_line: &str) -> impl Iterator<Item = &'static UiField> + '_ {
    UI_FIELDS
        .iter()
        .filter(move |f| normalized_line.contains(f.trigger))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_space_before_colon() {
        assert_eq!(normalize("Header :  <add>"), "header:  <add>");
        assert_eq!(normalize("Sub text\t: x"), "sub text: x");
    }

    #[test]
    fn test_ui_fingerprint_needs_both_triggers() {
        assert!(is_ui_details(&normalize("Header : <h>\nSub text : <s>")));
        assert!(!is_ui_details(&normalize("Header : <h>")));
    }

    #[test]
    fn test_triggers_are_stored_normalized() {
        for field in UI_FIELDS {
            assert_eq!(normalize(field.trigger), field.trigger, "{}", field.key);
        }
        for field in GENERIC_FIELDS {
            for trigger in field.triggers {
                assert_eq!(normalize(trigger), *trigger, "{}", field.key);
            }
        }
    }

    #[test]
    fn test_ui_field_lookup_respects_table_order() {
        let first = ui_fields_in("cta: <add cta>").next().unwrap();
        assert_eq!(first.key, "cta");
        assert!(ui_fields_in("<add cta functionality here>")
            .any(|f| f.key == "cta functionality"));
    }

    #[test]
    fn test_placeable_keys() {
        assert!(is_placeable_key("popup priority"));
        assert!(is_placeable_key("mockup"));
        assert!(!is_placeable_key("notes"));
    }
}
