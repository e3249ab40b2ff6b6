//! Writes one logical slide's content into its destination slide.
//!
//! Content lines are first parsed into `key: value` fields plus leftover
//! general lines, then written wherever a declared trigger (see
//! `render::triggers`) appears in the slide's containers. Keys with no
//! matching trigger are dropped; triggers with no matching key stay as
//! template boilerplate.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::render::image::place_image;
use crate::render::images::IMAGE_REF;
use crate::render::model::{Paragraph, Slide, TextRun};
use crate::render::triggers::{
    self, FillRule, DESCRIPTION_KEY, FLOW_DESCRIPTION_MARKER, FLOW_MOCK_MARKER, GENERIC_FIELDS,
    MOCKUP_KEY, SURFACING_HINT,
};
use crate::text::strip_bullet;

lazy_static! {
    // The key may not contain link or image syntax, so a line such as
    // `[![Mockup](https://...)](...)` is never split at the URL's colon.
    static ref KEY_VALUE: Regex = Regex::new(r"^\s*[-*]?\s*([^:\[\]()!]+?)\s*:\s*(.*)$").unwrap();
    static ref SUB_HEADER: Regex =
        Regex::new(r"^\s*[-*]?\s*(?:\*\*(.+?)\*\*|<b>(.+?)</b>)\s*:?\s*$").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"</?[a-zA-Z][^>]*>").unwrap();
}

/// Parsed content of one logical slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideFields {
    pub values: HashMap<String, String>,
    pub general: Vec<String>,
}

impl SlideFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn lines(&self, key: &str) -> impl Iterator<Item = &str> {
        self.get(key).into_iter().flat_map(|v| v.split('\n'))
    }
}

pub fn normalize_key(raw: &str) -> String {
    let key = HTML_TAG.replace_all(raw, "").replace('*', "");
    let key = key.trim().to_lowercase();
    key.strip_suffix(':').map(str::trim).unwrap_or(&key).to_string()
}

fn append(values: &mut HashMap<String, String>, key: &str, line: &str) {
    let entry = values.entry(key.to_string()).or_default();
    if !entry.is_empty() {
        entry.push('\n');
    }
    entry.push_str(line);
}

/// Value half of a `key: value` line. A bold key written as `**Key:**` or
/// `<b>Key:</b>` leaves its closing marker at the start of the value.
fn field_value(raw_key: &str, raw_value: &str) -> String {
    let value = raw_value.trim();
    let closing = if raw_key.contains("<b>") {
        "</b>"
    } else if raw_key.contains('*') {
        "**"
    } else {
        ""
    };
    value
        .strip_prefix(closing)
        .map_or(value, str::trim_start)
        .to_string()
}

/// Splits content lines into fields and general content.
///
/// - `key: value` (optionally bulleted) sets the key and makes it current.
///   A key seen again appends its new value on a new line.
/// - `**Key**` / `<b>Key</b>` alone, or an empty `key:` for a placeable key,
///   opens the key with no value.
/// - Other non-empty lines continue the current key, or become general
///   content when no key is open.
pub fn parse_fields(lines: &[String]) -> SlideFields {
    let mut fields = SlideFields::default();
    let mut current: Option<String> = None;

    for line in lines {
        let kv = KEY_VALUE
            .captures(line)
            .map(|caps| (normalize_key(&caps[1]), field_value(&caps[1], &caps[2])));

        match kv {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                append(&mut fields.values, &key, &value);
                current = Some(key);
                continue;
            }
            Some((key, _)) if triggers::is_placeable_key(&key) => {
                fields.values.entry(key.clone()).or_default();
                current = Some(key);
                continue;
            }
            _ => {}
        }

        if let Some(caps) = SUB_HEADER.captures(line) {
            let raw = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            let key = normalize_key(raw);
            fields.values.entry(key.clone()).or_default();
            current = Some(key);
            continue;
        }

        match &current {
            Some(key) if !line.trim().is_empty() => append(&mut fields.values, key, line.trim()),
            _ => fields.general.push(line.clone()),
        }
    }
    fields
}

/// The image URL a mockup value points at, if any.
fn image_target(value: &str) -> Option<&str> {
    if let Some(caps) = IMAGE_REF.captures(value) {
        return caps.get(1).map(|m| m.as_str());
    }
    let trimmed = value.trim();
    trimmed.starts_with("http").then_some(trimmed)
}

/// Places the image named by `value` over container `index`, or writes the
/// value itself when there is no usable image.
fn write_mockup(slide: &mut Slide, index: usize, value: &str, images: &HashMap<String, Bytes>) {
    if let Some(url) = image_target(value) {
        match images.get(url) {
            Some(bytes) => match place_image(slide, index, url, bytes) {
                Ok(()) => return,
                Err(e) => warn!("Could not place image {url}: {e}"),
            },
            None => debug!("No image bytes for {url}, writing link instead"),
        }
    }
    slide.containers[index].set_text(strip_bullet(value));
}

fn fill_ui_details(slide: &mut Slide, index: usize, fields: &SlideFields, used: &mut HashSet<String>) {
    let container = &mut slide.containers[index];
    let mut rewritten = Vec::with_capacity(container.paragraphs.len());

    for mut paragraph in container.paragraphs.drain(..) {
        let line = triggers::normalize(&paragraph.text());
        let hit = triggers::ui_fields_in(&line).find(|f| fields.get(f.key).is_some());

        if let Some(field) = hit {
            let value = fields.get(field.key).unwrap_or_default();
            let mut values = value.split('\n').map(strip_bullet);
            let level = paragraph.level;
            paragraph.clear();
            if let Some(label) = field.label {
                paragraph.runs.push(TextRun {
                    text: format!("{label} "),
                    bold: field.bold_label,
                });
            }
            paragraph.runs.push(TextRun::plain(values.next().unwrap_or_default()));
            rewritten.push(paragraph);
            // Multi-line values continue as indented paragraphs below the label.
            rewritten.extend(values.map(|v| Paragraph {
                runs: vec![TextRun::plain(v)],
                level: level + 1,
            }));
            used.insert(field.key.to_string());
            continue;
        }

        if line.contains(SURFACING_HINT) && fields.get("surfacing conditions").is_some() {
            paragraph.clear();
        }
        rewritten.push(paragraph);
    }
    container.paragraphs = rewritten;
}

/// Fills `slide` from a logical slide's content lines. `images` maps image
/// URLs to downloaded bytes.
pub fn fill_slide(slide: &mut Slide, lines: &[String], images: &HashMap<String, Bytes>) {
    let fields = parse_fields(lines);
    let is_flow = slide.title.to_lowercase().contains("flow");
    let mut used: HashSet<String> = HashSet::new();

    // Flow containers are picked from the template text before anything is written.
    let (mut desc_boxes, mut mock_boxes) = (Vec::new(), Vec::new());
    if is_flow {
        for (i, container) in slide.containers.iter().enumerate() {
            let text = container.text().to_lowercase();
            if text.contains(FLOW_DESCRIPTION_MARKER) {
                desc_boxes.push(i);
            } else if text.contains(FLOW_MOCK_MARKER) {
                mock_boxes.push(i);
            }
        }
        let position = |i: &usize| (slide.containers[*i].bounds.top, slide.containers[*i].bounds.left);
        desc_boxes.sort_by_key(position);
        mock_boxes.sort_by_key(position);
    }

    let mut mockup_done = false;
    let mut description_done = false;

    for index in 0..slide.containers.len() {
        let text = triggers::normalize(&slide.containers[index].text());
        if triggers::is_ui_details(&text) {
            fill_ui_details(slide, index, &fields, &mut used);
            continue;
        }

        for field in GENERIC_FIELDS {
            if is_flow && (field.key == MOCKUP_KEY || field.key == DESCRIPTION_KEY) {
                continue;
            }
            let Some(value) = fields.get(field.key) else {
                continue;
            };
            if !field.triggers.iter().any(|t| text.contains(t)) {
                continue;
            }

            match field.rule {
                FillRule::ImageOnce if mockup_done => slide.containers[index].clear(),
                FillRule::ImageOnce => {
                    write_mockup(slide, index, value, images);
                    mockup_done = true;
                }
                FillRule::TextOnce if description_done => slide.containers[index].clear(),
                FillRule::TextOnce => {
                    slide.containers[index].set_text(value);
                    description_done = true;
                }
                FillRule::Paragraphs => {
                    let container = &mut slide.containers[index];
                    container.clear();
                    container
                        .paragraphs
                        .extend(value.split('\n').map(|l| Paragraph::plain(strip_bullet(l))));
                }
            }
            used.insert(field.key.to_string());
            break;
        }
    }

    if is_flow {
        fill_flow_steps(slide, &fields, &desc_boxes, &mock_boxes, images);
        used.insert(DESCRIPTION_KEY.to_string());
        used.insert(MOCKUP_KEY.to_string());
    }

    for key in fields.values.keys().filter(|k| !used.contains(*k)) {
        debug!("Dropping '{key}' on '{}': no matching placeholder", slide.title);
    }
}

/// Pairs step lines with description/mock containers in reading order.
/// Image lines take the next mock container, text lines the next
/// description container. Surplus steps are dropped.
fn fill_flow_steps(
    slide: &mut Slide,
    fields: &SlideFields,
    desc_boxes: &[usize],
    mock_boxes: &[usize],
    images: &HashMap<String, Bytes>,
) {
    let steps: Vec<&str> = fields
        .lines(DESCRIPTION_KEY)
        .chain(fields.general.iter().map(String::as_str))
        .chain(fields.lines(MOCKUP_KEY))
        .filter(|line| !line.trim().is_empty())
        .collect();

    let (mut next_desc, mut next_mock) = (desc_boxes.iter(), mock_boxes.iter());
    for step in steps {
        if image_target(step).is_some() {
            if let Some(&index) = next_mock.next() {
                write_mockup(slide, index, step, images);
            }
        } else if let Some(&index) = next_desc.next() {
            slide.containers[index].set_text(strip_bullet(step));
        }
    }
}
