//! `{{FIGMA_IMAGE:<id>}}` substitution in generated markdown.

use std::collections::{BTreeSet, HashMap};

pub const FALLBACK_DEEP_LINK: &str = "#";

/// Replaces image placeholders for every node id known to either map. The
/// double-brace form is replaced first so the single-brace pass never sees
/// half of it.
///
/// With an image URL the placeholder becomes a clickable image, otherwise a
/// plain "View Mockup in Figma" link.
pub fn substitute_images(
    markdown: &str,
    image_urls: &HashMap<String, String>,
    deep_links: &HashMap<String, String>,
) -> String {
    let ids: BTreeSet<&String> = image_urls.keys().chain(deep_links.keys()).collect();
    let mut out = markdown.to_string();

    for id in ids {
        let link = deep_links
            .get(id)
            .map(String::as_str)
            .unwrap_or(FALLBACK_DEEP_LINK);
        let replacement = match image_urls.get(id) {
            Some(url) => format!("[![Mockup]({url})]({link})"),
            None => format!("[**[View Mockup in Figma]**]({link})"),
        };
        out = out
            .replace(&format!("{{{{FIGMA_IMAGE:{id}}}}}"), &replacement)
            .replace(&format!("{{FIGMA_IMAGE:{id}}}"), &replacement);
    }
    out
}
