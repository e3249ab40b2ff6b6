//! Meeting-notes enhancement: raw notes are rewritten into the full spec
//! outline, keeping the sections the notes already have and filling the rest
//! with placeholders or text inferred from the goals.

pub mod handlers;

use std::collections::HashMap;

const DEFAULT_NAME: &str = "Feature Spec";
const FLOW_MOCKUP: &str = "Mockup: {FIGMA_IMAGE:FRAME_ID}";

const PROBLEM_STATEMENTS: &str = "Problem statements";
const VISION: &str = "Vision and anti-vision";
const GOALS: &str = "Business and Design Goals";
const OPPORTUNITIES: &str = "Opportunities";
const UPSIDES: &str = "Expected Upsides";
const OVERVIEW: &str = "Overview";
const USER_FLOW: &str = "User Flow";
const EDGE_CASES: &str = "Edge Cases";
const UI_DEV: &str = "UI dev requirement";
const SOUND: &str = "Sound requirement";
const EXPERIMENTATION: &str = "Experimentation Plan";
const TRACKING: &str = "Tracking requirement";
const ANALYSIS: &str = "Analysis Plan";

const KNOWN_SECTIONS: [&str; 13] = [
    PROBLEM_STATEMENTS,
    VISION,
    GOALS,
    OPPORTUNITIES,
    UPSIDES,
    OVERVIEW,
    USER_FLOW,
    EDGE_CASES,
    UI_DEV,
    SOUND,
    EXPERIMENTATION,
    TRACKING,
    ANALYSIS,
];

const EXPERIMENTATION_DEFAULT: &[&str] = &[
    "- A/B test: Control vs. Treatment group",
    "- Hypothesis: [Feature] will improve [metric] by [X]%",
    "- Success criteria: Statistically significant improvement in [primary metric]",
    "- Timeline: 4 weeks minimum for statistical significance",
    "- Segmentation: Analyze by player segment, acquisition source, etc.",
];

const ANALYSIS_DEFAULT: &[&str] = &[
    "- Compare treatment vs. control on primary metric",
    "- Statistical significance: p < 0.05, minimum sample size: [TBD]",
    "- Cohort analysis: Segment by player type, acquisition source",
    "- Timeline: Analyze after 4 weeks, with interim checks at 1-2 weeks",
    "- Reporting: Weekly updates, final analysis report",
];

/// Notes split on `##` headings.
#[derive(Debug, Default)]
pub struct MeetingNotes {
    /// First level-two heading that is not a standard section.
    pub name: Option<String>,
    /// Lowercased heading to trimmed body; the first occurrence wins.
    sections: HashMap<String, String>,
}

impl MeetingNotes {
    pub fn parse(content: &str) -> Self {
        let mut notes = MeetingNotes::default();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in content.lines() {
            if let Some(rest) = line.strip_prefix("##") {
                notes.close(current.take());
                let heading = rest.trim_start_matches('#').trim();
                let level_two = rest.starts_with(char::is_whitespace);
                if level_two && notes.name.is_none() && !heading.is_empty() && !is_known(heading) {
                    notes.name = Some(heading.to_string());
                }
                current = Some((heading.to_lowercase(), Vec::new()));
            } else if let Some((_, body)) = current.as_mut() {
                body.push(line);
            }
        }
        notes.close(current);
        notes
    }

    fn close(&mut self, section: Option<(String, Vec<&str>)>) {
        if let Some((key, body)) = section {
            let body = body.join("\n").trim().to_string();
            self.sections.entry(key).or_insert(body);
        }
    }

    /// Body of a section, when the notes have it.
    pub fn section(&self, heading: &str) -> Option<&str> {
        self.sections.get(&heading.to_lowercase()).map(String::as_str)
    }

    fn mentions(&self, heading: &str, words: &[&str]) -> bool {
        self.section(heading).is_some_and(|body| {
            let body = body.to_lowercase();
            words.iter().any(|w| body.contains(w))
        })
    }
}

fn is_known(heading: &str) -> bool {
    KNOWN_SECTIONS.iter().any(|s| s.eq_ignore_ascii_case(heading))
}

/// Rewrites meeting notes into the complete spec outline.
pub fn enhance(content: &str) -> String {
    let notes = MeetingNotes::parse(content);
    let name = notes.name.as_deref().unwrap_or(DEFAULT_NAME);
    let mut out = format!("## {name}\n");

    let mut push = |heading: &str, body: &str| {
        out.push_str(&format!("\n## {heading}\n{body}\n"));
    };
    let kept_or = |heading: &str, fallback: String| -> String {
        notes.section(heading).map(str::to_string).unwrap_or(fallback)
    };

    push(
        PROBLEM_STATEMENTS,
        &kept_or(PROBLEM_STATEMENTS, "- [To be filled from meeting notes]".into()),
    );
    push(
        VISION,
        &kept_or(VISION, "Vision\n- [To be filled]\n\nAnti-vision\n- [To be filled]".into()),
    );
    push(
        GOALS,
        &kept_or(GOALS, "- [To be filled with quantifiable goals]".into()),
    );
    push(OPPORTUNITIES, &kept_or(OPPORTUNITIES, infer_opportunities(&notes)));
    push(UPSIDES, &kept_or(UPSIDES, infer_upsides(&notes)));
    push(OVERVIEW, &kept_or(OVERVIEW, "[Feature overview to be filled]".into()));

    if let Some(flow) = notes.section(USER_FLOW) {
        let heading = format!("{} Flow", name.replace(' ', ""));
        push(&heading, &format_flow(flow));
    }

    push(
        EDGE_CASES,
        &kept_or(EDGE_CASES, "- [To be identified: error scenarios, edge user behaviors]".into()),
    );
    push(
        UI_DEV,
        &kept_or(UI_DEV, "- [Technical UI requirements to be specified]".into()),
    );
    push(
        SOUND,
        &kept_or(SOUND, "- [Sound/SFX requirements to be specified]".into()),
    );
    push(
        EXPERIMENTATION,
        &kept_or(EXPERIMENTATION, EXPERIMENTATION_DEFAULT.join("\n")),
    );
    push(TRACKING, &kept_or(TRACKING, infer_tracking(&notes)));
    push(ANALYSIS, &kept_or(ANALYSIS, ANALYSIS_DEFAULT.join("\n")));
    push("Changelog", "- Initial spec creation");

    out
}

fn format_flow(flow: &str) -> String {
    if flow.contains("Description:") {
        flow.to_string()
    } else {
        format!("Description: {flow}\n{FLOW_MOCKUP}")
    }
}

fn bullets(found: Vec<&str>, fallback: &[&str]) -> String {
    if found.is_empty() {
        fallback.join("\n")
    } else {
        found.join("\n")
    }
}

fn infer_opportunities(notes: &MeetingNotes) -> String {
    let mut found = Vec::new();
    if notes.mentions(GOALS, &["retention"]) {
        found.push("- Opportunity to improve player retention through optimized D0 experience");
    }
    if notes.mentions(GOALS, &["engagement", "session"]) {
        found.push("- Opportunity to increase session depth and player engagement");
    }
    if notes.mentions(GOALS, &["ltv", "monetization"]) {
        found.push("- Opportunity to improve monetization and LTV through better early funnel");
    }
    if notes.mentions(VISION, &["experiment", "test"]) {
        found.push("- Opportunity to validate improvements through data-driven experimentation");
    }
    bullets(
        found,
        &[
            "- Opportunity to improve player experience and key metrics",
            "- Opportunity to optimize based on data and player behavior",
        ],
    )
}

fn infer_upsides(notes: &MeetingNotes) -> String {
    let mut found = Vec::new();
    if notes.mentions(GOALS, &["retention"]) {
        found.push("- Improved D1 retention (target: X% increase, to be validated)");
    }
    if notes.mentions(GOALS, &["engagement"]) {
        found.push("- Increased session depth and player engagement");
    }
    if notes.mentions(GOALS, &["ltv"]) {
        found.push("- Improved LTV per new player (1-2%+ range including ads)");
    }
    if notes.mentions(OVERVIEW, &["retention"]) {
        found.push("- Better D0→D1 retention conversion");
    }
    if notes.mentions(OVERVIEW, &["session"]) {
        found.push("- Deeper early session engagement");
    }
    bullets(
        found,
        &[
            "- Improved key metrics (to be quantified)",
            "- Better player experience and engagement",
        ],
    )
}

fn infer_tracking(notes: &MeetingNotes) -> String {
    let mut found = Vec::new();
    if notes.mentions(GOALS, &["retention"]) {
        found.push("- Track D1 retention rate for new players");
        found.push("- Track D0 funnel completion rate (games 1-3)");
    }
    if notes.mentions(GOALS, &["engagement"]) {
        found.push("- Track session length and depth");
        found.push("- Track next-day engagement rate post-D0");
    }
    if notes.mentions(GOALS, &["ltv"]) {
        found.push("- Track Ad LTV per new player");
    }
    bullets(
        found,
        &[
            "- Track primary success metric: [to be defined]",
            "- Track secondary metrics: [to be defined]",
            "- Track user behavior events: [to be defined]",
        ],
    )
}
