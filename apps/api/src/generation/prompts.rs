// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::FORMATTING_RULES;
use crate::selection::AssembledContext;

/// Clarifying-question prompt. Replace `{request}`, `{history}` and
/// `{style}` before sending.
pub const CLARIFY_PROMPT_TEMPLATE: &str = r#"You are a Senior Game Producer. A designer has come to you with a game idea.
Your goal is to determine if you have enough information to write a detailed Game Design Document (GDD).

USER IDEA:
{request}

PAST Q&A HISTORY (Do not ask these again):
{history}

CONTEXT (Existing GDDs/Slides style):
{style}

TASK:
1. Analyze the idea.
2. If the idea is too vague (e.g., "Make a racing game"), ask 3-5 critical clarifying questions (e.g., "What is the core loop?", "Is it single or multiplayer?", "What is the art style?").
3. If the idea is detailed enough to start a draft, return "SUFFICIENT".

OUTPUT FORMAT:
- If sufficient: Just the word "SUFFICIENT".
- If questions needed: A JSON-formatted list of strings, e.g., ["Question 1?", "Question 2?"]"#;

const WRITING_STYLE: &str = "\
# WRITING STYLE
- Specific and concrete, never vague.
- Player-centric language.
- Every point actionable.
- \"What\" and \"why\" before \"how\".
- Anticipate developer and QA questions.
- Concise: no filler.";

/// Section structure the deck renderer understands.
const STRUCTURE: &str = r#"# TECHNICAL CONSTRAINTS (CRITICAL FOR SLIDE GENERATION)
Follow this structure exactly so the document can be converted to slides.

## Required Section Headers (Use ##)
1. <Add spec name here> (Title Slide)
2. Problem statements
3. Vision and anti-vision
4. Business and Design Goals
5. Opportunities
6. Expected Upsides
7. Overview
8. <Screen Name> UI (Repeat for each screen)
9. <Flow name> Flow (Repeat for each flow)
10. Edge Cases
11. UI dev requirement
12. Sound requirement
13. Experimentation Plan
14. Tracking requirement
15. Analysis Plan
16. Changelog

## UI Slides (Section 8): plain Key: Value lines
- Header: ...
- Sub text: ...
- CTA: ...
- CTA functionality: ...
- Surfacing conditions: ...
- Popup Priority: ...
- Mockup: {{FIGMA_IMAGE:ID}}

## Flow Slides (Section 9)
- Description: one line per step
- Mockup: {{FIGMA_IMAGE:ID}} (one per step)

## Vision/Goals (Sections 3 & 4): sub-headers for the split
<b>Vision</b>
- Point 1

<b>Anti-vision</b>
- Point 1"#;

const FIGMA_INSTRUCTIONS: &str = r#"INSTRUCTIONS FOR FIGMA DATA:
1. Each top-level frame is a UI screen; use the frame name as <Screen Name>.
2. Use `text_content` to fill Header, Sub text and CTA.
3. Use `transitions` to describe flows.
4. Reference images with `{{FIGMA_IMAGE:FRAME_ID}}` using ids from the AVAILABLE MOCKUPS list only."#;

/// Generation prompt template. Every `{placeholder}` is replaced by
/// `build_generation_prompt`.
pub const GENERATION_PROMPT_TEMPLATE: &str = r#"# ROLE & EXPERTISE
You are an expert game design specification writer. Your role is to create clear, well-structured game design documents that are immediately usable by development teams.

{formatting}

{style}

# USER REQUEST
{request}

{structure}

{conflicts}# KNOWLEDGE FROM EXISTING SPECS
{knowledge}

CONTENT SOURCES:
{sections}

{figma_instructions}

- Examples (Mimic the depth and actionable detail):
{examples}"#;

/// Fills the clarifying-question template.
pub fn build_clarify_prompt(request: &str, history: &str, style: &str) -> String {
    CLARIFY_PROMPT_TEMPLATE
        .replace("{history}", history)
        .replace("{style}", style)
        .replace("{request}", request)
}

/// Fills the generation template from assembled context. `conflicts` lists
/// features the request names that already exist in the corpus.
pub fn build_generation_prompt(
    request: &str,
    context: &AssembledContext,
    conflicts: &[String],
) -> String {
    let conflicts_block = if conflicts.is_empty() {
        String::new()
    } else {
        format!(
            "# EXISTING FEATURES (extend or reference these, do not redefine them)\n{}\n\n",
            conflicts
                .iter()
                .map(|c| format!("- {c}"))
                .collect::<Vec<_>>()
                .join("\n")
        )
    };

    let sections = context
        .sections
        .iter()
        .map(|s| format!("- {}:\n{}", s.label, s.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    // request last so user text containing a placeholder is never expanded
    GENERATION_PROMPT_TEMPLATE
        .replace("{formatting}", FORMATTING_RULES)
        .replace("{style}", WRITING_STYLE)
        .replace("{structure}", STRUCTURE)
        .replace("{conflicts}", &conflicts_block)
        .replace("{knowledge}", &context.knowledge)
        .replace("{sections}", &sections)
        .replace("{figma_instructions}", FIGMA_INSTRUCTIONS)
        .replace("{examples}", &context.examples)
        .replace("{request}", request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::budget::ContextSection;

    #[test]
    fn test_generation_prompt_has_no_unfilled_placeholders() {
        let context = AssembledContext {
            knowledge: "RELEVANT FEATURES:\n- Shop".to_string(),
            examples: "--- EXAMPLE 1: shop.md ---".to_string(),
            sections: vec![ContextSection {
                label: "Edge Cases".to_string(),
                text: "Offline purchase".to_string(),
            }],
            documents_used: vec!["shop.md".to_string()],
        };
        let prompt = build_generation_prompt("Add a daily reward", &context, &[]);

        for placeholder in ["{formatting}", "{knowledge}", "{sections}", "{examples}", "{request}"] {
            assert!(!prompt.contains(placeholder), "{placeholder} left in prompt");
        }
        assert!(prompt.contains("Add a daily reward"));
        assert!(prompt.contains("- Edge Cases:\nOffline purchase"));
        assert!(prompt.contains("{{FIGMA_IMAGE:ID}}"), "image syntax must survive");
        assert!(!prompt.contains("EXISTING FEATURES"));
    }

    #[test]
    fn test_conflicts_listed_when_present() {
        let prompt = build_generation_prompt(
            "Rework the shop",
            &AssembledContext::default(),
            &["Shop".to_string()],
        );
        assert!(prompt.contains("# EXISTING FEATURES"));
        assert!(prompt.contains("- Shop\n"));
    }

    #[test]
    fn test_request_text_is_not_expanded() {
        let prompt = build_clarify_prompt("Use {history} literally", "Q: a\nA: b", "");
        assert!(prompt.contains("USER IDEA:\nUse {history} literally"));
        assert!(prompt.contains("Q: a\nA: b"));
    }
}
