// Prompt constants for spec verification.

/// Replace `{filename}`, `{spec_count}`, `{spec}` and `{corpus}` before
/// sending.
pub const VERIFY_PROMPT_TEMPLATE: &str = r#"# ROLE
You review game design specifications for conflicts, gaps, risks and
structural problems before they reach development.

# SPEC TO VERIFY
Filename: {filename}

Content:
{spec}

# CONTEXT: EXISTING SPECS ({spec_count} documents)
{corpus}

# TASK
Report on the spec under review:

1. CONFLICTS with existing specs: feature overlaps, design inconsistencies,
   technical contradictions, timeline or resource clashes.
2. GAPS: missing required sections, incomplete feature descriptions, missing
   edge cases, unclear requirements, missing technical detail.
3. THREATS: technical, user experience and business risks, implementation
   and scalability concerns.
4. FORMAT & STRUCTURE: missing standard sections (Problem statements, Vision
   and anti-vision, Business and Design Goals, ...), inconsistent structure,
   missing UI or Flow documentation.
5. QUESTIONS the author must answer: ambiguous requirements, missing details,
   conflicts needing a decision.

# OUTPUT FORMAT
Reply with one JSON object and nothing else:
{
    "conflicts": [
        {"type": "Feature Conflict", "description": "...", "severity": "High|Medium|Low", "related_specs": ["spec1.pdf"]}
    ],
    "gaps": [
        {"section": "Section name", "description": "What is missing", "impact": "High|Medium|Low"}
    ],
    "threats": [
        {"type": "Technical Risk", "description": "...", "severity": "High|Medium|Low", "recommendation": "How to mitigate"}
    ],
    "format_issues": [
        {"issue": "Missing section", "description": "...", "recommendation": "How to fix"}
    ],
    "questions": ["Question 1?"],
    "summary": "Overall assessment and key findings"
}

Be specific and actionable. Name the sections and existing specs you refer to."#;

/// The corpus goes in last so its contents are never scanned for
/// placeholders.
pub fn build_verify_prompt(filename: &str, spec: &str, spec_count: usize, corpus: &str) -> String {
    VERIFY_PROMPT_TEMPLATE
        .replace("{filename}", filename)
        .replace("{spec_count}", &spec_count.to_string())
        .replace("{spec}", spec)
        .replace("{corpus}", corpus)
}
