//! Clarifying questions: asks the model whether a request is detailed enough
//! to draft a spec, and turns its answer into a list of questions.

use tracing::{info, warn};

use crate::context::index::ContextIndex;
use crate::generation::prompts::build_clarify_prompt;
use crate::history::{format_history, QaRecord};
use crate::llm_client::{
    generate_with_fallback, strip_json_fences, LlmError, TextCompletion, FALLBACK_MODEL,
};
use crate::text::take_chars;

const STYLE_CONTEXT_CHARS: usize = 2_000;
const CLARIFY_MAX_TOKENS: u32 = 1_024;
const SUFFICIENT: &str = "SUFFICIENT";

/// Style excerpt from the index: sample intros, capped.
pub fn style_context(index: &ContextIndex) -> String {
    let intros = index
        .style_sample
        .as_ref()
        .map(|s| s.sample_intros.join("\n\n"))
        .unwrap_or_default();
    if intros.is_empty() {
        return String::new();
    }
    format!("{}... (truncated)", take_chars(&intros, STYLE_CONTEXT_CHARS))
}

/// Interprets the model's reply.
///
/// `SUFFICIENT` anywhere (any case) means no questions. Otherwise the span
/// from the first `[` to the last `]` is read as a JSON string array; if the
/// reply has no such span, lines containing `?` are taken. A span that is
/// not valid JSON yields the raw reply as a single entry.
pub fn parse_questions(reply: &str) -> Vec<String> {
    let text = strip_json_fences(reply);
    if text.to_uppercase().contains(SUFFICIENT) {
        return Vec::new();
    }

    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if start < end {
            return match serde_json::from_str::<Vec<String>>(&text[start..=end]) {
                Ok(questions) => questions,
                Err(_) => vec![text.to_string()],
            };
        }
    }

    let questions: Vec<String> = text
        .lines()
        .filter(|line| line.contains('?'))
        .map(|line| line.trim().trim_matches(|c| c == '-' || c == '*' || c == ' ').to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if questions.is_empty() && !text.is_empty() {
        vec![text.to_string()]
    } else {
        questions
    }
}

/// Asks for clarifying questions about `request`.
///
/// Rate-limit exhaustion propagates so the caller can answer 429; any other
/// model failure is logged and treated as "no questions".
pub async fn analyze_prompt(
    llm: &dyn TextCompletion,
    request: &str,
    history: &[QaRecord],
    style: &str,
) -> Result<Vec<String>, LlmError> {
    let prompt = build_clarify_prompt(request, &format_history(history), style);

    match generate_with_fallback(llm, &prompt, &[FALLBACK_MODEL], CLARIFY_MAX_TOKENS).await {
        Ok(reply) => {
            let questions = parse_questions(&reply);
            info!("Prompt analysis produced {} clarifying questions", questions.len());
            Ok(questions)
        }
        Err(e) if e.is_rate_limited() => Err(e),
        Err(e) => {
            warn!("Error analyzing prompt: {e}");
            Ok(Vec::new())
        }
    }
}
