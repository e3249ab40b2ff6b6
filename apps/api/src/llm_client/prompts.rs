// Shared prompt constants for the text-completion service.
// Each module that needs LLM calls defines its own prompts alongside it.

/// System prompt used for every call: the model writes specs, the service
/// only assembles and places them.
pub const GDD_WRITER_SYSTEM: &str = "You are an expert game design specification writer. \
    You write clear, well-structured game design documents that are ready for development. \
    Follow the requested section structure exactly.";

/// Formatting fragment appended to generation prompts.
pub const FORMATTING_RULES: &str = "\
# FORMATTING RULES
- Format: clean, plain text.
- Do NOT use markdown asterisks (**) for bolding. Use HTML `<b>` tags instead (e.g., `<b>Header</b>`).
- Lists: use hyphens (-).
- Headings: ## for sections.
- Copy-paste ready.
- Strategic line breaks.";
