// Relevance selection: decides which slices of the corpus reach the prompt.
// Pure functions only; no I/O and no LLM calls.

pub mod budget;
pub mod documents;
pub mod relevance;

pub use budget::{compose_context, AssembledContext, ContextBudget};
pub use relevance::find_conflicts;
