//! Corpus chat: free-form questions answered from the whole reference corpus,
//! with the recent conversation replayed as memory.

pub mod handlers;
pub mod prompts;

use tracing::{info, warn};

use crate::context::index::ContextIndex;
use crate::corpus::Document;
use crate::errors::AppError;
use crate::history::{HistoryStore, QaRecord};
use crate::llm_client::{generate_with_fallback, TextCompletion, MAX_TOKENS, MODEL_CHAIN};
use crate::selection::{compose_context, AssembledContext, ContextBudget};
use prompts::build_chat_prompt;

/// Character cap on the corpus text of one chat prompt.
pub const CHAT_CONTEXT_CHARS: usize = 600_000;
/// Past exchanges replayed into the prompt.
pub const MEMORY_TURNS: usize = 10;
const NO_HISTORY: &str = "No previous conversation.";

/// Admits every document untruncated until the chat cap is reached.
fn chat_budget(document_count: usize) -> ContextBudget {
    ContextBudget {
        total_chars: CHAT_CONTEXT_CHARS,
        max_docs: document_count,
        max_chars_per_doc: CHAT_CONTEXT_CHARS,
        ..ContextBudget::default()
    }
}

/// Corpus context for `question`: the ranked knowledge block followed by
/// every document that fits.
pub fn chat_context(question: &str, index: &ContextIndex, documents: &[Document]) -> AssembledContext {
    let context = compose_context(
        question,
        index,
        documents,
        Vec::new(),
        &chat_budget(documents.len()),
    );
    if context.documents_used.len() < documents.len() {
        warn!(
            "Chat context capped at {CHAT_CONTEXT_CHARS} chars: {} of {} documents included",
            context.documents_used.len(),
            documents.len()
        );
    }
    context
}

/// The last `MEMORY_TURNS` exchanges as `User:`/`Assistant:` pairs.
pub fn format_conversation(records: &[QaRecord]) -> String {
    if records.is_empty() {
        return NO_HISTORY.to_string();
    }
    let start = records.len().saturating_sub(MEMORY_TURNS);
    records[start..]
        .iter()
        .map(|r| format!("User: {}\nAssistant: {}", r.question, r.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Answers `question` from the corpus and records the exchange.
pub async fn answer_question(
    llm: &dyn TextCompletion,
    history: &dyn HistoryStore,
    index: &ContextIndex,
    documents: &[Document],
    question: &str,
) -> Result<String, AppError> {
    if documents.is_empty() {
        return Err(AppError::Validation(
            "No specs loaded. Add documents to the data directory first.".to_string(),
        ));
    }

    let context = chat_context(question, index, documents);
    let corpus = format!("{}\n\n{}", context.knowledge, context.examples);
    let past = history.load().await?;
    let prompt = build_chat_prompt(&corpus, &format_conversation(&past), question);
    info!(
        "Chat prompt: {} chars, {} documents, {} past exchanges",
        prompt.len(),
        context.documents_used.len(),
        past.len().min(MEMORY_TURNS)
    );

    let answer = generate_with_fallback(llm, &prompt, MODEL_CHAIN, MAX_TOKENS).await?;
    history
        .append(QaRecord {
            question: question.to_string(),
            answer: answer.clone(),
        })
        .await?;
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::InMemoryHistoryStore;
    use crate::llm_client::testing::ScriptedCompletion;
    use crate::llm_client::LlmError;
    use pretty_assertions::assert_eq;

    fn qa(i: usize) -> QaRecord {
        QaRecord {
            question: format!("question {i}?"),
            answer: format!("answer {i}"),
        }
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("shop.md", "## Gem Shop\nPlayers buy gems with coins."),
            Document::new("rewards.md", "## Daily Rewards\nA streak resets after a missed day."),
        ]
    }

    #[test]
    fn test_conversation_keeps_last_ten_exchanges() {
        let records: Vec<QaRecord> = (0..12).map(qa).collect();
        let text = format_conversation(&records);
        assert!(!text.contains("question 1?"), "oldest exchanges dropped");
        assert!(text.starts_with("User: question 2?\nAssistant: answer 2"));
        assert!(text.ends_with("User: question 11?\nAssistant: answer 11"));
        assert_eq!(text.matches("User: ").count(), MEMORY_TURNS);
    }

    #[test]
    fn test_empty_conversation_placeholder() {
        assert_eq!(format_conversation(&[]), NO_HISTORY);
    }

    #[test]
    fn test_small_corpus_included_whole() {
        let docs = corpus();
        let index = ContextIndex::build(&docs);
        let context = chat_context("How do streaks work?", &index, &docs);
        assert_eq!(context.documents_used, vec!["shop.md", "rewards.md"]);
        assert!(context.examples.contains("A streak resets after a missed day."));
    }

    #[test]
    fn test_large_corpus_capped() {
        let docs: Vec<Document> = (0..3)
            .map(|i| Document::new(format!("big_{i}.md"), "reward ".repeat(40_000)))
            .collect();
        let index = ContextIndex::build(&docs);
        let context = chat_context("reward", &index, &docs);
        assert!(context.total_chars() <= CHAT_CONTEXT_CHARS);
        assert_eq!(context.documents_used.len(), 2, "third 280k-char document does not fit");
    }

    #[tokio::test]
    async fn test_answer_uses_memory_and_records_exchange() {
        let docs = corpus();
        let index = ContextIndex::build(&docs);
        let history = InMemoryHistoryStore::default();
        history.append(qa(1)).await.unwrap();
        let llm = ScriptedCompletion::new(vec![Ok("Streaks reset after one day.".to_string())]);

        let answer = answer_question(&llm, &history, &index, &docs, "When do streaks reset?")
            .await
            .unwrap();

        assert_eq!(answer, "Streaks reset after one day.");
        let prompt = llm.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("User: question 1?\nAssistant: answer 1"));
        assert!(prompt.contains("--- EXAMPLE 2: rewards.md ---"));
        assert!(prompt.trim_end().ends_with("When do streaks reset?"));

        let stored = history.load().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].answer, "Streaks reset after one day.");
    }

    #[tokio::test]
    async fn test_empty_corpus_rejected_without_model_call() {
        let llm = ScriptedCompletion::default();
        let history = InMemoryHistoryStore::default();
        let err = answer_question(&llm, &history, &ContextIndex::build(&[]), &[], "Anything?")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_answer_is_not_recorded() {
        let docs = corpus();
        let history = InMemoryHistoryStore::default();
        let llm = ScriptedCompletion::new(vec![
            Err(LlmError::EmptyContent),
            Err(LlmError::EmptyContent),
        ]);

        let result =
            answer_question(&llm, &history, &ContextIndex::build(&docs), &docs, "Gems?").await;

        assert!(matches!(result, Err(AppError::Llm(_))));
        assert!(history.load().await.unwrap().is_empty());
    }
}
