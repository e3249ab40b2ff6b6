//! Spec verification: a finished spec is checked against the corpus for
//! conflicts, gaps, threats and structure problems.
//!
//! The model is asked for a JSON report. A reply without a parseable object
//! still produces a report, carrying the reply under `raw_analysis`.

pub mod handlers;
pub mod prompts;

use std::io::Write;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::corpus::{self, Document};
use crate::llm_client::{
    generate_with_fallback, strip_json_fences, LlmError, TextCompletion, MAX_TOKENS, MODEL_CHAIN,
};
use crate::selection::documents::truncate;
use crate::text::take_chars;
use prompts::build_verify_prompt;

/// Characters of the spec under review sent to the model.
pub const SPEC_CHARS: usize = 50_000;
/// Characters of each existing spec in the corpus digest.
pub const CHARS_PER_SPEC: usize = 5_000;
/// Cap on the whole corpus digest.
pub const CORPUS_CHARS: usize = 200_000;
const UNPARSED_SUMMARY: &str =
    "Analysis completed but could not parse structured output. See raw_analysis.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub severity: String,
    pub related_specs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gap {
    pub section: String,
    pub description: String,
    pub impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Threat {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub severity: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatIssue {
    pub issue: String,
    pub description: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationReport {
    pub conflicts: Vec<Conflict>,
    pub gaps: Vec<Gap>,
    pub threats: Vec<Threat>,
    pub format_issues: Vec<FormatIssue>,
    pub questions: Vec<String>,
    pub summary: String,
    /// Model reply, kept only when it could not be read as a report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_analysis: Option<String>,
}

/// Every existing spec, each cut to `CHARS_PER_SPEC`, as `--- SPEC: name ---`
/// blocks; the whole digest is capped at `CORPUS_CHARS`.
pub fn corpus_digest(documents: &[Document]) -> String {
    let digest = documents
        .iter()
        .map(|doc| {
            format!(
                "--- SPEC: {} ---\n{}",
                doc.filename,
                truncate(&doc.content, CHARS_PER_SPEC)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    take_chars(&digest, CORPUS_CHARS).to_string()
}

/// Reads the report out of the model's reply: the span from the first `{` to
/// the last `}`. Anything else degrades to an empty report with the reply
/// under `raw_analysis`.
pub fn parse_report(reply: &str) -> VerificationReport {
    let text = strip_json_fences(reply);
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            match serde_json::from_str::<VerificationReport>(&text[start..=end]) {
                Ok(report) => return report,
                Err(e) => warn!("Verification reply is not a valid report: {e}"),
            }
        }
    }
    VerificationReport {
        summary: UNPARSED_SUMMARY.to_string(),
        raw_analysis: Some(text.to_string()),
        ..Default::default()
    }
}

/// Checks `spec` (the text of `filename`) against `documents`.
pub async fn verify_spec(
    llm: &dyn TextCompletion,
    filename: &str,
    spec: &str,
    documents: &[Document],
) -> Result<VerificationReport, LlmError> {
    let corpus = corpus_digest(documents);
    let prompt = build_verify_prompt(
        filename,
        take_chars(spec, SPEC_CHARS),
        documents.len(),
        &corpus,
    );
    info!(
        "Verifying {filename} against {} specs ({} chars of prompt)",
        documents.len(),
        prompt.len()
    );

    let reply = generate_with_fallback(llm, &prompt, MODEL_CHAIN, MAX_TOKENS).await?;
    let report = parse_report(&reply);
    info!(
        "Verification of {filename}: {} conflicts, {} gaps, {} threats, {} format issues",
        report.conflicts.len(),
        report.gaps.len(),
        report.threats.len(),
        report.format_issues.len()
    );
    Ok(report)
}

/// Text of an uploaded file. The bytes go through a temporary file that
/// keeps the upload's extension, so the corpus extractors dispatch on it.
pub fn extract_upload(filename: &str, bytes: &[u8]) -> anyhow::Result<String> {
    let suffix = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let mut file = tempfile::Builder::new()
        .prefix("verify-")
        .suffix(&suffix)
        .tempfile()
        .context("creating temporary upload file")?;
    file.write_all(bytes).context("writing temporary upload file")?;
    file.flush().context("writing temporary upload file")?;
    Ok(corpus::extract_text(file.path()))
}
