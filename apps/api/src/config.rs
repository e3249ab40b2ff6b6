use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::corpus::CorpusPaths;
use crate::selection::ContextBudget;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Missing key is reported per request, not at startup.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub data_dir: PathBuf,
    pub template_path: Option<PathBuf>,
    pub slide_map_path: Option<PathBuf>,
    pub context_budget_chars: usize,
    pub max_context_docs: usize,
    pub max_chars_per_doc: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = ContextBudget::default();
        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            data_dir: optional_env("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            template_path: optional_env("TEMPLATE_PATH").map(PathBuf::from),
            slide_map_path: optional_env("SLIDE_MAP_PATH").map(PathBuf::from),
            context_budget_chars: parse_env("CONTEXT_BUDGET_CHARS", defaults.total_chars)?,
            max_context_docs: parse_env("MAX_CONTEXT_DOCS", defaults.max_docs)?,
            max_chars_per_doc: parse_env("MAX_CHARS_PER_DOC", defaults.max_chars_per_doc)?,
        })
    }

    pub fn corpus_paths(&self) -> CorpusPaths {
        CorpusPaths::under(&self.data_dir)
    }

    pub fn context_budget(&self) -> ContextBudget {
        ContextBudget {
            total_chars: self.context_budget_chars,
            max_docs: self.max_context_docs,
            max_chars_per_doc: self.max_chars_per_doc,
            ..ContextBudget::default()
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are treated alike.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid number, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            database_url: String::new(),
            redis_url: String::new(),
            s3_bucket: String::new(),
            s3_endpoint: String::new(),
            aws_access_key_id: String::new(),
            aws_secret_access_key: String::new(),
            anthropic_api_key: None,
            port: 8080,
            rust_log: "info".to_string(),
            data_dir: PathBuf::from("/srv/specdeck"),
            template_path: None,
            slide_map_path: None,
            context_budget_chars: 20_000,
            max_context_docs: 3,
            max_chars_per_doc: 4_000,
        }
    }

    #[test]
    fn test_context_budget_from_config() {
        let budget = config().context_budget();
        assert_eq!(budget.total_chars, 20_000);
        assert_eq!(budget.max_docs, 3);
        assert_eq!(budget.max_chars_per_doc, 4_000);
        assert_eq!(budget.max_features, ContextBudget::default().max_features);
    }

    #[test]
    fn test_corpus_paths_under_data_dir() {
        let paths = config().corpus_paths();
        assert_eq!(paths.gdds, PathBuf::from("/srv/specdeck/gdds"));
        assert_eq!(paths.context_uploads, PathBuf::from("/srv/specdeck/context_uploads"));
    }
}
