//! Document corpus: loads prior specs, slide exports and edge-case sheets from
//! the data directory and reduces each file to plain text.
//!
//! PDFs go through `pdf-extract`, Office files through [`office`], text-like
//! files are read as-is. Anything else becomes a sentinel string so a single
//! odd file never aborts a corpus load.

pub mod office;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Sidecar suffix holding the user-provided description of an uploaded file.
pub const DESCRIPTION_SUFFIX: &str = ".desc.txt";
/// Deck templates live next to the slide exports but are not reference text.
pub const TEMPLATE_SUFFIX: &str = ".deck.json";

/// Start of the text returned for files no extractor understands.
pub const UNSUPPORTED_FORMAT: &str = "Unsupported file format: ";

const TEXT_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "csv", "json"];

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One loaded source document. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    pub content: String,
    pub path: PathBuf,
}

impl Document {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            path: PathBuf::from(&filename),
            filename,
            content: content.into(),
        }
    }
}

/// Directory layout under `DATA_DIR`.
#[derive(Debug, Clone)]
pub struct CorpusPaths {
    pub gdds: PathBuf,
    pub slides: PathBuf,
    pub edge_cases: PathBuf,
    pub context_uploads: PathBuf,
}

impl CorpusPaths {
    pub fn under(data_dir: &Path) -> Self {
        Self {
            gdds: data_dir.join("gdds"),
            slides: data_dir.join("slides"),
            edge_cases: data_dir.join("edge_cases"),
            context_uploads: data_dir.join("context_uploads"),
        }
    }
}

/// Extracts plain text from a single file, dispatching on extension.
///
/// Unsupported formats yield `"Unsupported file format: .ext"` instead of an error.
/// Extraction failures are logged and yield an empty string.
pub fn extract_text(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => return or_empty(path, "PDF", pdf_extract::extract_text(path)),
        "docx" => return or_empty(path, "DOCX", office::docx_text(path)),
        "pptx" => return or_empty(path, "PPTX", office::pptx_text(path)),
        "xlsx" | "xls" => return or_empty(path, "spreadsheet", office::spreadsheet_text(path)),
        _ => {}
    }

    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return match fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("Error reading {}: {e}", path.display());
                String::new()
            }
        };
    }

    format!("{UNSUPPORTED_FORMAT}.{ext}")
}

fn or_empty<E: std::fmt::Display>(path: &Path, kind: &str, result: Result<String, E>) -> String {
    result.unwrap_or_else(|e| {
        warn!("Error parsing {kind} {}: {e}", path.display());
        String::new()
    })
}

/// Loads every visible file in `dir`, sorted by filename.
/// A missing directory is an empty corpus, not an error.
pub fn list_documents(dir: &Path) -> Result<Vec<Document>, CorpusError> {
    Ok(visible_files(dir)?
        .into_iter()
        .map(|(filename, path)| {
            let content = extract_text(&path);
            debug!("Loaded {filename} ({} chars)", content.chars().count());
            Document {
                filename,
                content,
                path,
            }
        })
        .collect())
}

/// Loads the reference corpus used for indexing: prior GDDs followed by slide exports.
pub fn load_reference_corpus(paths: &CorpusPaths) -> Result<Vec<Document>, CorpusError> {
    let mut docs = list_documents(&paths.gdds)?;
    docs.extend(
        list_documents(&paths.slides)?
            .into_iter()
            .filter(|d| !d.filename.ends_with(TEMPLATE_SUFFIX)),
    );
    Ok(docs)
}

/// Returns the text of the first edge-case sheet, or an empty string.
pub fn load_edge_cases(dir: &Path) -> Result<String, CorpusError> {
    Ok(visible_files(dir)?
        .into_iter()
        .next()
        .map(|(_, path)| extract_text(&path))
        .unwrap_or_default())
}

/// Formats user-uploaded context files together with their sidecar descriptions.
pub fn load_context_uploads(dir: &Path) -> Result<String, CorpusError> {
    let mut out = String::new();
    for (filename, path) in visible_files(dir)? {
        if filename.ends_with(DESCRIPTION_SUFFIX) {
            continue;
        }
        let desc_path = PathBuf::from(format!("{}{DESCRIPTION_SUFFIX}", path.display()));
        let description = fs::read_to_string(&desc_path).unwrap_or_default();
        let content = extract_text(&path);

        out.push_str(&format!("\n--- EXTRA CONTEXT FILE: {filename} ---\n"));
        out.push_str(&format!("User Description: {description}\n"));
        out.push_str(&format!("File Content:\n{content}\n"));
    }
    Ok(out)
}

/// Path of the first deck template under `dir`, skipping lock files.
pub fn find_template(dir: &Path) -> Result<Option<PathBuf>, CorpusError> {
    Ok(visible_files(dir)?
        .into_iter()
        .find(|(name, _)| name.ends_with(TEMPLATE_SUFFIX) && !name.starts_with('~'))
        .map(|(_, path)| path))
}

fn visible_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, CorpusError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let io_err = |source| CorpusError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let filename = entry.file_name().to_string_lossy().into_owned();
        if path.is_file() && !filename.starts_with('.') {
            files.push((filename, path));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}
