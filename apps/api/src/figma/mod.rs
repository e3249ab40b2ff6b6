//! Figma export: frames, their text, prototype transitions and rendered
//! frame images, reduced to a prompt-sized summary.

pub mod batch;
pub mod client;
pub mod extract;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub use client::FigmaClient;
pub use extract::{parse_file_key, FigmaExport};

#[derive(Debug, Error)]
pub enum FigmaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Figma API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// A node of the Figma document tree. Only the fields the export reads are
/// kept; everything else in the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub children: Vec<Node>,
    pub characters: Option<String>,
    #[serde(rename = "transitionNodeID")]
    pub transition_node_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FigmaFile {
    #[serde(default)]
    pub document: Node,
}

#[async_trait]
pub trait FigmaApi: Send + Sync {
    async fn get_file(&self, file_key: &str) -> Result<FigmaFile, FigmaError>;

    /// One request for one batch of node ids. Nodes Figma could not render
    /// are absent from the result.
    async fn fetch_image_batch(
        &self,
        file_key: &str,
        node_ids: &[String],
    ) -> Result<HashMap<String, String>, FigmaError>;
}

/// Fetches and summarizes the file behind `url_or_key`.
pub async fn export(api: &dyn FigmaApi, url_or_key: &str) -> Result<FigmaExport, FigmaError> {
    let file_key = parse_file_key(url_or_key);
    let file = api.get_file(&file_key).await?;
    let pages = extract::extract_pages(&file);

    let frame_ids: Vec<String> = pages
        .iter()
        .flat_map(|p| p.frames.iter().map(|f| f.id.clone()))
        .collect();
    let images = batch::get_images(api, &file_key, &frame_ids).await;
    info!(
        "Fetched {} of {} frame images from Figma",
        images.len(),
        frame_ids.len()
    );

    let links = frame_ids
        .iter()
        .map(|id| (id.clone(), extract::deep_link(&file_key, id)))
        .collect();

    Ok(FigmaExport {
        file_key,
        pages,
        images,
        links,
    })
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    /// Serves a fixed file; image batches containing any id from `poisoned`
    /// fail, mimicking Figma timing out on a heavy frame.
    #[derive(Default)]
    pub struct FakeFigma {
        pub file: FigmaFile,
        pub poisoned: HashSet<String>,
        pub batches: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl FigmaApi for FakeFigma {
        async fn get_file(&self, _file_key: &str) -> Result<FigmaFile, FigmaError> {
            Ok(self.file.clone())
        }

        async fn fetch_image_batch(
            &self,
            _file_key: &str,
            node_ids: &[String],
        ) -> Result<HashMap<String, String>, FigmaError> {
            self.batches.lock().unwrap().push(node_ids.to_vec());
            if node_ids.iter().any(|id| self.poisoned.contains(id)) {
                return Err(FigmaError::Api {
                    status: 500,
                    message: "Render timeout".to_string(),
                });
            }
            Ok(node_ids
                .iter()
                .map(|id| (id.clone(), format!("https://img/{id}.png")))
                .collect())
        }
    }

    pub fn node(id: &str, name: &str, node_type: &str, children: Vec<Node>) -> Node {
        Node {
            id: id.to_string(),
            name: name.to_string(),
            node_type: node_type.to_string(),
            children,
            ..Default::default()
        }
    }

    pub fn text(id: &str, characters: &str) -> Node {
        Node {
            characters: Some(characters.to_string()),
            ..node(id, "Text", "TEXT", vec![])
        }
    }
}
