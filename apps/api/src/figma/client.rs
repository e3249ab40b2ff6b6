use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{FigmaApi, FigmaError, FigmaFile};

const FIGMA_API_URL: &str = "https://api.figma.com/v1";

/// REST client authenticated with a personal access token.
#[derive(Clone)]
pub struct FigmaClient {
    client: Client,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    images: HashMap<String, Option<String>>,
}

impl FigmaClient {
    pub fn new(token: String) -> Result<Self, FigmaError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            token,
        })
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, FigmaError> {
        let response = self
            .client
            .get(url)
            .header("X-Figma-Token", &self.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FigmaError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl FigmaApi for FigmaClient {
    async fn get_file(&self, file_key: &str) -> Result<FigmaFile, FigmaError> {
        let url = format!("{FIGMA_API_URL}/files/{file_key}");
        Ok(self.get(&url, &[]).await?.json().await?)
    }

    async fn fetch_image_batch(
        &self,
        file_key: &str,
        node_ids: &[String],
    ) -> Result<HashMap<String, String>, FigmaError> {
        let url = format!("{FIGMA_API_URL}/images/{file_key}");
        let ids = node_ids.join(",");
        let body: ImagesResponse = self
            .get(&url, &[("ids", ids.as_str()), ("format", "png"), ("scale", "2")])
            .await?
            .json()
            .await?;
        Ok(body
            .images
            .into_iter()
            .filter_map(|(id, url)| url.map(|u| (id, u)))
            .collect())
    }
}
