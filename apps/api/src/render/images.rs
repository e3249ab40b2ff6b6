//! Concurrent download of images referenced by generated markdown.
//!
//! Results are keyed by URL, so completion order never matters. A URL that
//! still fails after its retries is logged and left out; the filler then
//! writes the link text instead of an image.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use tracing::{info, warn};

use crate::render::image::ImageError;
use crate::render::markdown::LogicalSlide;

pub const DOWNLOAD_WORKERS: usize = 10;
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(2);

lazy_static! {
    pub static ref IMAGE_REF: Regex = Regex::new(r"!\[.*?\]\((.*?)\)").unwrap();
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, ImageError>;
}

#[derive(Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(10)).build()?,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, ImageError> {
        let fetch_err = |source| ImageError::Fetch {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.bytes().await.map_err(fetch_err)
    }
}

/// Every `![alt](url)` target across the slides, deduplicated.
pub fn image_urls(slides: &[LogicalSlide]) -> BTreeSet<String> {
    slides
        .iter()
        .flat_map(|s| s.content_lines.iter())
        .flat_map(|line| IMAGE_REF.captures_iter(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|url| !url.is_empty())
        .collect()
}

async fn fetch_with_retry(fetcher: &dyn ImageFetcher, url: &str) -> Result<Bytes, ImageError> {
    let mut delay = INITIAL_BACKOFF;
    let mut attempt = 1;
    loop {
        match fetcher.fetch(url).await {
            Err(e) if e.is_rate_limited() && attempt < MAX_ATTEMPTS => {
                warn!("Image fetch rate limited ({url}), retrying in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Downloads all `urls` with at most `DOWNLOAD_WORKERS` requests in flight.
pub async fn download_all(
    fetcher: &dyn ImageFetcher,
    urls: BTreeSet<String>,
) -> HashMap<String, Bytes> {
    if urls.is_empty() {
        return HashMap::new();
    }
    let requested = urls.len();

    let results: Vec<(String, Result<Bytes, ImageError>)> = stream::iter(urls)
        .map(|url| async move {
            let result = fetch_with_retry(fetcher, &url).await;
            (url, result)
        })
        .buffer_unordered(DOWNLOAD_WORKERS)
        .collect()
        .await;

    let mut images = HashMap::with_capacity(results.len());
    for (url, result) in results {
        match result {
            Ok(bytes) => {
                images.insert(url, bytes);
            }
            Err(e) => warn!("Error downloading {url}: {e}"),
        }
    }
    info!("Pre-fetched {}/{} images", images.len(), requested);
    images
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Serves canned bytes; unknown URLs return 404. Per-URL 429 counts let
    /// tests exercise the retry path.
    #[derive(Default)]
    pub struct StaticFetcher {
        pub images: HashMap<String, Bytes>,
        pub rate_limits: Mutex<HashMap<String, u32>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn with(images: impl IntoIterator<Item = (&'static str, Vec<u8>)>) -> Self {
            Self {
                images: images
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), Bytes::from(v)))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ImageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<Bytes, ImageError> {
            self.calls.lock().unwrap().push(url.to_string());
            if let Some(remaining) = self.rate_limits.lock().unwrap().get_mut(url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(ImageError::Status {
                        url: url.to_string(),
                        status: 429,
                    });
                }
            }
            self.images.get(url).cloned().ok_or(ImageError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}
