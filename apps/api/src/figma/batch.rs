//! Batched frame-image lookup.
//!
//! Ids are split into batches of `BATCH_SIZE` and run on `WORKERS`
//! concurrent tasks. A failing batch is bisected through an explicit work
//! stack until the offending ids are isolated; an id that fails on its own
//! is logged and skipped.

use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use super::FigmaApi;

pub const BATCH_SIZE: usize = 10;
pub const WORKERS: usize = 5;
const SPLIT_PAUSE: Duration = Duration::from_millis(500);

async fn fetch_bisecting(
    api: &dyn FigmaApi,
    file_key: &str,
    batch: Vec<String>,
) -> HashMap<String, String> {
    let mut images = HashMap::new();
    let mut stack = vec![batch];

    while let Some(mut ids) = stack.pop() {
        match api.fetch_image_batch(file_key, &ids).await {
            Ok(found) => {
                debug!("Fetched image batch of {}", ids.len());
                images.extend(found);
            }
            Err(e) if ids.len() > 1 => {
                let right = ids.split_off(ids.len() / 2);
                warn!(
                    "Image batch of {} failed ({e}), retrying as {} + {}",
                    ids.len() + right.len(),
                    ids.len(),
                    right.len()
                );
                // Left half is popped first.
                stack.push(right);
                stack.push(ids);
                tokio::time::sleep(SPLIT_PAUSE).await;
            }
            Err(e) => warn!("Failed to fetch image for node {}: {e}", ids[0]),
        }
    }
    images
}

/// Image URLs for `node_ids`, keyed by node id. Never fails as a whole.
pub async fn get_images(
    api: &dyn FigmaApi,
    file_key: &str,
    node_ids: &[String],
) -> HashMap<String, String> {
    if node_ids.is_empty() {
        return HashMap::new();
    }

    // Batches are owned: a stream of borrowed chunks makes this future
    // non-`Send` inside axum handlers.
    let batches: Vec<Vec<String>> = node_ids.chunks(BATCH_SIZE).map(<[String]>::to_vec).collect();
    let results: Vec<HashMap<String, String>> = stream::iter(batches)
        .map(|batch: Vec<String>| fetch_bisecting(api, file_key, batch))
        .buffer_unordered(WORKERS)
        .collect()
        .await;

    results.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figma::testing::FakeFigma;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{i}:1")).collect()
    }

    #[tokio::test]
    async fn test_batches_of_ten() {
        let fake = FakeFigma::default();
        let images = get_images(&fake, "K", &ids(23)).await;
        assert_eq!(images.len(), 23);
        let mut sizes: Vec<usize> = fake.batches.lock().unwrap().iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 10, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_batch_is_bisected_down_to_the_bad_id() {
        let fake = FakeFigma {
            poisoned: ["4:1".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let images = get_images(&fake, "K", &ids(10)).await;

        assert_eq!(images.len(), 9);
        assert!(!images.contains_key("4:1"));
        let batches = fake.batches.lock().unwrap();
        assert!(batches.iter().any(|b| b == &vec!["4:1".to_string()]));
        // 10 -> 5 -> 3 -> 2 -> 1, plus the healthy halves along the way
        assert!(batches.len() <= 9, "bisection stays logarithmic: {batches:?}");
    }

    #[tokio::test]
    async fn test_lookup_runs_on_a_spawned_task() {
        let handle = tokio::spawn(async move {
            let fake = FakeFigma::default();
            let node_ids = ids(12);
            get_images(&fake, "K", &node_ids).await.len()
        });
        assert_eq!(handle.await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_empty_ids_makes_no_requests() {
        let fake = FakeFigma::default();
        assert!(get_images(&fake, "K", &[]).await.is_empty());
        assert!(fake.batches.lock().unwrap().is_empty());
    }
}
