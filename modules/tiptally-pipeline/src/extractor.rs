use std::sync::Arc;

use tracing::debug;

use tiptally_common::{ContentFingerprint, ExtractionResult, TipTallyError};

use crate::cache::ContentCache;
use crate::client::ReceiptExtractor;
use crate::normalizer::NormalizedImage;
use crate::retry::{retry, RetryPolicy};

/// Cache-aware wrapper around the extraction client.
///
/// A fingerprint with a live cache entry is never sent upstream again. Two
/// concurrent misses on the same fingerprint may both call out and both
/// write (last writer wins); results are pure functions of the image bytes,
/// so the race only wastes one external call.
pub struct RetryingExtractor {
    client: Arc<dyn ReceiptExtractor>,
    cache: Arc<ContentCache>,
    policy: RetryPolicy,
}

impl RetryingExtractor {
    pub fn new(
        client: Arc<dyn ReceiptExtractor>,
        cache: Arc<ContentCache>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            cache,
            policy,
        }
    }

    /// Consult the cache first; on a miss, call the client under the retry
    /// policy and store the result. Failed extractions are never cached.
    pub async fn extract_with_cache(
        &self,
        image: &NormalizedImage,
        fingerprint: &ContentFingerprint,
    ) -> Result<ExtractionResult, TipTallyError> {
        if let Some(cached) = self.cache.get(fingerprint).await {
            debug!(%fingerprint, "Cache hit, skipping extraction call");
            return Ok(cached);
        }

        let result = retry(&self.policy, || self.client.extract(image)).await?;
        self.cache.put(fingerprint.clone(), result.clone()).await;
        Ok(result)
    }
}
