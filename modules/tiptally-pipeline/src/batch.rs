use tracing::{info, warn};

use tiptally_common::{
    BatchItemOutcome, BatchOutcome, ContentFingerprint, ExtractionResult, RawImage, TipTallyError,
};

use crate::extractor::RetryingExtractor;
use crate::normalizer::ImageNormalizer;

/// Drives a batch of receipt photos through the pipeline one item at a time.
///
/// Items run sequentially to respect the extraction service's rate limits.
/// One item's failure never aborts the rest, and each item's staging file is
/// released before the next item starts, on success and failure alike. The
/// only top-level failure is an empty batch.
pub struct BatchCoordinator {
    normalizer: ImageNormalizer,
    extractor: RetryingExtractor,
}

impl BatchCoordinator {
    pub fn new(normalizer: ImageNormalizer, extractor: RetryingExtractor) -> Self {
        Self {
            normalizer,
            extractor,
        }
    }

    /// Process one image outside a batch. Terminal errors propagate typed.
    pub async fn process_single(&self, raw: &RawImage) -> Result<ExtractionResult, TipTallyError> {
        self.process_item(raw).await
    }

    pub async fn process_batch(&self, images: &[RawImage]) -> Result<BatchOutcome, TipTallyError> {
        if images.is_empty() {
            return Err(TipTallyError::EmptyBatch);
        }

        let mut outcomes = Vec::with_capacity(images.len());
        for (index, raw) in images.iter().enumerate() {
            let filename = raw.label(index);
            match self.process_item(raw).await {
                Ok(result) => outcomes.push(BatchItemOutcome::Success {
                    item: index,
                    filename,
                    result,
                }),
                Err(err) => {
                    warn!(item = index, error = %err, "Batch item failed");
                    outcomes.push(BatchItemOutcome::Failure {
                        item: index,
                        filename,
                        error: err.to_string(),
                    });
                }
            }
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let outcome = BatchOutcome {
            submitted: images.len(),
            succeeded,
            failed: images.len() - succeeded,
            outcomes,
        };
        info!(
            submitted = outcome.submitted,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Batch processed"
        );
        Ok(outcome)
    }

    /// The normalized image — and its staging file — lives exactly as long
    /// as this call: dropped on every exit path, including errors.
    async fn process_item(&self, raw: &RawImage) -> Result<ExtractionResult, TipTallyError> {
        let normalized = self.normalizer.normalize(raw)?;
        let fingerprint = ContentFingerprint::of(normalized.bytes());
        self.extractor
            .extract_with_cache(&normalized, &fingerprint)
            .await
    }
}
