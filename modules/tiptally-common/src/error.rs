use thiserror::Error;

/// Error taxonomy for the extraction pipeline.
///
/// Only `TransientService` is worth retrying; everything else fails the item
/// immediately. Inside a batch, every variant is captured into a per-item
/// failure outcome and never aborts the remaining items.
#[derive(Debug, Error)]
pub enum TipTallyError {
    /// The uploaded payload is not an image type.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The image could not be decoded or re-encoded.
    #[error("image normalization failed: {0}")]
    NormalizationFailed(String),

    /// Rate limiting, server errors, or timeouts from the extraction service.
    #[error("transient extraction service error: {0}")]
    TransientService(String),

    /// The extraction service rejected our credentials.
    #[error("extraction service authentication failed: {0}")]
    Authentication(String),

    /// The extraction service rejected the request itself.
    #[error("extraction request rejected: {0}")]
    InvalidRequest(String),

    /// The model's response did not contain a parseable JSON object.
    #[error("malformed extraction response: {0}")]
    MalformedResponse(String),

    /// Every retry attempt failed with a transient error.
    #[error("extraction failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// A batch was submitted with no images in it.
    #[error("empty batch: no images submitted")]
    EmptyBatch,

    #[error("configuration error: {0}")]
    Config(String),
}

impl TipTallyError {
    /// Whether the retry policy should attempt this call again.
    pub fn is_transient(&self) -> bool {
        matches!(self, TipTallyError::TransientService(_))
    }
}
