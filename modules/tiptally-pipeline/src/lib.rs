//! The receipt-extraction pipeline: normalize, fingerprint, cache, extract
//! with retry, estimate cost. Batch processing isolates per-item failures
//! and releases every item's transient staging storage on all exit paths.

pub mod batch;
pub mod cache;
pub mod client;
pub mod cost;
pub mod extractor;
pub mod normalizer;
pub mod parser;
pub mod retry;

pub use batch::BatchCoordinator;
pub use cache::ContentCache;
pub use client::{ReceiptExtractor, VisionExtractor};
pub use cost::CostEstimator;
pub use extractor::RetryingExtractor;
pub use normalizer::{ImageNormalizer, NormalizedImage};
pub use retry::RetryPolicy;
