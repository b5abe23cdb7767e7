use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded receipt photo, exactly as the caller provided it.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub bytes: Vec<u8>,
    /// Declared media type, e.g. "image/jpeg" or "image/png".
    pub media_type: String,
    pub filename: Option<String>,
}

impl RawImage {
    /// Identity used in batch outcomes: the original filename when present,
    /// otherwise a positional label.
    pub fn label(&self, index: usize) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| format!("image-{index}"))
    }
}

/// What the vision model reads off a receipt.
/// Monetary fields are two-decimal strings without a currency symbol
/// ("5.50", never "5.5" or "$5.50").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptFields {
    pub merchant: Option<String>,
    /// Transaction date as printed on the receipt.
    pub date: Option<String>,
    pub time: Option<String>,
    /// Check / transaction / reference number.
    pub reference_number: Option<String>,
    pub subtotal: Option<String>,
    pub tip: Option<String>,
    pub total: Option<String>,
    /// "card", "cash", etc.
    pub payment_method: Option<String>,
    /// Customer or server names printed on the receipt.
    #[serde(default)]
    pub names: Vec<String>,
}

/// Per-field confidence in [0.0, 1.0].
/// Scores the model omits are synthesized in the high-confidence band
/// rather than left absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub merchant: f64,
    pub date: f64,
    pub time: f64,
    pub reference_number: f64,
    pub subtotal: f64,
    pub tip: f64,
    pub total: f64,
    pub payment_method: f64,
    pub names: f64,
}

/// Rough projection of what one extraction call cost.
/// Token counts are derived from payload-size ratios, not billing records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

/// The canonical structured output for one receipt.
/// Immutable once created; cache entries are snapshots of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub fields: ReceiptFields,
    pub confidence: ConfidenceScores,
    pub cost: CostEstimate,
    pub extracted_at: DateTime<Utc>,
}

/// Per-item result inside a batch. A failure carries the input identity and
/// a human-readable error, never the error itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchItemOutcome {
    Success {
        /// Position in the submitted batch.
        item: usize,
        filename: String,
        result: ExtractionResult,
    },
    Failure {
        item: usize,
        filename: String,
        error: String,
    },
}

impl BatchItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchItemOutcome::Success { .. })
    }
}

/// Aggregate result of a batch submission. Outcome order matches input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<BatchItemOutcome>,
}

/// Cache counters exposed for operational tooling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}
