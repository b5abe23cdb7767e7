use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use ai_client::{ApiError, Claude};
use tiptally_common::{ExtractionResult, TipTallyError};

use crate::cost::CostEstimator;
use crate::normalizer::NormalizedImage;
use crate::parser::{parse_response, Parsed};

/// The seam between the pipeline and the external extraction capability.
/// Production uses `VisionExtractor`; tests substitute counting mocks.
#[async_trait]
pub trait ReceiptExtractor: Send + Sync {
    async fn extract(&self, image: &NormalizedImage) -> Result<ExtractionResult, TipTallyError>;
}

const SYSTEM_PROMPT: &str =
    "You are a receipt transcription service. You read photographed paper receipts \
     and return their contents as structured JSON. You never invent values that are \
     not visible on the receipt.";

const EXTRACTION_INSTRUCTION: &str = r#"Read this receipt photo and return a single JSON object with exactly these fields:

{
  "merchant": "business name, or null",
  "date": "transaction date as printed, or null",
  "time": "transaction time as printed, or null",
  "reference_number": "check or transaction number, or null",
  "subtotal": "amount before tip",
  "tip": "tip amount",
  "total": "total charged",
  "payment_method": "card, cash, or null",
  "names": ["customer or server names printed on the receipt"],
  "confidence": {
    "merchant": 0.0, "date": 0.0, "time": 0.0, "reference_number": 0.0,
    "subtotal": 0.0, "tip": 0.0, "total": 0.0, "payment_method": 0.0, "names": 0.0
  }
}

Rules:
- Monetary amounts are plain numbers without currency symbols (18.50, not "$18.50").
- The confidence object is required: one score in [0, 1] per field.
- Use null for anything not legible on the receipt. Do not guess amounts.
- Return only the JSON object, with no commentary around it."#;

/// Single-call client for the vision model: builds the request around a fixed
/// instruction, parses the free-form reply into the canonical result shape,
/// and annotates it with a cost estimate.
pub struct VisionExtractor {
    claude: Claude,
    estimator: CostEstimator,
}

impl VisionExtractor {
    pub fn new(claude: Claude, estimator: CostEstimator) -> Self {
        Self { claude, estimator }
    }
}

#[async_trait]
impl ReceiptExtractor for VisionExtractor {
    async fn extract(&self, image: &NormalizedImage) -> Result<ExtractionResult, TipTallyError> {
        let reply = self
            .claude
            .describe_image(
                image.bytes(),
                image.media_type(),
                SYSTEM_PROMPT,
                EXTRACTION_INSTRUCTION,
            )
            .await
            .map_err(map_api_error)?;

        let receipt = match parse_response(&reply.text) {
            Parsed::Ok(receipt) => receipt,
            Parsed::Failed(reason) => {
                warn!(reason, "Model reply did not contain a receipt object");
                return Err(TipTallyError::MalformedResponse(reason));
            }
        };

        let cost = self
            .estimator
            .estimate(image.bytes().len(), reply.text.len());
        debug!(
            input_tokens = cost.input_tokens,
            output_tokens = cost.output_tokens,
            merchant = receipt.fields.merchant.as_deref().unwrap_or("<unknown>"),
            "Receipt extracted"
        );

        Ok(ExtractionResult {
            fields: receipt.fields,
            confidence: receipt.confidence,
            cost,
            extracted_at: Utc::now(),
        })
    }
}

fn map_api_error(err: ApiError) -> TipTallyError {
    let message = err.to_string();
    match err {
        ApiError::Transient { .. } | ApiError::Timeout(_) | ApiError::Transport(_) => {
            TipTallyError::TransientService(message)
        }
        ApiError::Authentication { .. } => TipTallyError::Authentication(message),
        ApiError::InvalidRequest { .. } => TipTallyError::InvalidRequest(message),
        ApiError::EmptyResponse => TipTallyError::MalformedResponse(message),
    }
}
