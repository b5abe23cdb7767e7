use tiptally_common::CostEstimate;

/// Approximates what one extraction call costs in USD.
///
/// Token counts are fixed-ratio approximations of payload sizes: images ship
/// base64-encoded at roughly 3 encoded bytes per input token, and serialized
/// JSON output runs about 4 bytes per output token. The result is a rough
/// operational projection, not a billing-accurate figure.
#[derive(Debug, Clone, Copy)]
pub struct CostEstimator {
    input_price_per_mtok: f64,
    output_price_per_mtok: f64,
}

impl CostEstimator {
    pub fn new(input_price_per_mtok: f64, output_price_per_mtok: f64) -> Self {
        Self {
            input_price_per_mtok,
            output_price_per_mtok,
        }
    }

    pub fn estimate(&self, input_byte_size: usize, output_byte_size: usize) -> CostEstimate {
        let base64_size = input_byte_size.div_ceil(3) * 4;
        let input_tokens = (base64_size / 3) as u64;
        let output_tokens = (output_byte_size / 4) as u64;

        let cost_usd = input_tokens as f64 / 1e6 * self.input_price_per_mtok
            + output_tokens as f64 / 1e6 * self.output_price_per_mtok;

        CostEstimate {
            input_tokens,
            output_tokens,
            cost_usd,
        }
    }
}
