use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // AI provider
    pub anthropic_api_key: String,
    pub extraction_model: String,
    /// Per-call deadline for extraction requests, in seconds.
    pub request_timeout_secs: u64,

    // Normalization
    /// Neither image axis exceeds this after normalization.
    pub max_dimension: u32,
    /// JPEG re-encode quality, 1-100.
    pub jpeg_quality: u8,

    // Cache
    pub cache_ttl_secs: u64,

    // Retry
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,

    // Pricing (USD per million tokens), for cost estimates only
    pub input_price_per_mtok: f64,
    pub output_price_per_mtok: f64,

    // Web server
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            extraction_model: env_or("EXTRACTION_MODEL", "claude-haiku-4-5-20251001"),
            request_timeout_secs: parsed_env_or("REQUEST_TIMEOUT_SECS", 60),
            max_dimension: parsed_env_or("MAX_IMAGE_DIMENSION", 1568),
            jpeg_quality: parsed_env_or("JPEG_QUALITY", 85),
            cache_ttl_secs: parsed_env_or("CACHE_TTL_SECS", 3600),
            retry_max_attempts: parsed_env_or("RETRY_MAX_ATTEMPTS", 3),
            retry_base_delay_ms: parsed_env_or("RETRY_BASE_DELAY_MS", 1000),
            input_price_per_mtok: parsed_env_or("INPUT_PRICE_PER_MTOK", 1.0),
            output_price_per_mtok: parsed_env_or("OUTPUT_PRICE_PER_MTOK", 5.0),
            api_host: env_or("API_HOST", "0.0.0.0"),
            api_port: parsed_env_or("API_PORT", 3000),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number, got {raw:?}")),
        Err(_) => default,
    }
}
