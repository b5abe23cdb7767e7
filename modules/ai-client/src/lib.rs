mod client;
pub mod error;
pub(crate) mod types;
pub mod util;

pub use error::ApiError;
pub use types::Usage;

use std::time::Duration;

use client::ClaudeClient;
use types::*;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Claude Agent
// =============================================================================

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: Option<String>,
    timeout: Duration,
}

/// Text reply from a vision call, with the token usage the API reported.
#[derive(Debug, Clone)]
pub struct VisionReply {
    pub text: String,
    pub usage: Option<Usage>,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Bound every call with a deadline. Timeouts surface as `ApiError::Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> ClaudeClient {
        let client = ClaudeClient::new(&self.api_key, self.timeout);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// Send an image to Claude vision and return the model's text reply.
    pub async fn describe_image(
        &self,
        bytes: &[u8],
        media_type: &str,
        system: &str,
        prompt: &str,
    ) -> Result<VisionReply, ApiError> {
        use base64::Engine;

        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let source = ImageSource {
            source_type: "base64".to_string(),
            media_type: media_type.to_string(),
            data: encoded,
        };

        let request = ChatRequest::new(&self.model)
            .system(system)
            .message(WireMessage::user_with_image(source, prompt))
            .max_tokens(4096)
            .temperature(0.0);

        let response = self.client().chat(&request).await?;

        let text = response.text().ok_or(ApiError::EmptyResponse)?;
        Ok(VisionReply {
            text,
            usage: response.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_new() {
        let ai = Claude::new("sk-ant-test", "claude-haiku-4-5-20251001");
        assert_eq!(ai.model(), "claude-haiku-4-5-20251001");
        assert_eq!(ai.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_claude_with_base_url() {
        let ai = Claude::new("sk-ant-test", "claude-haiku-4-5-20251001")
            .with_base_url("https://custom.api.com");
        assert_eq!(ai.base_url, Some("https://custom.api.com".to_string()));
    }

    #[test]
    fn test_claude_with_timeout() {
        let ai = Claude::new("sk-ant-test", "claude-haiku-4-5-20251001")
            .with_timeout(Duration::from_secs(10));
        assert_eq!(ai.timeout, Duration::from_secs(10));
    }
}
