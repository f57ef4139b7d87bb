//! Offline stand-in used when no credential is configured

use super::{ClientMode, InvokeOptions, LlmClient};
use crate::Result;
use async_trait::async_trait;

pub const STUB_MARKER: &str = "[llm_stub]";

/// Echoes the prompt behind a fixed marker. No I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubClient;

#[async_trait]
impl LlmClient for StubClient {
    fn mode(&self) -> ClientMode {
        ClientMode::Stub
    }

    async fn invoke(&self, prompt: &str, _options: &InvokeOptions) -> Result<String> {
        Ok(format!("{} {}", STUB_MARKER, prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_echoes_prompt() {
        let text = StubClient
            .invoke("hello", &InvokeOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "[llm_stub] hello");
    }

    #[tokio::test]
    async fn test_stub_ignores_options() {
        let options = InvokeOptions::default()
            .with_system("You are an advisor")
            .with_temperature(0.0);
        let text = StubClient.invoke("hello", &options).await.unwrap();
        assert_eq!(text, "[llm_stub] hello");
    }
}
