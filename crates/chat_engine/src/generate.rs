use std::time::Duration;

use async_trait::async_trait;
use chat_logging::{chat_info, chat_warn};
use futures_util::StreamExt;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::types::GenerateRequest;
use crate::{ChunkStream, StreamError};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
const GENERATE_PATH: &str = "/api/generate";

#[derive(Debug, Clone)]
pub struct GenerateSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Source of streamed completions.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Sends one streaming request and returns its chunk sequence.
    ///
    /// Fails before any chunk is produced when the server rejects the request
    /// or returns no body. `cancel` aborts both the request and later reads.
    async fn start(
        &self,
        prompt: &str,
        model_id: &str,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, StreamError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGenerator {
    settings: GenerateSettings,
    client: reqwest::Client,
}

impl ReqwestGenerator {
    pub fn new(settings: GenerateSettings) -> Result<Self, StreamError> {
        // No overall timeout: a generation may legitimately stream for minutes.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(map_reqwest_error)?;
        Ok(Self { settings, client })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.settings.base_url.trim_end_matches('/'),
            GENERATE_PATH
        )
    }
}

#[async_trait]
impl Generator for ReqwestGenerator {
    async fn start(
        &self,
        prompt: &str,
        model_id: &str,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, StreamError> {
        let url = self.endpoint();
        let body = GenerateRequest {
            model: model_id,
            prompt,
            stream: true,
        };
        chat_info!(
            "POST {} model={} prompt_len={}",
            url,
            model_id,
            prompt.len()
        );

        let send = self.client.post(&url).json(&body).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            response = send => Some(response),
        };
        let Some(response) = response else {
            return Err(StreamError::Cancelled);
        };
        let response = response.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            chat_warn!("generation request rejected with {}", status);
            return Err(StreamError::RequestFailed {
                status: status.as_u16(),
            });
        }
        if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Err(StreamError::NoBody);
        }

        let bytes = response
            .bytes_stream()
            .map(|item| item.map_err(map_reqwest_error))
            .boxed();
        Ok(ChunkStream::new(bytes, cancel))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> StreamError {
    StreamError::transport(err.to_string())
}
