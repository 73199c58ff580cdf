use serde::{Deserialize, Serialize};

/// One decoded unit of streamed output: a content delta plus the completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamChunk {
    pub content: String,
    pub done: bool,
}

impl StreamChunk {
    pub fn new(content: impl Into<String>, done: bool) -> Self {
        Self {
            content: content.into(),
            done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("Failed to generate response (HTTP {status})")]
    RequestFailed { status: u16 },
    #[error("No response body received")]
    NoBody,
    #[error("{message}")]
    Transport { message: String },
    #[error("Generation cancelled")]
    Cancelled,
}

impl StreamError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "Unknown error occurred".to_string()
        } else {
            message
        };
        StreamError::Transport { message }
    }

    /// HTTP status of the failed response, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamError::RequestFailed { status } => Some(*status),
            _ => None,
        }
    }
}

/// A stream line that was not valid JSON. Logged and skipped, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse stream line {line:?}: {message}")]
pub struct ChunkParseFailure {
    pub line: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

/// Wire shape of one stream line; fields other than these are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateLine {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}
