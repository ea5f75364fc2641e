//! Streaming response abstractions for the unified LLM interface.

use crate::response::{FinishReason, Usage};
use crate::tool::ToolCall;
use crate::Result;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// A boxed stream of completion chunks.
///
/// The stream is lazy and non-restartable. It terminates either normally —
/// the final chunk carries the usage record — or with an error item.
/// Dropping the stream releases transport resources; dropping is idempotent.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// A streaming chat completion chunk
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StreamChunk {
    /// The content delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool call deltas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// The reason the model stopped generating (final chunk only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Token usage statistics (final chunk only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl StreamChunk {
    /// A chunk carrying a content delta.
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            content: Some(delta.into()),
            ..Default::default()
        }
    }

    /// A chunk carrying tool call deltas.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(calls),
            ..Default::default()
        }
    }

    /// The terminal chunk of a stream.
    pub fn done(reason: FinishReason, usage: Usage) -> Self {
        Self {
            finish_reason: Some(reason),
            usage: Some(usage),
            ..Default::default()
        }
    }

    /// Whether this is the terminal chunk of the stream.
    pub fn is_done(&self) -> bool {
        self.finish_reason.is_some()
    }
}
