//! Core abstractions for the relay unified LLM interface.
//!
//! Defines the shared types used across all providers and the crates built
//! on top of them: [`Message`], [`CompletionRequest`], [`CompletionResponse`],
//! [`StreamChunk`], [`ModelInfo`], the [`Provider`] trait, the tool surface,
//! and the common [`Error`] type.

pub use {
    error::{Error, Result},
    message::{estimate_tokens, Message, MessageBuilder, Role},
    model::{Feature, ModelInfo},
    provider::{EmbeddingProvider, Provider},
    request::CompletionRequest,
    response::{CompletionResponse, FinishReason, Usage},
    stream::{CompletionStream, StreamChunk},
    tool::{
        global, init_global, teardown_global, FunctionCall, Tool, ToolCall, ToolChoice,
        ToolDefinition, ToolFunctionDef, ToolRegistry,
    },
};

mod error;
mod message;
mod model;
mod provider;
mod request;
mod response;
mod stream;
mod tool;
