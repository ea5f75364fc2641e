//! Shared mock provider for router tests.
#![allow(dead_code)]

use async_trait::async_trait;
use compact_str::CompactString;
use relay_core::{
    CompletionRequest, CompletionResponse, CompletionStream, Error, Feature, FinishReason,
    Message, ModelInfo, Provider, Result, StreamChunk, Usage,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A provider returning canned responses, with an optional failure switch.
pub struct MockProvider {
    name: CompactString,
    models: Vec<ModelInfo>,
    failing: AtomicBool,
    pub calls: AtomicUsize,
    canned: String,
}

impl MockProvider {
    pub fn new(name: &str, models: Vec<ModelInfo>) -> Self {
        Self {
            name: name.into(),
            models,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            canned: "mock response".to_string(),
        }
    }

    pub fn with_response(mut self, content: &str) -> Self {
        self.canned = content.to_string();
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Upstream {
                status: 500,
                body: "mock failure".into(),
            });
        }
        Ok(CompletionResponse {
            id: "mock-response".into(),
            model: req.model,
            content: self.canned.clone(),
            usage: Usage::new(100, 50),
            finish_reason: Some(FinishReason::Stop),
            created: 0,
            ..Default::default()
        })
    }

    async fn stream(&self, req: CompletionRequest) -> Result<CompletionStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Upstream {
                status: 500,
                body: "mock failure".into(),
            });
        }
        let _ = req;
        let chunks = vec![
            Ok(StreamChunk::content("mock ")),
            Ok(StreamChunk::content("stream")),
            Ok(StreamChunk::done(FinishReason::Stop, Usage::new(100, 50))),
        ];
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }

    fn models(&self) -> Vec<ModelInfo> {
        self.models.clone()
    }

    fn count_tokens(&self, messages: &[Message]) -> Result<usize> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Unavailable("mock down".into()));
        }
        Ok(relay_core::estimate_tokens(messages))
    }
}

/// Model metadata helper.
pub fn model(id: &str, input_cost: f64, output_cost: f64, features: &[Feature]) -> ModelInfo {
    ModelInfo {
        id: id.into(),
        name: id.to_string(),
        max_tokens: 128_000,
        input_cost_per_million: input_cost,
        output_cost_per_million: output_cost,
        features: features.to_vec(),
        ..Default::default()
    }
}
