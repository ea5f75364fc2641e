//! Shared mock collaborators for memory tests.
#![allow(dead_code)]

use async_trait::async_trait;
use relay_core::Result;
use relay_memory::{Embedder, Summarizer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// Re-exported for convenience in tests.
pub use relay_core::Error;

/// Deterministic 8-dimensional embedder: each dimension accumulates the
/// bytes at positions congruent to it. Identical texts embed identically.
pub struct HashEmbedder {
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn embed_text(text: &str) -> Vec<f32> {
        let mut v = [0.0f32; 8];
        for (i, b) in text.bytes().enumerate() {
            v[i % 8] += b as f32;
        }
        // Offset so no vector is ever all-zero.
        v.iter_mut().for_each(|x| *x += 1.0);
        v.to_vec()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::embed_text(t)).collect())
    }
}

/// An embedder that always fails.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::Embedding("mock embedder down".into()))
    }
}

/// Summarizer echoing the first 50 characters of its prompt, recording
/// every prompt it sees.
pub struct EchoSummarizer {
    pub prompts: Mutex<Vec<String>>,
    pub failing: std::sync::atomic::AtomicBool,
}

impl EchoSummarizer {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            failing: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, content: &str) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Summarize("mock summarizer down".into()));
        }
        self.prompts.lock().unwrap().push(content.to_string());
        Ok(content.chars().take(50).collect())
    }
}
