//! Layered conversation memory for LLM agents.
//!
//! Four building blocks behind one [`Memory`] trait:
//!
//! - [`BufferMemory`] — a bounded FIFO log with metadata filtering.
//! - [`SummaryMemory`] — a buffer that compresses its older half into a
//!   running summary via a [`Summarizer`].
//! - [`VectorMemory`] — embedding-indexed semantic recall over a
//!   [`VectorStore`].
//! - [`EntityMemory`] — an extractor-driven knowledge graph over the
//!   conversation.
//!
//! [`MultiLayerMemory`] stacks the first three into working, short-term and
//! long-term tiers with size-triggered promotion, and produces the prompt
//! feed (`context`) agents consume.

pub use {
    buffer::BufferMemory,
    entity::{
        normalize_name, Entity, EntityConfig, EntityExtractor, EntityMemory, EntityRelation,
        EntityStats, EntityType, ExtractedEntity, ExtractedRelation, ExtractionResult,
        FnExtractor, LlmEntityExtractor,
    },
    entry::{generate_id, Entry, Memory, MemoryStats, SearchQuery},
    multi_layer::{
        MemoryLayer, MultiLayerBuilder, MultiLayerConfig, MultiLayerMemory, MultiLayerStats,
    },
    summary::{FnSummarizer, Summarizer, SummaryConfig, SummaryMemory},
    vector::{
        cosine_similarity, Embedder, FnEmbedder, InMemoryVectorStore, VectorConfig, VectorMemory,
        VectorResult, VectorStore,
    },
};

mod buffer;
mod entity;
mod entry;
mod multi_layer;
mod summary;
mod vector;
