//! Vector memory: embedding-indexed semantic recall.

use crate::entry::{generate_id, match_query, Entry, Memory, MemoryStats, SearchQuery};
use async_trait::async_trait;
use compact_str::CompactString;
use relay_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Maps texts to dense vectors. Usually backed by an embedding model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed the given texts. The output preserves input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// A function-backed [`Embedder`] for tests and simple pipelines.
pub struct FnEmbedder<F>(pub F);

#[async_trait]
impl<F> Embedder for FnEmbedder<F>
where
    F: Fn(&[String]) -> Result<Vec<Vec<f32>>> + Send + Sync,
{
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (self.0)(texts)
    }
}

/// One hit from a vector store search. Higher score = more similar.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VectorResult {
    /// Stored vector id
    pub id: CompactString,

    /// Cosine similarity to the query
    pub score: f32,

    /// Metadata stored alongside the vector
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// Vector similarity storage.
///
/// Backends (in-memory, Qdrant, ...) implement this contract; score
/// semantics are cosine similarity, higher is more similar.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a vector under an id, replacing any previous one.
    async fn add(&self, id: &str, embedding: Vec<f32>, metadata: Map<String, Value>)
        -> Result<()>;

    /// The `top_k` most similar stored vectors, descending by score.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<VectorResult>>;

    /// Delete a vector by id.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Remove all vectors.
    async fn clear(&self) -> Result<()>;

    /// Number of stored vectors.
    async fn count(&self) -> Result<usize>;
}

/// Cosine similarity, accumulated in f64 for precision.
///
/// Returns 0 when the lengths differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for i in 0..a.len() {
        dot += a[i] as f64 * b[i] as f64;
        norm_a += a[i] as f64 * a[i] as f64;
        norm_b += b[i] as f64 * b[i] as f64;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// In-memory [`VectorStore`], the default backend.
pub struct InMemoryVectorStore {
    vectors: RwLock<HashMap<CompactString, (Vec<f32>, Map<String, Value>)>>,
    dimension: usize,
}

impl InMemoryVectorStore {
    /// Create a store for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: RwLock::new(HashMap::new()),
            dimension,
        }
    }

    /// The configured vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(
        &self,
        id: &str,
        embedding: Vec<f32>,
        metadata: Map<String, Value>,
    ) -> Result<()> {
        let mut vectors = self.vectors.write().expect("vector store lock poisoned");
        vectors.insert(id.into(), (embedding, metadata));
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<VectorResult>> {
        let vectors = self.vectors.read().expect("vector store lock poisoned");

        let mut results: Vec<VectorResult> = vectors
            .iter()
            .map(|(id, (stored, metadata))| VectorResult {
                id: id.clone(),
                score: cosine_similarity(embedding, stored),
                metadata: metadata.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if top_k > 0 && top_k < results.len() {
            results.truncate(top_k);
        }

        Ok(results)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut vectors = self.vectors.write().expect("vector store lock poisoned");
        vectors.remove(id);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut vectors = self.vectors.write().expect("vector store lock poisoned");
        vectors.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.vectors.read().expect("vector store lock poisoned").len())
    }
}

/// Configuration of a [`VectorMemory`].
#[derive(Debug, Clone)]
pub struct VectorConfig {
    /// Embedding dimension
    pub dimension: usize,

    /// Minimum similarity for a search hit
    pub min_score: f32,

    /// Result count when the query does not set a limit
    pub default_top_k: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            dimension: 1536,
            min_score: 0.7,
            default_top_k: 10,
        }
    }
}

/// Embedding-indexed memory with semantic search.
///
/// Entries live in a local map; their embeddings live in a [`VectorStore`].
/// Saving embeds the content when no embedding was supplied. An embedding
/// failure on save is logged and skipped — the entry is still stored, it
/// just cannot be found semantically.
pub struct VectorMemory {
    entries: RwLock<HashMap<CompactString, Entry>>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    config: VectorConfig,
}

impl VectorMemory {
    /// Create a vector memory over an in-memory store.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_config(embedder, None, VectorConfig::default())
    }

    /// Create a vector memory with an explicit store and configuration.
    pub fn with_config(
        embedder: Arc<dyn Embedder>,
        store: Option<Arc<dyn VectorStore>>,
        config: VectorConfig,
    ) -> Self {
        let store =
            store.unwrap_or_else(|| Arc::new(InMemoryVectorStore::new(config.dimension)));
        Self {
            entries: RwLock::new(HashMap::new()),
            embedder,
            store,
            config,
        }
    }

    /// The configured minimum similarity.
    pub fn min_score(&self) -> f32 {
        self.config.min_score
    }

    /// Search by query text, returning the `top_k` most similar entries.
    pub async fn semantic_search(&self, query: &str, top_k: usize) -> Result<Vec<Entry>> {
        self.search(SearchQuery::text(query).with_limit(top_k)).await
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut embeddings = self
            .embedder
            .embed(&texts)
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;
        if embeddings.is_empty() {
            return Err(Error::Embedding("embedder returned no vectors".into()));
        }
        Ok(embeddings.swap_remove(0))
    }

    fn store_metadata(entry: &Entry) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("id".into(), json!(entry.id.as_str()));
        metadata.insert("role".into(), json!(entry.role.as_str()));
        metadata.insert("created_at".into(), json!(entry.created_at.timestamp()));
        for (k, v) in &entry.metadata {
            metadata.insert(k.clone(), v.clone());
        }
        metadata
    }

    fn insert_local(&self, entry: Entry) {
        let mut entries = self.entries.write().expect("vector memory lock poisoned");
        entries.insert(entry.id.clone(), entry);
    }
}

#[async_trait]
impl Memory for VectorMemory {
    async fn save(&self, mut entry: Entry) -> Result<()> {
        if entry.id.is_empty() {
            entry.id = generate_id();
        }

        if entry.embedding.is_none() && !entry.content.is_empty() {
            match self.embed_one(&entry.content).await {
                Ok(embedding) => entry.embedding = Some(embedding),
                Err(err) => {
                    tracing::warn!("embedding failed for entry {}, stored without: {err}", entry.id);
                }
            }
        }

        let embedding = entry.embedding.clone();
        let metadata = Self::store_metadata(&entry);
        let id = entry.id.clone();
        self.insert_local(entry);

        if let Some(embedding) = embedding {
            self.store.add(&id, embedding, metadata).await?;
        }

        Ok(())
    }

    /// Embeds all unembedded entries in one call to amortize latency.
    async fn save_batch(&self, mut entries: Vec<Entry>) -> Result<()> {
        let texts: Vec<String> = entries
            .iter()
            .filter(|e| e.embedding.is_none() && !e.content.is_empty())
            .map(|e| e.content.clone())
            .collect();

        if !texts.is_empty() {
            match self.embedder.embed(&texts).await {
                Ok(embeddings) => {
                    let mut embeddings = embeddings.into_iter();
                    for entry in entries
                        .iter_mut()
                        .filter(|e| e.embedding.is_none() && !e.content.is_empty())
                    {
                        entry.embedding = embeddings.next();
                    }
                }
                Err(err) => {
                    tracing::warn!("batch embedding failed, storing entries without: {err}");
                }
            }
        }

        for entry in entries {
            self.save(entry).await?;
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Entry>> {
        let entries = self.entries.read().expect("vector memory lock poisoned");
        Ok(entries.get(id).cloned())
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<Entry>> {
        let top_k = if query.limit > 0 {
            query.limit
        } else {
            self.config.default_top_k
        };

        let query_vector = match (&query.embedding, &query.query) {
            (Some(embedding), _) => Some(embedding.clone()),
            (None, Some(text)) if !text.is_empty() => Some(self.embed_one(text).await?),
            _ => None,
        };

        if let Some(vector) = query_vector {
            let hits = self.store.search(&vector, top_k).await?;

            let entries = self.entries.read().expect("vector memory lock poisoned");
            let mut results = Vec::new();
            for hit in hits {
                if hit.score < self.config.min_score {
                    continue;
                }
                let Some(entry) = entries.get(&hit.id) else {
                    continue;
                };
                if !match_query(entry, &query) {
                    continue;
                }
                let mut entry = entry.clone();
                entry.metadata.insert("_score".into(), json!(hit.score));
                results.push(entry);
            }
            return Ok(results);
        }

        // No query vector: a plain time-ordered scan.
        let mut results: Vec<Entry> = {
            let entries = self.entries.read().expect("vector memory lock poisoned");
            entries
                .values()
                .filter(|e| match_query(e, &query))
                .cloned()
                .collect()
        };

        results.sort_by(|a, b| {
            if query.order_desc {
                b.created_at.cmp(&a.created_at)
            } else {
                a.created_at.cmp(&b.created_at)
            }
        });

        let start = query.offset.min(results.len());
        let end = if query.limit > 0 {
            (start + query.limit).min(results.len())
        } else {
            results.len()
        };
        Ok(results[start..end].to_vec())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        {
            let mut entries = self.entries.write().expect("vector memory lock poisoned");
            entries.remove(id);
        }
        self.store.delete(id).await
    }

    async fn clear(&self) -> Result<()> {
        {
            let mut entries = self.entries.write().expect("vector memory lock poisoned");
            entries.clear();
        }
        self.store.clear().await
    }

    fn stats(&self) -> MemoryStats {
        let entries = self.entries.read().expect("vector memory lock poisoned");
        MemoryStats {
            entry_count: entries.len(),
            token_count: entries.values().map(Entry::estimate_tokens).sum(),
            oldest_entry: entries.values().map(|e| e.created_at).min(),
            newest_entry: entries.values().map(|e| e.created_at).max(),
        }
    }
}
