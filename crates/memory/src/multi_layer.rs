//! Three-tier layered memory: working, short-term and long-term.
//!
//! Entries land in the working buffer; once it grows past the transfer
//! threshold the older part is promoted into the short-term summary tier,
//! and once that tier grows past its own threshold its older part is
//! promoted into the long-term vector tier (with batched embedding). The
//! orchestrator itself holds no lock across tier calls — every tier guards
//! its own state.

use crate::buffer::BufferMemory;
use crate::entry::{Entry, Memory, MemoryStats, SearchQuery};
use crate::summary::{Summarizer, SummaryConfig, SummaryMemory};
use crate::vector::{Embedder, VectorConfig, VectorMemory, VectorStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::{Error, Result, Role};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// The tier an entry was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryLayer {
    /// Current conversation context, small and fast
    Working,
    /// Recent history with summary compression
    ShortTerm,
    /// Semantic long-term storage
    LongTerm,
}

impl MemoryLayer {
    /// The wire spelling of the layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryLayer::Working => "working",
            MemoryLayer::ShortTerm => "short_term",
            MemoryLayer::LongTerm => "long_term",
        }
    }
}

/// Configuration of a [`MultiLayerMemory`].
#[derive(Debug, Clone)]
pub struct MultiLayerConfig {
    /// Working buffer capacity
    pub working_capacity: usize,

    /// Short-term compression threshold (entries)
    pub short_term_max_entries: usize,

    /// Entries the short-term tier keeps verbatim through compression
    pub short_term_keep_recent: usize,

    /// Minimum similarity for long-term recall
    pub long_term_min_score: f32,

    /// Long-term hits pulled into the context feed
    pub long_term_top_k: usize,

    /// Promote automatically as thresholds trip
    pub auto_transfer: bool,

    /// Working size that triggers promotion into short-term
    pub working_to_short_threshold: usize,

    /// Short-term size that triggers promotion into long-term
    pub short_to_long_threshold: usize,
}

impl Default for MultiLayerConfig {
    fn default() -> Self {
        Self {
            working_capacity: 10,
            short_term_max_entries: 50,
            short_term_keep_recent: 10,
            long_term_min_score: 0.75,
            long_term_top_k: 5,
            auto_transfer: true,
            working_to_short_threshold: 8,
            short_to_long_threshold: 40,
        }
    }
}

/// Promotion statistics.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MultiLayerStats {
    /// Entries currently in the working tier
    pub working_count: usize,
    /// Entries currently in the short-term tier
    pub short_term_count: usize,
    /// Entries currently in the long-term tier
    pub long_term_count: usize,
    /// How many promotions have run
    pub transfer_count: usize,
    /// When the last promotion ran
    pub last_transfer: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct TransferLog {
    transfer_count: usize,
    last_transfer: Option<DateTime<Utc>>,
}

/// Builder for [`MultiLayerMemory`].
#[derive(Default)]
pub struct MultiLayerBuilder {
    config: MultiLayerConfig,
    summarizer: Option<Arc<dyn Summarizer>>,
    embedder: Option<Arc<dyn Embedder>>,
    store: Option<Arc<dyn VectorStore>>,
}

impl MultiLayerBuilder {
    /// Replace the configuration.
    pub fn config(mut self, config: MultiLayerConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable the short-term tier with this summarizer.
    pub fn summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Enable the long-term tier with this embedder.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Use a specific vector store for the long-term tier.
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Wire up the tiers.
    pub fn build(self) -> MultiLayerMemory {
        let working = BufferMemory::new(self.config.working_capacity);

        let short_term = self.summarizer.map(|summarizer| {
            SummaryMemory::with_config(
                summarizer,
                SummaryConfig {
                    max_entries: self.config.short_term_max_entries,
                    keep_recent: self.config.short_term_keep_recent,
                    ..Default::default()
                },
            )
        });

        let long_term = self.embedder.map(|embedder| {
            VectorMemory::with_config(
                embedder,
                self.store,
                VectorConfig {
                    min_score: self.config.long_term_min_score,
                    ..Default::default()
                },
            )
        });

        MultiLayerMemory {
            working,
            short_term,
            long_term,
            config: self.config,
            log: Mutex::new(TransferLog::default()),
        }
    }
}

/// Layered memory orchestrating the working, short-term and long-term tiers.
pub struct MultiLayerMemory {
    working: BufferMemory,
    short_term: Option<SummaryMemory>,
    long_term: Option<VectorMemory>,
    config: MultiLayerConfig,
    log: Mutex<TransferLog>,
}

impl MultiLayerMemory {
    /// Start building a layered memory.
    pub fn builder() -> MultiLayerBuilder {
        MultiLayerBuilder::default()
    }

    /// A copy of the working buffer, oldest first.
    pub fn working_entries(&self) -> Vec<Entry> {
        self.working.entries()
    }

    /// Per-layer statistics.
    pub fn multi_stats(&self) -> MultiLayerStats {
        let log = self.log.lock().expect("transfer log lock poisoned");
        MultiLayerStats {
            working_count: self.working.stats().entry_count,
            short_term_count: self
                .short_term
                .as_ref()
                .map(|m| m.stats().entry_count)
                .unwrap_or(0),
            long_term_count: self
                .long_term
                .as_ref()
                .map(|m| m.stats().entry_count)
                .unwrap_or(0),
            transfer_count: log.transfer_count,
            last_transfer: log.last_transfer,
        }
    }

    /// Search a single tier.
    pub async fn search_layer(
        &self,
        layer: MemoryLayer,
        query: SearchQuery,
    ) -> Result<Vec<Entry>> {
        match layer {
            MemoryLayer::Working => self.working.search(query).await,
            MemoryLayer::ShortTerm => match &self.short_term {
                Some(tier) => tier.search(query).await,
                None => Err(Error::Config("short-term memory not configured".into())),
            },
            MemoryLayer::LongTerm => match &self.long_term {
                Some(tier) => tier.search(query).await,
                None => Err(Error::Config("long-term memory not configured".into())),
            },
        }
    }

    /// Clear a single tier.
    pub async fn clear_layer(&self, layer: MemoryLayer) -> Result<()> {
        match layer {
            MemoryLayer::Working => self.working.clear().await,
            MemoryLayer::ShortTerm => match &self.short_term {
                Some(tier) => tier.clear().await,
                None => Ok(()),
            },
            MemoryLayer::LongTerm => match &self.long_term {
                Some(tier) => tier.clear().await,
                None => Ok(()),
            },
        }
    }

    /// The prompt feed: the short-term summary (if any), the most relevant
    /// long-term memories for `query`, then the working buffer verbatim.
    pub async fn context(&self, query: &str) -> Result<Vec<Entry>> {
        let mut context = Vec::new();

        if let Some(short_term) = &self.short_term {
            let summary = short_term.summary();
            if !summary.is_empty() {
                let mut entry = Entry::new(Role::System, format!("对话历史摘要: {summary}"));
                entry.id = "summary".into();
                context.push(entry);
            }
        }

        if let Some(long_term) = &self.long_term {
            if !query.is_empty() {
                match long_term
                    .semantic_search(query, self.config.long_term_top_k)
                    .await
                {
                    Ok(hits) => context.extend(hits),
                    Err(err) => {
                        tracing::warn!("long-term recall failed, context degraded: {err}");
                    }
                }
            }
        }

        context.extend(self.working.entries());
        Ok(context)
    }

    /// Semantic recall from the long-term tier only.
    pub async fn recall(&self, query: &str, top_k: usize) -> Result<Vec<Entry>> {
        let long_term = self
            .long_term
            .as_ref()
            .ok_or_else(|| Error::Config("long-term memory not configured".into()))?;
        long_term.semantic_search(query, top_k).await
    }

    /// Save directly into the long-term tier.
    pub async fn save_to_long_term(&self, entry: Entry) -> Result<()> {
        let long_term = self
            .long_term
            .as_ref()
            .ok_or_else(|| Error::Config("long-term memory not configured".into()))?;
        long_term.save(entry).await
    }

    /// Run both promotions now, regardless of thresholds.
    pub async fn transfer(&self) -> Result<()> {
        self.promote_working().await?;
        self.promote_short_term().await
    }

    async fn check_and_transfer(&self) -> Result<()> {
        if self.working.stats().entry_count >= self.config.working_to_short_threshold {
            self.promote_working().await?;
        }

        if let Some(short_term) = &self.short_term {
            if short_term.stats().entry_count >= self.config.short_to_long_threshold {
                self.promote_short_term().await?;
            }
        }

        Ok(())
    }

    /// Move the older part of the working buffer into the short-term tier,
    /// keeping a recent tail in place.
    async fn promote_working(&self) -> Result<()> {
        let Some(short_term) = &self.short_term else {
            return Ok(());
        };

        let entries = self.working.entries();
        let keep = (self.config.working_capacity / 2).max(2);
        if entries.len() <= keep {
            return Ok(());
        }

        let split = entries.len() - keep;
        let (to_promote, recent) = entries.split_at(split);

        short_term.save_batch(to_promote.to_vec()).await?;

        self.working.clear().await?;
        for entry in recent {
            self.working.save(entry.clone()).await?;
        }

        self.mark_transfer();
        Ok(())
    }

    /// Move the older part of the short-term tier into long-term storage
    /// (batched embedding), then compress what stays behind.
    async fn promote_short_term(&self) -> Result<()> {
        let (Some(short_term), Some(long_term)) = (&self.short_term, &self.long_term) else {
            return Ok(());
        };

        let entries = short_term.entries();
        let keep = self.config.short_term_keep_recent;
        if entries.len() <= keep {
            return Ok(());
        }

        let split = entries.len() - keep;
        long_term.save_batch(entries[..split].to_vec()).await?;

        short_term.force_summarize().await?;

        self.mark_transfer();
        Ok(())
    }

    fn mark_transfer(&self) {
        let mut log = self.log.lock().expect("transfer log lock poisoned");
        log.transfer_count += 1;
        log.last_transfer = Some(Utc::now());
    }
}

fn tag_layer(entries: &mut [Entry], layer: MemoryLayer) {
    for entry in entries {
        entry.metadata.insert("_layer".into(), json!(layer.as_str()));
    }
}

#[async_trait]
impl Memory for MultiLayerMemory {
    async fn save(&self, entry: Entry) -> Result<()> {
        self.working.save(entry).await?;

        if self.config.auto_transfer {
            // Promotion failures never fail the save.
            if let Err(err) = self.check_and_transfer().await {
                tracing::warn!("memory promotion failed: {err}");
            }
        }

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Entry>> {
        if let Some(entry) = self.working.get(id).await? {
            return Ok(Some(entry));
        }
        if let Some(short_term) = &self.short_term {
            if let Some(entry) = short_term.get(id).await? {
                return Ok(Some(entry));
            }
        }
        if let Some(long_term) = &self.long_term {
            if let Some(entry) = long_term.get(id).await? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Aggregate matches from every tier, tagging each entry's metadata
    /// with the `_layer` it came from. The long-term tier only contributes
    /// when the query carries text or a vector.
    async fn search(&self, query: SearchQuery) -> Result<Vec<Entry>> {
        let mut all = Vec::new();

        if let Ok(mut entries) = self.working.search(query.clone()).await {
            tag_layer(&mut entries, MemoryLayer::Working);
            all.append(&mut entries);
        }

        if let Some(short_term) = &self.short_term {
            if let Ok(mut entries) = short_term.search(query.clone()).await {
                tag_layer(&mut entries, MemoryLayer::ShortTerm);
                all.append(&mut entries);
            }
        }

        if let Some(long_term) = &self.long_term {
            let semantic = query.query.as_deref().is_some_and(|q| !q.is_empty())
                || query.embedding.is_some();
            if semantic {
                if let Ok(mut entries) = long_term.search(query.clone()).await {
                    tag_layer(&mut entries, MemoryLayer::LongTerm);
                    all.append(&mut entries);
                }
            }
        }

        if query.limit > 0 && all.len() > query.limit {
            all.truncate(query.limit);
        }

        Ok(all)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.working.delete(id).await?;
        if let Some(short_term) = &self.short_term {
            short_term.delete(id).await?;
        }
        if let Some(long_term) = &self.long_term {
            long_term.delete(id).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.working.clear().await?;
        if let Some(short_term) = &self.short_term {
            short_term.clear().await?;
        }
        if let Some(long_term) = &self.long_term {
            long_term.clear().await?;
        }
        *self.log.lock().expect("transfer log lock poisoned") = TransferLog::default();
        Ok(())
    }

    fn stats(&self) -> MemoryStats {
        let mut stats = self.working.stats();
        if let Some(short_term) = &self.short_term {
            stats.entry_count += short_term.stats().entry_count;
        }
        if let Some(long_term) = &self.long_term {
            stats.entry_count += long_term.stats().entry_count;
        }
        stats
    }
}
