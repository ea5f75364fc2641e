//! Summary memory: a buffer that compresses its older half into a running
//! summary once it grows past a threshold.

use crate::buffer::BufferMemory;
use crate::entry::{Entry, Memory, MemoryStats, SearchQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::{Error, Result, Role};
use std::sync::{Arc, RwLock};

/// Compresses a transcript into a short text. Usually backed by an LLM.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a summary of the given content.
    async fn summarize(&self, content: &str) -> Result<String>;
}

/// A function-backed [`Summarizer`] for tests and simple pipelines.
pub struct FnSummarizer<F>(pub F);

#[async_trait]
impl<F> Summarizer for FnSummarizer<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    async fn summarize(&self, content: &str) -> Result<String> {
        (self.0)(content)
    }
}

/// Configuration of a [`SummaryMemory`].
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Entry count that triggers compression
    pub max_entries: usize,

    /// Estimated token count that triggers compression
    pub max_tokens: usize,

    /// How many recent entries survive compression verbatim
    pub keep_recent: usize,

    /// One-shot summary prompt; `{content}` is replaced by the transcript
    pub summary_prompt: String,

    /// Merge new content into the previous summary instead of starting over
    pub progressive: bool,

    /// Capacity of the underlying buffer
    pub buffer_capacity: usize,
}

const SUMMARY_PROMPT: &str = "Compress the following conversation history into a concise \
summary, keeping the key facts and context:

{content}

Summarize the above in one paragraph, highlighting the important facts, decisions and conclusions.";

const PROGRESSIVE_PROMPT: &str = "You are updating a running conversation summary.

Current summary:
{summary}

New conversation content:
{content}

Fold the new content into the existing summary and produce one updated, complete summary. \
Stay concise and keep only the key information.";

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_entries: 20,
            max_tokens: 4000,
            keep_recent: 5,
            summary_prompt: SUMMARY_PROMPT.to_string(),
            progressive: true,
            buffer_capacity: 100,
        }
    }
}

#[derive(Default)]
struct SummaryState {
    summary: String,
    summary_time: Option<DateTime<Utc>>,
}

/// Auto-compressing conversation memory.
///
/// Every save checks the thresholds; when tripped, everything but the most
/// recent entries is turned into a transcript, summarized, and replaced by
/// the summary. A summarizer failure never fails the save — the entries
/// simply stay uncompressed until the next attempt.
pub struct SummaryMemory {
    buffer: BufferMemory,
    summarizer: Arc<dyn Summarizer>,
    config: SummaryConfig,
    state: RwLock<SummaryState>,
}

impl SummaryMemory {
    /// Create a summary memory with the default configuration.
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self::with_config(summarizer, SummaryConfig::default())
    }

    /// Create a summary memory with an explicit configuration.
    pub fn with_config(summarizer: Arc<dyn Summarizer>, config: SummaryConfig) -> Self {
        Self {
            buffer: BufferMemory::new(config.buffer_capacity),
            summarizer,
            config,
            state: RwLock::new(SummaryState::default()),
        }
    }

    /// The current summary, empty until the first compression.
    pub fn summary(&self) -> String {
        self.state().summary.clone()
    }

    /// When the summary was last refreshed.
    pub fn summary_time(&self) -> Option<DateTime<Utc>> {
        self.state().summary_time
    }

    /// Install a summary, e.g. when restoring persisted state.
    pub fn set_summary(&self, summary: impl Into<String>) {
        let mut state = self.state_mut();
        state.summary = summary.into();
        state.summary_time = Some(Utc::now());
    }

    /// A copy of the uncompressed entries.
    pub fn entries(&self) -> Vec<Entry> {
        self.buffer.entries()
    }

    /// The whole context as plain text: summary line plus transcript.
    pub fn context(&self) -> String {
        let mut parts = Vec::new();

        let summary = self.summary();
        if !summary.is_empty() {
            parts.push(format!("[历史摘要] {summary}"));
        }
        for entry in self.buffer.entries() {
            parts.push(format!("[{}] {}", entry.role, entry.content));
        }

        parts.join("\n")
    }

    /// The context as entries: a synthetic system entry carrying the
    /// summary, followed by the recent buffer.
    pub fn context_entries(&self) -> Vec<Entry> {
        let mut entries = Vec::new();

        let state = self.state();
        if !state.summary.is_empty() {
            let mut summary_entry =
                Entry::new(Role::System, format!("对话历史摘要: {}", state.summary));
            summary_entry.id = "summary".into();
            if let Some(time) = state.summary_time {
                summary_entry.created_at = time;
            }
            entries.push(summary_entry);
        }
        drop(state);

        entries.extend(self.buffer.entries());
        entries
    }

    /// Compress now, regardless of thresholds.
    pub async fn force_summarize(&self) -> Result<()> {
        self.compress().await
    }

    fn should_summarize(&self) -> bool {
        let stats = self.buffer.stats();
        (self.config.max_entries > 0 && stats.entry_count > self.config.max_entries)
            || (self.config.max_tokens > 0 && stats.token_count > self.config.max_tokens)
    }

    /// Summarize everything but the most recent entries, then reinstall the
    /// survivors. The summarizer is called with no locks held.
    async fn compress(&self) -> Result<()> {
        let entries = self.buffer.entries();
        if entries.len() <= self.config.keep_recent {
            return Ok(());
        }

        let split = entries.len() - self.config.keep_recent;
        let (to_summarize, recent) = entries.split_at(split);

        let mut transcript = String::new();
        for entry in to_summarize {
            transcript.push_str(&format!("{}: {}\n", entry.role, entry.content));
        }

        let (current_summary, progressive) = {
            let state = self.state();
            (state.summary.clone(), self.config.progressive)
        };

        let prompt = if progressive && !current_summary.is_empty() {
            PROGRESSIVE_PROMPT
                .replace("{summary}", &current_summary)
                .replace("{content}", &transcript)
        } else {
            self.config.summary_prompt.replace("{content}", &transcript)
        };

        let new_summary = self
            .summarizer
            .summarize(&prompt)
            .await
            .map_err(|e| Error::Summarize(e.to_string()))?;

        {
            let mut state = self.state_mut();
            state.summary = new_summary;
            state.summary_time = Some(Utc::now());
        }

        self.buffer.clear().await?;
        for entry in recent {
            self.buffer.save(entry.clone()).await?;
        }

        Ok(())
    }

    fn state(&self) -> std::sync::RwLockReadGuard<'_, SummaryState> {
        self.state.read().expect("summary lock poisoned")
    }

    fn state_mut(&self) -> std::sync::RwLockWriteGuard<'_, SummaryState> {
        self.state.write().expect("summary lock poisoned")
    }
}

#[async_trait]
impl Memory for SummaryMemory {
    async fn save(&self, entry: Entry) -> Result<()> {
        self.buffer.save(entry).await?;

        if self.should_summarize() {
            // Compression failures must not fail the save.
            if let Err(err) = self.compress().await {
                tracing::warn!("summary compression failed, keeping raw entries: {err}");
            }
        }

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Entry>> {
        self.buffer.get(id).await
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<Entry>> {
        self.buffer.search(query).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.buffer.delete(id).await
    }

    async fn clear(&self) -> Result<()> {
        {
            let mut state = self.state_mut();
            state.summary.clear();
            state.summary_time = None;
        }
        self.buffer.clear().await
    }

    fn stats(&self) -> MemoryStats {
        let mut stats = self.buffer.stats();
        let state = self.state();
        if !state.summary.is_empty() {
            stats.token_count += state.summary.len() / 4;
        }
        stats
    }
}
