//! Memory entries, search queries and the `Memory` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use compact_str::{format_compact, CompactString};
use relay_core::{Result, Role};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// A single remembered item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Entry {
    /// Unique identifier, generated on save when empty
    #[serde(default)]
    pub id: CompactString,

    /// Role of the speaker
    pub role: Role,

    /// Entry content
    pub content: String,

    /// Free-form metadata
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    /// Embedding vector, for semantic recall
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Creation time, stamped on save when unset
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create an entry with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: CompactString::default(),
            role,
            content: content.into(),
            metadata: Map::new(),
            embedding: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Create a user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant entry.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a system entry.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a tool entry.
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content)
    }

    /// Attach a metadata key.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Estimated token count of the content (~4 chars per token).
    pub fn estimate_tokens(&self) -> usize {
        (self.content.len() / 4).max(1)
    }
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique entry id: atomic counter plus a random suffix, so ids
/// never collide even for entries created in the same instant.
pub fn generate_id() -> CompactString {
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    let suffix: u32 = rand::random();
    format_compact!("mem-{counter}-{suffix:08x}")
}

/// Parameters of a memory search.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchQuery {
    /// Query text, embedded for semantic search where supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Pre-computed query vector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Maximum results (0 = no limit)
    #[serde(default)]
    pub limit: usize,

    /// Pagination offset
    #[serde(default)]
    pub offset: usize,

    /// Restrict to these roles
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,

    /// Only entries created at or after this time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,

    /// Only entries created at or before this time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,

    /// Exact-match metadata filter
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    /// Newest-first ordering
    #[serde(default)]
    pub order_desc: bool,
}

impl SearchQuery {
    /// A semantic query over text.
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the pagination offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Restrict to the given roles.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles.extend(roles);
        self
    }

    /// Require a metadata key to equal a value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Order newest first.
    pub fn descending(mut self) -> Self {
        self.order_desc = true;
        self
    }
}

/// Whether an entry passes a query's role, time-range and metadata filters.
pub(crate) fn match_query(entry: &Entry, query: &SearchQuery) -> bool {
    if !query.roles.is_empty() && !query.roles.contains(&entry.role) {
        return false;
    }

    if let Some(since) = query.since {
        if entry.created_at < since {
            return false;
        }
    }
    if let Some(until) = query.until {
        if entry.created_at > until {
            return false;
        }
    }

    for (key, value) in &query.metadata {
        if entry.metadata.get(key) != Some(value) {
            return false;
        }
    }

    true
}

/// Statistics about a memory instance.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MemoryStats {
    /// Number of stored entries
    pub entry_count: usize,

    /// Estimated token total of stored content
    pub token_count: usize,

    /// Creation time of the oldest entry
    pub oldest_entry: Option<DateTime<Utc>>,

    /// Creation time of the newest entry
    pub newest_entry: Option<DateTime<Utc>>,
}

/// The core memory interface.
///
/// Implementations own their entries and are safe for concurrent callers.
#[async_trait]
pub trait Memory: Send + Sync {
    /// Save a single entry, assigning id and timestamp when unset.
    async fn save(&self, entry: Entry) -> Result<()>;

    /// Save several entries.
    async fn save_batch(&self, entries: Vec<Entry>) -> Result<()> {
        for entry in entries {
            self.save(entry).await?;
        }
        Ok(())
    }

    /// Fetch an entry by id.
    async fn get(&self, id: &str) -> Result<Option<Entry>>;

    /// Search entries by the query's filters.
    async fn search(&self, query: SearchQuery) -> Result<Vec<Entry>>;

    /// Delete an entry by id.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Remove all entries.
    async fn clear(&self) -> Result<()>;

    /// Statistics snapshot.
    fn stats(&self) -> MemoryStats;
}
