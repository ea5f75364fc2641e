//! Bounded FIFO memory.

use crate::entry::{generate_id, match_query, Entry, Memory, MemoryStats, SearchQuery};
use async_trait::async_trait;
use relay_core::Result;
use std::sync::RwLock;

const DEFAULT_CAPACITY: usize = 100;

/// A bounded FIFO log of entries.
///
/// When full, saving drops the oldest entry. Lookups are linear — the
/// buffer is meant to stay small (it backs the working tier and the
/// short-term tier's raw storage).
pub struct BufferMemory {
    entries: RwLock<Vec<Entry>>,
    capacity: usize,
}

impl BufferMemory {
    /// Create a buffer holding at most `capacity` entries. Non-positive
    /// capacities fall back to the default of 100.
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        Self {
            entries: RwLock::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A copy of all entries, oldest first.
    pub fn entries(&self) -> Vec<Entry> {
        self.read().clone()
    }

    /// A copy of the last `n` entries, oldest first.
    pub fn last(&self, n: usize) -> Vec<Entry> {
        let entries = self.read();
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Entry>> {
        self.entries.read().expect("buffer lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Entry>> {
        self.entries.write().expect("buffer lock poisoned")
    }
}

#[async_trait]
impl Memory for BufferMemory {
    async fn save(&self, mut entry: Entry) -> Result<()> {
        if entry.id.is_empty() {
            entry.id = generate_id();
        }

        let mut entries = self.write();
        if entries.len() >= self.capacity {
            entries.remove(0);
        }
        entries.push(entry);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Entry>> {
        Ok(self.read().iter().find(|e| e.id == id).cloned())
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<Entry>> {
        let mut results: Vec<Entry> = self
            .read()
            .iter()
            .filter(|e| match_query(e, &query))
            .cloned()
            .collect();

        if query.order_desc {
            results.reverse();
        }

        let start = query.offset.min(results.len());
        let end = if query.limit > 0 {
            (start + query.limit).min(results.len())
        } else {
            results.len()
        };

        Ok(results[start..end].to_vec())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut entries = self.write();
        if let Some(idx) = entries.iter().position(|e| e.id == id) {
            entries.remove(idx);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.write().clear();
        Ok(())
    }

    fn stats(&self) -> MemoryStats {
        let entries = self.read();
        MemoryStats {
            entry_count: entries.len(),
            token_count: entries.iter().map(Entry::estimate_tokens).sum(),
            oldest_entry: entries.first().map(|e| e.created_at),
            newest_entry: entries.last().map(|e| e.created_at),
        }
    }
}
