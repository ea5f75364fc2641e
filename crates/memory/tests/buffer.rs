//! Tests for the bounded FIFO buffer.

use relay_core::Role;
use relay_memory::{BufferMemory, Entry, Memory, SearchQuery};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn capacity_evicts_oldest() {
    let buffer = BufferMemory::new(3);
    for id in ["A", "B", "C", "D", "E"] {
        let mut entry = Entry::user(format!("message {id}"));
        entry.id = id.into();
        buffer.save(entry).await.unwrap();
    }

    let ids: Vec<_> = buffer.entries().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["C", "D", "E"]);
    assert_eq!(buffer.stats().entry_count, 3);
}

#[tokio::test]
async fn zero_capacity_falls_back_to_default() {
    let buffer = BufferMemory::new(0);
    assert_eq!(buffer.capacity(), 100);
}

#[tokio::test]
async fn save_assigns_ids_and_timestamps() {
    let buffer = BufferMemory::new(10);
    buffer.save(Entry::user("one")).await.unwrap();
    buffer.save(Entry::user("two")).await.unwrap();

    let entries = buffer.entries();
    assert!(!entries[0].id.is_empty());
    assert!(!entries[1].id.is_empty());
    assert_ne!(entries[0].id, entries[1].id);
    assert!(entries[0].created_at <= entries[1].created_at);
}

#[tokio::test]
async fn get_and_delete_by_id() {
    let buffer = BufferMemory::new(10);
    let mut entry = Entry::user("target");
    entry.id = "the-id".into();
    buffer.save(entry).await.unwrap();

    assert_eq!(buffer.get("the-id").await.unwrap().unwrap().content, "target");
    buffer.delete("the-id").await.unwrap();
    assert!(buffer.get("the-id").await.unwrap().is_none());
    // Deleting again is a no-op.
    buffer.delete("the-id").await.unwrap();
}

#[tokio::test]
async fn search_filters_by_role() {
    let buffer = BufferMemory::new(10);
    buffer.save(Entry::user("from user")).await.unwrap();
    buffer.save(Entry::assistant("from assistant")).await.unwrap();
    buffer.save(Entry::user("also user")).await.unwrap();

    let results = buffer
        .search(SearchQuery::default().with_roles([Role::User]))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|e| e.role == Role::User));
}

#[tokio::test]
async fn search_filters_by_metadata() {
    let buffer = BufferMemory::new(10);
    buffer
        .save(Entry::user("tagged").with_metadata("topic", json!("rust")))
        .await
        .unwrap();
    buffer
        .save(Entry::user("untagged"))
        .await
        .unwrap();

    let results = buffer
        .search(SearchQuery::default().with_metadata("topic", json!("rust")))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, "tagged");
}

#[tokio::test]
async fn search_orders_offsets_and_limits() {
    let buffer = BufferMemory::new(10);
    for i in 0..5 {
        buffer.save(Entry::user(format!("m{i}"))).await.unwrap();
    }

    let newest_first = buffer
        .search(SearchQuery::default().descending().with_limit(2))
        .await
        .unwrap();
    assert_eq!(newest_first[0].content, "m4");
    assert_eq!(newest_first[1].content, "m3");

    let paged = buffer
        .search(SearchQuery::default().with_offset(3).with_limit(10))
        .await
        .unwrap();
    assert_eq!(paged.len(), 2);
    assert_eq!(paged[0].content, "m3");

    let beyond = buffer
        .search(SearchQuery::default().with_offset(99))
        .await
        .unwrap();
    assert!(beyond.is_empty());
}

#[tokio::test]
async fn last_returns_tail_in_order() {
    let buffer = BufferMemory::new(10);
    for i in 0..4 {
        buffer.save(Entry::user(format!("m{i}"))).await.unwrap();
    }

    let tail: Vec<_> = buffer.last(2).into_iter().map(|e| e.content).collect();
    assert_eq!(tail, vec!["m2", "m3"]);
    assert_eq!(buffer.last(99).len(), 4);
}

#[tokio::test]
async fn stats_track_oldest_and_newest() {
    let buffer = BufferMemory::new(10);
    assert!(buffer.stats().oldest_entry.is_none());

    buffer.save(Entry::user("abcdefgh")).await.unwrap();
    let stats = buffer.stats();
    assert_eq!(stats.entry_count, 1);
    assert_eq!(stats.token_count, 2);
    assert!(stats.oldest_entry.is_some());
    assert_eq!(stats.oldest_entry, stats.newest_entry);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_keep_every_entry_with_unique_ids() {
    const TASKS: usize = 8;
    const PER_TASK: usize = 25;

    let buffer = Arc::new(BufferMemory::new(TASKS * PER_TASK));
    let mut handles = Vec::new();
    for t in 0..TASKS {
        let buffer = Arc::clone(&buffer);
        handles.push(tokio::spawn(async move {
            for i in 0..PER_TASK {
                buffer.save(Entry::user(format!("t{t}-m{i}"))).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let entries = buffer.entries();
    assert_eq!(entries.len(), TASKS * PER_TASK);
    let ids: HashSet<_> = entries.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids.len(), TASKS * PER_TASK);
}
