//! Tests for vector memory and the in-memory vector store.

mod common;

use common::{FailingEmbedder, HashEmbedder};
use relay_memory::{
    cosine_similarity, Entry, InMemoryVectorStore, Memory, SearchQuery, VectorConfig,
    VectorMemory, VectorStore,
};
use serde_json::Map;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn test_memory() -> (VectorMemory, Arc<HashEmbedder>) {
    let embedder = Arc::new(HashEmbedder::new());
    let memory = VectorMemory::with_config(
        embedder.clone(),
        None,
        VectorConfig {
            dimension: 8,
            min_score: 0.0,
            default_top_k: 10,
        },
    );
    (memory, embedder)
}

#[test]
fn cosine_identities() {
    let a = vec![1.0, 2.0, 3.0];
    let neg: Vec<f32> = a.iter().map(|x| -x).collect();
    let b = vec![3.0, 1.0, 2.0];

    assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    assert!((cosine_similarity(&a, &neg) + 1.0).abs() < 1e-6);
    assert!((cosine_similarity(&a, &b) - cosine_similarity(&b, &a)).abs() < 1e-6);
}

#[test]
fn cosine_orthogonal_and_degenerate() {
    let x = vec![1.0, 0.0];
    let y = vec![0.0, 1.0];
    assert!(cosine_similarity(&x, &y).abs() < 1e-6);

    let zero = vec![0.0, 0.0];
    assert_eq!(cosine_similarity(&x, &zero), 0.0);
    assert_eq!(cosine_similarity(&x, &[1.0, 2.0, 3.0]), 0.0);
}

#[tokio::test]
async fn store_search_ranks_by_similarity() {
    let store = InMemoryVectorStore::new(2);
    store
        .add("near", vec![1.0, 0.1], Map::new())
        .await
        .unwrap();
    store
        .add("far", vec![-1.0, 0.5], Map::new())
        .await
        .unwrap();
    store
        .add("exact", vec![1.0, 0.0], Map::new())
        .await
        .unwrap();

    let results = store.search(&[1.0, 0.0], 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "exact");
    assert_eq!(results[1].id, "near");
    assert!(results[0].score >= results[1].score);

    assert_eq!(store.count().await.unwrap(), 3);
    store.delete("exact").await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
    store.clear().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn save_embeds_and_semantic_search_ranks() {
    let (memory, _) = test_memory();

    memory.save(Entry::user("Hello")).await.unwrap();
    memory.save(Entry::user("Hello world")).await.unwrap();
    memory
        .save(Entry::user("completely different topic"))
        .await
        .unwrap();

    let results = memory.semantic_search("Hello", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].content, "Hello");

    let s0 = results[0].metadata["_score"].as_f64().unwrap();
    let s1 = results[1].metadata["_score"].as_f64().unwrap();
    assert!(s0 >= s1);
    assert!(s0 > 0.99);
}

#[tokio::test]
async fn delete_removes_entry_and_vector() {
    let (memory, _) = test_memory();

    let mut entry = Entry::user("to be deleted");
    entry.id = "victim".into();
    memory.save(entry).await.unwrap();
    assert!(memory.get("victim").await.unwrap().is_some());

    memory.delete("victim").await.unwrap();
    assert!(memory.get("victim").await.unwrap().is_none());
    assert!(memory.semantic_search("to be deleted", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn min_score_filters_weak_matches() {
    let embedder = Arc::new(HashEmbedder::new());
    let memory = VectorMemory::with_config(
        embedder,
        None,
        VectorConfig {
            dimension: 8,
            min_score: 0.999,
            default_top_k: 10,
        },
    );

    memory.save(Entry::user("alpha beta gamma")).await.unwrap();
    memory.save(Entry::user("zz")).await.unwrap();

    let results = memory.semantic_search("alpha beta gamma", 10).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, "alpha beta gamma");
}

#[tokio::test]
async fn query_embedding_bypasses_embedder() {
    let (memory, embedder) = test_memory();
    memory.save(Entry::user("anchor")).await.unwrap();
    let calls_after_save = embedder.calls.load(Ordering::SeqCst);

    let query = SearchQuery {
        embedding: Some(HashEmbedder::embed_text("anchor")),
        limit: 1,
        ..Default::default()
    };
    let results = memory.search(query).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_save);
}

#[tokio::test]
async fn plain_search_scans_by_time() {
    let (memory, _) = test_memory();
    for i in 0..3 {
        memory.save(Entry::user(format!("m{i}"))).await.unwrap();
    }

    let results = memory
        .search(SearchQuery::default().descending().with_limit(2))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].created_at >= results[1].created_at);
}

#[tokio::test]
async fn batch_save_embeds_in_one_call() {
    let (memory, embedder) = test_memory();

    let entries = (0..5).map(|i| Entry::user(format!("batch {i}"))).collect();
    memory.save_batch(entries).await.unwrap();

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(memory.stats().entry_count, 5);
}

#[tokio::test]
async fn embedding_failure_still_stores_entry() {
    let memory = VectorMemory::with_config(
        Arc::new(FailingEmbedder),
        None,
        VectorConfig {
            dimension: 8,
            min_score: 0.0,
            default_top_k: 10,
        },
    );

    let mut entry = Entry::user("unembeddable");
    entry.id = "e1".into();
    memory.save(entry).await.unwrap();

    // Stored locally, reachable by plain scan, absent from the vector index.
    assert!(memory.get("e1").await.unwrap().is_some());
    let scanned = memory.search(SearchQuery::default()).await.unwrap();
    assert_eq!(scanned.len(), 1);
    assert!(scanned[0].embedding.is_none());
}

#[tokio::test]
async fn pre_embedded_entries_skip_the_embedder() {
    let (memory, embedder) = test_memory();

    let mut entry = Entry::user("pre-embedded");
    entry.embedding = Some(vec![1.0; 8]);
    memory.save(entry).await.unwrap();

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}
