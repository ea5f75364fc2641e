//! Tests for entity memory.

use relay_memory::{
    Entity, EntityConfig, EntityMemory, EntityType, Entry, ExtractedEntity, ExtractedRelation,
    ExtractionResult, FnExtractor, Memory,
};
use chrono::Utc;
use relay_core::Error;
use serde_json::{json, Map};
use std::sync::Arc;

/// Extractor that reports an "Alice" person whenever the text mentions her,
/// plus a works_at relation to Acme.
fn alice_extractor() -> Arc<FnExtractor<impl Fn(&str) -> relay_core::Result<ExtractionResult> + Send + Sync>>
{
    Arc::new(FnExtractor(|text: &str| {
        let mut result = ExtractionResult::default();
        if text.contains("Alice") {
            let mut attributes = Map::new();
            attributes.insert("title".into(), json!("engineer"));
            result.entities.push(ExtractedEntity {
                name: "Alice".into(),
                entity_type: EntityType::Person,
                description: "An engineer".into(),
                attributes,
            });
            result.entities.push(ExtractedEntity {
                name: "Acme".into(),
                entity_type: EntityType::Organization,
                description: "Her employer".into(),
                attributes: Map::new(),
            });
            result.relations.push(ExtractedRelation {
                source_name: "Alice".into(),
                target_name: "Acme".into(),
                relation_type: "works_at".into(),
                description: String::new(),
            });
        }
        Ok(result)
    }))
}

fn sync_config() -> EntityConfig {
    EntityConfig {
        async_extraction: false,
        batch_size: 2,
        ..Default::default()
    }
}

#[tokio::test]
async fn batched_extraction_builds_the_graph() {
    let memory = EntityMemory::with_config(alice_extractor(), sync_config());

    memory.save(Entry::user("Alice joined recently")).await.unwrap();
    // Below batch size, nothing extracted yet.
    assert!(memory.entity("alice").is_none());

    memory.save(Entry::user("Alice works hard")).await.unwrap();

    let alice = memory.entity("Alice").expect("alice extracted");
    assert_eq!(alice.entity_type, EntityType::Person);
    assert_eq!(alice.description, "An engineer");
    assert_eq!(alice.relations.len(), 1);
    assert_eq!(alice.relations[0].target_name, "Acme");
    assert!(!alice.sources.is_empty());

    let stats = memory.entity_stats();
    assert_eq!(stats.total_entities, 2);
    assert_eq!(stats.total_relations, 1);
    assert_eq!(stats.type_counts[&EntityType::Person], 1);
}

#[tokio::test]
async fn merge_updates_mentions_and_dedupes_relations() {
    let memory = EntityMemory::with_config(alice_extractor(), sync_config());

    for _ in 0..2 {
        memory.save(Entry::user("Alice again")).await.unwrap();
        memory.save(Entry::user("Alice and Alice")).await.unwrap();
    }

    let alice = memory.entity("alice").unwrap();
    assert_eq!(alice.mention_count, 2);
    // The works_at relation stays deduplicated.
    assert_eq!(alice.relations.len(), 1);
    assert!(alice.first_mentioned <= alice.last_mentioned);
}

#[tokio::test]
async fn lookup_is_name_normalized() {
    let memory = EntityMemory::with_config(alice_extractor(), sync_config());
    memory.save(Entry::user("Alice one")).await.unwrap();
    memory.save(Entry::user("Alice two")).await.unwrap();

    assert!(memory.entity("  ALICE ").is_some());
    assert!(memory.entity("bob").is_none());
}

#[tokio::test]
async fn flush_forces_extraction_below_batch_size() {
    let memory = EntityMemory::with_config(alice_extractor(), sync_config());
    memory.save(Entry::user("Alice briefly")).await.unwrap();
    assert!(memory.entity("alice").is_none());

    memory.flush_extraction_queue().await.unwrap();
    assert!(memory.entity("alice").is_some());
}

#[tokio::test]
async fn extraction_failure_never_fails_save() {
    let extractor = Arc::new(FnExtractor(|_: &str| {
        Err(Error::Extraction("mock extractor down".into()))
    }));
    let memory = EntityMemory::with_config(extractor, sync_config());

    memory.save(Entry::user("one")).await.unwrap();
    memory.save(Entry::user("two")).await.unwrap();

    assert_eq!(memory.stats().entry_count, 2);
    assert!(memory.entities().is_empty());
}

#[tokio::test]
async fn entity_context_returns_source_entries() {
    let memory = EntityMemory::with_config(alice_extractor(), sync_config());
    memory.save(Entry::user("Alice said hello")).await.unwrap();
    memory.save(Entry::user("unrelated chatter")).await.unwrap();

    let context = memory.entity_context(&["Alice"]).await.unwrap();
    assert_eq!(context.len(), 2);
}

#[tokio::test]
async fn formatted_context_lists_entity_knowledge() {
    let memory = EntityMemory::with_config(alice_extractor(), sync_config());
    memory.save(Entry::user("Alice builds things")).await.unwrap();
    memory.save(Entry::user("Alice ships things")).await.unwrap();

    let block = memory.context_with_entities(&["Alice", "Acme", "nobody"]);
    assert!(block.starts_with("Known entities:"));
    assert!(block.contains("[Alice] (person)"));
    assert!(block.contains("description: An engineer"));
    assert!(block.contains("title=\"engineer\""));
    assert!(block.contains("- works_at Acme"));
    assert!(block.contains("[Acme] (organization)"));
    assert!(!block.contains("nobody"));
}

#[tokio::test]
async fn search_and_type_filters() {
    let memory = EntityMemory::with_config(alice_extractor(), sync_config());
    memory.save(Entry::user("Alice here")).await.unwrap();
    memory.save(Entry::user("Alice there")).await.unwrap();

    assert_eq!(memory.search_entities("engineer").len(), 1);
    assert_eq!(memory.entities_by_type(EntityType::Organization).len(), 1);
    assert_eq!(memory.related_entities("alice").len(), 1);
    assert!(memory.related_entities("acme").is_empty());
}

#[tokio::test]
async fn manual_entities_and_relations() {
    let memory = EntityMemory::with_config(alice_extractor(), sync_config());
    let now = Utc::now();
    memory.add_entity(Entity {
        name: "Rust".into(),
        entity_type: EntityType::Concept,
        description: "A systems language".into(),
        attributes: Map::new(),
        relations: Vec::new(),
        first_mentioned: now,
        last_mentioned: now,
        mention_count: 0,
        sources: Vec::new(),
    });

    assert!(memory.entity("rust").is_some());
    assert!(memory
        .add_relation("Rust", "Mozilla", "created_by", "originated there")
        .is_ok());
    assert_eq!(memory.entity("rust").unwrap().relations.len(), 1);

    let err = memory
        .add_relation("missing", "Rust", "knows", "")
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
}

#[tokio::test]
async fn clear_wipes_graph_and_buffer() {
    let memory = EntityMemory::with_config(alice_extractor(), sync_config());
    memory.save(Entry::user("Alice one")).await.unwrap();
    memory.save(Entry::user("Alice two")).await.unwrap();
    assert!(!memory.entities().is_empty());

    memory.clear().await.unwrap();
    assert!(memory.entities().is_empty());
    assert_eq!(memory.stats().entry_count, 0);
}
