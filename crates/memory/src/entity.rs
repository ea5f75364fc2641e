//! Entity memory: an extractor-driven knowledge graph over the
//! conversation.
//!
//! Saves are buffered; every `batch_size` entries the extractor runs over
//! the batch (optionally as a fire-and-forget task) and its entities and
//! relations are merged into a graph keyed by normalized name. Extraction
//! failures are swallowed — the entity database just stays unchanged.

use crate::buffer::BufferMemory;
use crate::entry::{Entry, Memory, MemoryStats, SearchQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use relay_core::{CompletionRequest, Error, Message, Provider, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, RwLock};

/// The kind of an extracted entity.
///
/// Anything an extractor reports outside the closed set maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum EntityType {
    /// A person
    Person,
    /// A place
    Place,
    /// An organization
    Organization,
    /// A concept or term
    Concept,
    /// An event
    Event,
    /// A product or service
    Product,
    /// Anything else
    Other,
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "person" => EntityType::Person,
            "place" => EntityType::Place,
            "organization" => EntityType::Organization,
            "concept" => EntityType::Concept,
            "event" => EntityType::Event,
            "product" => EntityType::Product,
            _ => EntityType::Other,
        }
    }
}

impl EntityType {
    /// The wire spelling of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "person",
            EntityType::Place => "place",
            EntityType::Organization => "organization",
            EntityType::Concept => "concept",
            EntityType::Event => "event",
            EntityType::Product => "product",
            EntityType::Other => "other",
        }
    }
}

/// A directed relation to another entity, resolved by name lookup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityRelation {
    /// Relation type, e.g. "works_at", "knows", "located_in"
    #[serde(rename = "type")]
    pub relation_type: String,

    /// Name of the target entity
    pub target_name: String,

    /// Relation description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// When the relation was recorded
    pub created_at: DateTime<Utc>,
}

/// An entity in the knowledge graph.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Entity {
    /// Entity name (identity, compared normalized)
    pub name: String,

    /// Entity type
    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// Entity description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Attributes such as title or traits
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,

    /// Relations to other entities
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<EntityRelation>,

    /// When the entity was first mentioned
    pub first_mentioned: DateTime<Utc>,

    /// When the entity was last mentioned
    pub last_mentioned: DateTime<Utc>,

    /// How many extraction batches mentioned it
    pub mention_count: usize,

    /// Ids of the entries it was extracted from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<CompactString>,
}

/// Normalized form of an entity name, used as the graph key.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The raw output of an extractor run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExtractionResult {
    /// Extracted entities
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,

    /// Extracted relations
    #[serde(default)]
    pub relations: Vec<ExtractedRelation>,
}

/// One entity as reported by the extractor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractedEntity {
    /// Entity name
    pub name: String,

    /// Entity type
    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// Entity description
    #[serde(default)]
    pub description: String,

    /// Attributes
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// One relation as reported by the extractor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractedRelation {
    /// Source entity name
    pub source_name: String,

    /// Target entity name
    pub target_name: String,

    /// Relation type
    #[serde(rename = "type")]
    pub relation_type: String,

    /// Relation description
    #[serde(default)]
    pub description: String,
}

/// Extracts entities and relations from text. Usually backed by an LLM.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Extract entities and relations from the text.
    async fn extract(&self, text: &str) -> Result<ExtractionResult>;
}

/// A function-backed [`EntityExtractor`] for tests.
pub struct FnExtractor<F>(pub F);

#[async_trait]
impl<F> EntityExtractor for FnExtractor<F>
where
    F: Fn(&str) -> Result<ExtractionResult> + Send + Sync,
{
    async fn extract(&self, text: &str) -> Result<ExtractionResult> {
        (self.0)(text)
    }
}

/// Configuration of an [`EntityMemory`].
#[derive(Debug, Clone)]
pub struct EntityConfig {
    /// Capacity of the underlying message buffer
    pub buffer_capacity: usize,

    /// Run extraction as a fire-and-forget task instead of inline
    pub async_extraction: bool,

    /// How many saves accumulate before an extraction runs
    pub batch_size: usize,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 200,
            async_extraction: true,
            batch_size: 5,
        }
    }
}

/// Statistics over the entity graph.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityStats {
    /// Number of entities
    pub total_entities: usize,
    /// Number of relations across all entities
    pub total_relations: usize,
    /// Entity count per type
    pub type_counts: HashMap<EntityType, usize>,
}

struct EntityState {
    entities: RwLock<HashMap<String, Entity>>,
    buffer: BufferMemory,
    extractor: Arc<dyn EntityExtractor>,
    queue: Mutex<Vec<Entry>>,
}

/// Memory that builds an entity knowledge graph from the conversation.
pub struct EntityMemory {
    state: Arc<EntityState>,
    config: EntityConfig,
}

impl EntityMemory {
    /// Create an entity memory with the default configuration.
    pub fn new(extractor: Arc<dyn EntityExtractor>) -> Self {
        Self::with_config(extractor, EntityConfig::default())
    }

    /// Create an entity memory with an explicit configuration.
    pub fn with_config(extractor: Arc<dyn EntityExtractor>, config: EntityConfig) -> Self {
        Self {
            state: Arc::new(EntityState {
                entities: RwLock::new(HashMap::new()),
                buffer: BufferMemory::new(config.buffer_capacity),
                extractor,
                queue: Mutex::new(Vec::new()),
            }),
            config,
        }
    }

    /// Look up an entity by (normalized) name.
    pub fn entity(&self, name: &str) -> Option<Entity> {
        let entities = self.state.entities.read().expect("entity lock poisoned");
        entities.get(&normalize_name(name)).cloned()
    }

    /// All entities, in no particular order.
    pub fn entities(&self) -> Vec<Entity> {
        let entities = self.state.entities.read().expect("entity lock poisoned");
        entities.values().cloned().collect()
    }

    /// Entities whose name or description contains the query,
    /// case-insensitively.
    pub fn search_entities(&self, query: &str) -> Vec<Entity> {
        let query = query.to_lowercase();
        let entities = self.state.entities.read().expect("entity lock poisoned");
        entities
            .values()
            .filter(|e| {
                e.name.to_lowercase().contains(&query)
                    || e.description.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// Entities of a given type.
    pub fn entities_by_type(&self, entity_type: EntityType) -> Vec<Entity> {
        let entities = self.state.entities.read().expect("entity lock poisoned");
        entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .cloned()
            .collect()
    }

    /// Entities reachable from `name` through its relations.
    pub fn related_entities(&self, name: &str) -> Vec<Entity> {
        let entities = self.state.entities.read().expect("entity lock poisoned");
        let Some(entity) = entities.get(&normalize_name(name)) else {
            return Vec::new();
        };

        let mut seen = std::collections::HashSet::new();
        seen.insert(normalize_name(name));

        let mut related = Vec::new();
        for relation in &entity.relations {
            let target = normalize_name(&relation.target_name);
            if seen.insert(target.clone()) {
                if let Some(target_entity) = entities.get(&target) {
                    related.push(target_entity.clone());
                }
            }
        }
        related
    }

    /// The buffered entries the named entities were extracted from.
    pub async fn entity_context(&self, names: &[&str]) -> Result<Vec<Entry>> {
        let source_ids: std::collections::HashSet<CompactString> = {
            let entities = self.state.entities.read().expect("entity lock poisoned");
            names
                .iter()
                .filter_map(|name| entities.get(&normalize_name(name)))
                .flat_map(|e| e.sources.iter().cloned())
                .collect()
        };

        Ok(self
            .state
            .buffer
            .entries()
            .into_iter()
            .filter(|e| source_ids.contains(&e.id))
            .collect())
    }

    /// A formatted knowledge block about the named entities, usable as a
    /// prompt prefix.
    pub fn context_with_entities(&self, names: &[&str]) -> String {
        let entities = self.state.entities.read().expect("entity lock poisoned");

        let mut out = String::from("Known entities:\n");
        for name in names {
            let Some(entity) = entities.get(&normalize_name(name)) else {
                continue;
            };

            let _ = writeln!(out, "\n[{}] ({})", entity.name, entity.entity_type.as_str());
            if !entity.description.is_empty() {
                let _ = writeln!(out, "  description: {}", entity.description);
            }
            if !entity.attributes.is_empty() {
                let attrs: Vec<String> = entity
                    .attributes
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                let _ = writeln!(out, "  attributes: {}", attrs.join(", "));
            }
            if !entity.relations.is_empty() {
                out.push_str("  relations:\n");
                for relation in &entity.relations {
                    let _ = writeln!(
                        out,
                        "    - {} {}",
                        relation.relation_type, relation.target_name
                    );
                }
            }
        }
        out
    }

    /// Statistics over the entity graph.
    pub fn entity_stats(&self) -> EntityStats {
        let entities = self.state.entities.read().expect("entity lock poisoned");

        let mut stats = EntityStats {
            total_entities: entities.len(),
            ..Default::default()
        };
        for entity in entities.values() {
            *stats.type_counts.entry(entity.entity_type).or_default() += 1;
            stats.total_relations += entity.relations.len();
        }
        stats
    }

    /// Insert or replace an entity directly.
    pub fn add_entity(&self, mut entity: Entity) {
        let key = normalize_name(&entity.name);
        if key.is_empty() {
            return;
        }
        if entity.mention_count == 0 {
            entity.mention_count = 1;
        }

        let mut entities = self.state.entities.write().expect("entity lock poisoned");
        entities.insert(key, entity);
    }

    /// Add a relation between two known entities.
    pub fn add_relation(
        &self,
        source: &str,
        target: &str,
        relation_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<()> {
        let mut entities = self.state.entities.write().expect("entity lock poisoned");
        let entity = entities
            .get_mut(&normalize_name(source))
            .ok_or_else(|| Error::BadRequest(format!("unknown source entity '{source}'")))?;

        entity.relations.push(EntityRelation {
            relation_type: relation_type.into(),
            target_name: target.to_string(),
            description: description.into(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    /// Run extraction over whatever is queued, inline.
    pub async fn flush_extraction_queue(&self) -> Result<()> {
        let batch = {
            let mut queue = self.state.queue.lock().expect("extraction queue poisoned");
            std::mem::take(&mut *queue)
        };
        if batch.is_empty() {
            return Ok(());
        }
        self.state.extract_batch(batch).await
    }
}

impl EntityState {
    /// Extract entities from a batch of entries and merge them into the
    /// graph.
    async fn extract_batch(&self, entries: Vec<Entry>) -> Result<()> {
        let mut text = String::new();
        let mut entry_ids = Vec::with_capacity(entries.len());
        for entry in &entries {
            let _ = writeln!(text, "[{}] {}", entry.role, entry.content);
            entry_ids.push(entry.id.clone());
        }

        let result = self
            .extractor
            .extract(&text)
            .await
            .map_err(|e| Error::Extraction(e.to_string()))?;

        self.merge(result, &entry_ids);
        Ok(())
    }

    fn merge(&self, result: ExtractionResult, entry_ids: &[CompactString]) {
        let mut entities = self.entities.write().expect("entity lock poisoned");
        let now = Utc::now();

        for extracted in result.entities {
            let key = normalize_name(&extracted.name);
            if key.is_empty() {
                continue;
            }

            match entities.get_mut(&key) {
                Some(existing) => {
                    existing.last_mentioned = now;
                    existing.mention_count += 1;
                    // The longer description wins.
                    if extracted.description.len() > existing.description.len() {
                        existing.description = extracted.description;
                    }
                    for (k, v) in extracted.attributes {
                        existing.attributes.insert(k, v);
                    }
                    existing.sources.extend(entry_ids.iter().cloned());
                }
                None => {
                    entities.insert(
                        key,
                        Entity {
                            name: extracted.name,
                            entity_type: extracted.entity_type,
                            description: extracted.description,
                            attributes: extracted.attributes,
                            relations: Vec::new(),
                            first_mentioned: now,
                            last_mentioned: now,
                            mention_count: 1,
                            sources: entry_ids.to_vec(),
                        },
                    );
                }
            }
        }

        for relation in result.relations {
            let Some(entity) = entities.get_mut(&normalize_name(&relation.source_name)) else {
                continue;
            };
            // Dedupe by (type, normalized target).
            let exists = entity.relations.iter().any(|r| {
                r.relation_type == relation.relation_type
                    && normalize_name(&r.target_name) == normalize_name(&relation.target_name)
            });
            if !exists {
                entity.relations.push(EntityRelation {
                    relation_type: relation.relation_type,
                    target_name: relation.target_name,
                    description: relation.description,
                    created_at: now,
                });
            }
        }
    }
}

#[async_trait]
impl Memory for EntityMemory {
    async fn save(&self, mut entry: Entry) -> Result<()> {
        // Assign the id here so the extraction queue sees the same id the
        // buffer stores — entity sources must reference real entries.
        if entry.id.is_empty() {
            entry.id = crate::entry::generate_id();
        }
        self.state.buffer.save(entry.clone()).await?;

        let batch = {
            let mut queue = self.state.queue.lock().expect("extraction queue poisoned");
            queue.push(entry);
            if queue.len() >= self.config.batch_size {
                Some(std::mem::take(&mut *queue))
            } else {
                None
            }
        };

        if let Some(batch) = batch {
            if self.config.async_extraction {
                let state = Arc::clone(&self.state);
                tokio::spawn(async move {
                    if let Err(err) = state.extract_batch(batch).await {
                        tracing::warn!("entity extraction failed: {err}");
                    }
                });
            } else if let Err(err) = self.state.extract_batch(batch).await {
                // Extraction failures never fail the save.
                tracing::warn!("entity extraction failed: {err}");
            }
        }

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Entry>> {
        self.state.buffer.get(id).await
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<Entry>> {
        self.state.buffer.search(query).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.state.buffer.delete(id).await
    }

    async fn clear(&self) -> Result<()> {
        {
            let mut entities = self.state.entities.write().expect("entity lock poisoned");
            entities.clear();
        }
        {
            let mut queue = self.state.queue.lock().expect("extraction queue poisoned");
            queue.clear();
        }
        self.state.buffer.clear().await
    }

    fn stats(&self) -> MemoryStats {
        self.state.buffer.stats()
    }
}

/// LLM-backed [`EntityExtractor`].
pub struct LlmEntityExtractor {
    provider: Arc<dyn Provider>,
    model: CompactString,
    prompt_template: String,
}

const EXTRACTION_PROMPT: &str = "Extract the entities and relations from the conversation below.

Conversation:
{content}

Extract:
1. People (name, title, traits)
2. Places (name, kind)
3. Organizations (name, kind)
4. Concepts and terms
5. Products and services
6. Events
7. Relations between entities

Reply with JSON in exactly this shape:
{
  \"entities\": [
    {
      \"name\": \"entity name\",
      \"type\": \"person|place|organization|concept|event|product|other\",
      \"description\": \"entity description\",
      \"attributes\": {\"key\": \"value\"}
    }
  ],
  \"relations\": [
    {
      \"source_name\": \"source entity\",
      \"target_name\": \"target entity\",
      \"type\": \"relation type (works_at, knows, located_in, belongs_to, ...)\",
      \"description\": \"relation description\"
    }
  ]
}

Output JSON only, nothing else. Use empty arrays when nothing was found.";

impl LlmEntityExtractor {
    /// Create an extractor over the given provider.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            model: CompactString::default(),
            prompt_template: EXTRACTION_PROMPT.to_string(),
        }
    }

    /// Use a specific model for extraction calls.
    pub fn with_model(mut self, model: impl Into<CompactString>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the extraction prompt; `{content}` is replaced by the text.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_template = prompt.into();
        self
    }
}

/// The JSON object inside a possibly chatty LLM reply: first `{` through
/// the last `}`.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[async_trait]
impl EntityExtractor for LlmEntityExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractionResult> {
        let prompt = self.prompt_template.replace("{content}", text);
        let req = CompletionRequest::new(self.model.clone(), vec![Message::user(prompt)])
            .with_temperature(0.0);

        let resp = self.provider.complete(req).await?;

        let Some(json) = extract_json(&resp.content) else {
            return Ok(ExtractionResult::default());
        };
        // A malformed reply yields an empty result, not an error.
        Ok(serde_json::from_str(json).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_name("  Alice Zhang  "), "alice zhang");
    }

    #[test]
    fn extract_json_spans_first_to_last_brace() {
        assert_eq!(
            extract_json("sure! {\"entities\": []} hope that helps"),
            Some("{\"entities\": []}")
        );
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} reversed {"), None);
    }

    #[test]
    fn unknown_entity_type_deserializes_as_other() {
        let entity: ExtractedEntity =
            serde_json::from_str("{\"name\": \"x\", \"type\": \"galaxy\"}").unwrap();
        assert_eq!(entity.entity_type, EntityType::Other);
    }
}
