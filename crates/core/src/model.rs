//! Model metadata for the unified LLM interface.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A model capability flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    /// Image understanding
    Vision,
    /// Function calling
    Functions,
    /// Strict JSON output mode
    JsonMode,
    /// Streaming responses
    Streaming,
    /// Vector embeddings
    Embedding,
}

/// Metadata about a model offered by a provider.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelInfo {
    /// Model identifier
    pub id: CompactString,

    /// Display name
    pub name: String,

    /// Model description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Maximum context length in tokens
    pub max_tokens: u32,

    /// Input cost in USD per million tokens
    pub input_cost_per_million: f64,

    /// Output cost in USD per million tokens
    pub output_cost_per_million: f64,

    /// Supported capability flags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,
}

impl ModelInfo {
    /// Whether the model advertises a capability.
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}
