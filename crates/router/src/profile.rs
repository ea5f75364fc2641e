//! Model capability profiles.
//!
//! A [`ModelProfile`] describes how well a model performs per task type and
//! complexity, plus its cost, latency and tier metadata. Profiles feed the
//! smart router's scoring; a model without a profile still routes, with
//! neutral scores.

use crate::task::{TaskComplexity, TaskType};
use compact_str::CompactString;
use relay_core::Feature;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Capability profile for a single model id.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelProfile {
    /// Model identifier
    pub id: CompactString,

    /// Provider name
    pub provider: CompactString,

    /// Display name
    pub display_name: String,

    /// Model description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Supported capability flags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Feature>,

    /// Score per task type, each in [0, 1]
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub task_scores: HashMap<TaskType, f64>,

    /// Score per complexity, each in [0, 1]
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub complexity_scores: HashMap<TaskComplexity, f64>,

    /// Typical response latency in milliseconds
    pub average_latency_ms: u64,

    /// Input cost in USD per million tokens
    pub input_cost_per_million: f64,

    /// Output cost in USD per million tokens
    pub output_cost_per_million: f64,

    /// Maximum context length
    pub max_context_length: u32,

    /// Quality tier, 1-5 (5 best)
    pub quality_tier: u8,

    /// Speed tier, 1-5 (5 fastest)
    pub speed_tier: u8,

    /// Cost tier, 1-5 (1 cheapest)
    pub cost_tier: u8,

    /// What the model is good at
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strengths: Vec<String>,

    /// What the model is weak at
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weaknesses: Vec<String>,

    /// Recommended use cases
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_for: Vec<String>,

    /// Discouraged use cases
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_recommended_for: Vec<String>,
}

impl ModelProfile {
    /// Whether the model advertises a capability.
    pub fn has_capability(&self, capability: Feature) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Score for a task type. Unknown task types score neutral (0.5).
    pub fn task_score(&self, task: TaskType) -> f64 {
        self.task_scores.get(&task).copied().unwrap_or(0.5)
    }

    /// Score for a complexity. Unknown complexities score neutral (0.5).
    pub fn complexity_score(&self, complexity: TaskComplexity) -> f64 {
        self.complexity_scores
            .get(&complexity)
            .copied()
            .unwrap_or(0.5)
    }

    /// Combined input and output cost per million tokens.
    pub fn total_cost_per_million(&self) -> f64 {
        self.input_cost_per_million + self.output_cost_per_million
    }
}

/// Fluent builder for [`ModelProfile`].
pub struct ProfileBuilder {
    profile: ModelProfile,
}

impl ProfileBuilder {
    /// Start a profile for a model id and provider.
    pub fn new(id: impl Into<CompactString>, provider: impl Into<CompactString>) -> Self {
        Self {
            profile: ModelProfile {
                id: id.into(),
                provider: provider.into(),
                ..Default::default()
            },
        }
    }

    /// Set the display name.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.profile.display_name = name.into();
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.profile.description = description.into();
        self
    }

    /// Add capability flags.
    pub fn capabilities(mut self, capabilities: impl IntoIterator<Item = Feature>) -> Self {
        self.profile.capabilities.extend(capabilities);
        self
    }

    /// Set the per-task scores.
    pub fn task_scores(mut self, scores: impl IntoIterator<Item = (TaskType, f64)>) -> Self {
        self.profile.task_scores.extend(scores);
        self
    }

    /// Set the per-complexity scores.
    pub fn complexity_scores(
        mut self,
        scores: impl IntoIterator<Item = (TaskComplexity, f64)>,
    ) -> Self {
        self.profile.complexity_scores.extend(scores);
        self
    }

    /// Set the typical latency in milliseconds.
    pub fn latency_ms(mut self, ms: u64) -> Self {
        self.profile.average_latency_ms = ms;
        self
    }

    /// Set input and output cost per million tokens.
    pub fn cost(mut self, input: f64, output: f64) -> Self {
        self.profile.input_cost_per_million = input;
        self.profile.output_cost_per_million = output;
        self
    }

    /// Set the maximum context length.
    pub fn context_length(mut self, length: u32) -> Self {
        self.profile.max_context_length = length;
        self
    }

    /// Set quality, speed and cost tiers.
    pub fn tiers(mut self, quality: u8, speed: u8, cost: u8) -> Self {
        self.profile.quality_tier = quality;
        self.profile.speed_tier = speed;
        self.profile.cost_tier = cost;
        self
    }

    /// Set the strengths list.
    pub fn strengths(mut self, strengths: impl IntoIterator<Item = &'static str>) -> Self {
        self.profile
            .strengths
            .extend(strengths.into_iter().map(String::from));
        self
    }

    /// Set the recommended-for list.
    pub fn recommended_for(mut self, uses: impl IntoIterator<Item = &'static str>) -> Self {
        self.profile
            .recommended_for
            .extend(uses.into_iter().map(String::from));
        self
    }

    /// Set the not-recommended-for list.
    pub fn not_recommended_for(mut self, uses: impl IntoIterator<Item = &'static str>) -> Self {
        self.profile
            .not_recommended_for
            .extend(uses.into_iter().map(String::from));
        self
    }

    /// Finish the profile.
    pub fn build(self) -> ModelProfile {
        self.profile
    }
}

/// Built-in profiles for the mainstream model catalog.
pub fn default_profiles() -> HashMap<CompactString, ModelProfile> {
    use Feature::{Functions, JsonMode, Streaming, Vision};
    use TaskComplexity::{Complex, Expert, Medium, Simple};
    use TaskType::{
        Analysis, Chat, Coding, Creative, Extraction, Math, Reasoning, Summarization,
        Translation, Vision as VisionTask,
    };

    let profiles = vec![
        ProfileBuilder::new("gpt-4o", "openai")
            .display_name("GPT-4o")
            .description("OpenAI flagship multimodal model")
            .capabilities([Vision, Functions, Streaming, JsonMode])
            .task_scores([
                (Chat, 0.95),
                (Reasoning, 0.95),
                (Coding, 0.90),
                (Analysis, 0.92),
                (Summarization, 0.90),
                (Extraction, 0.88),
                (Creative, 0.90),
                (Translation, 0.92),
                (Math, 0.88),
                (VisionTask, 0.95),
            ])
            .complexity_scores([(Simple, 0.95), (Medium, 0.95), (Complex, 0.90), (Expert, 0.85)])
            .latency_ms(1500)
            .cost(2.5, 10.0)
            .context_length(128_000)
            .tiers(5, 4, 3)
            .strengths(["multimodal", "strong reasoning", "long context"])
            .recommended_for(["complex conversation", "image understanding", "code generation"])
            .build(),
        ProfileBuilder::new("gpt-4o-mini", "openai")
            .display_name("GPT-4o Mini")
            .description("Lightweight GPT-4o, cost-effective for simple tasks")
            .capabilities([Vision, Functions, Streaming, JsonMode])
            .task_scores([
                (Chat, 0.88),
                (Reasoning, 0.80),
                (Coding, 0.82),
                (Analysis, 0.78),
                (Summarization, 0.85),
                (Extraction, 0.85),
                (Creative, 0.80),
                (Translation, 0.85),
                (Math, 0.75),
                (VisionTask, 0.80),
            ])
            .complexity_scores([(Simple, 0.95), (Medium, 0.85), (Complex, 0.70), (Expert, 0.55)])
            .latency_ms(800)
            .cost(0.15, 0.6)
            .context_length(128_000)
            .tiers(4, 5, 1)
            .strengths(["fast", "cheap", "long context"])
            .recommended_for(["simple conversation", "fast responses", "bulk processing"])
            .build(),
        ProfileBuilder::new("gpt-4-turbo", "openai")
            .display_name("GPT-4 Turbo")
            .description("Enhanced GPT-4 with a longer context window")
            .capabilities([Vision, Functions, Streaming, JsonMode])
            .task_scores([
                (Chat, 0.93),
                (Reasoning, 0.95),
                (Coding, 0.92),
                (Analysis, 0.93),
                (Summarization, 0.90),
                (Extraction, 0.88),
                (Creative, 0.92),
                (Translation, 0.90),
                (Math, 0.90),
                (VisionTask, 0.90),
            ])
            .complexity_scores([(Simple, 0.92), (Medium, 0.95), (Complex, 0.92), (Expert, 0.88)])
            .latency_ms(2000)
            .cost(10.0, 30.0)
            .context_length(128_000)
            .tiers(5, 3, 4)
            .strengths(["strong reasoning", "strong coding"])
            .recommended_for(["complex reasoning", "code review", "deep analysis"])
            .build(),
        ProfileBuilder::new("o1", "openai")
            .display_name("o1")
            .description("OpenAI reasoning model, tuned for hard problems")
            .capabilities([Streaming])
            .task_scores([
                (Chat, 0.75),
                (Reasoning, 0.98),
                (Coding, 0.95),
                (Analysis, 0.92),
                (Summarization, 0.80),
                (Extraction, 0.85),
                (Creative, 0.70),
                (Translation, 0.80),
                (Math, 0.98),
                (VisionTask, 0.50),
            ])
            .complexity_scores([(Simple, 0.70), (Medium, 0.85), (Complex, 0.95), (Expert, 0.98)])
            .latency_ms(10_000)
            .cost(15.0, 60.0)
            .context_length(200_000)
            .tiers(5, 1, 5)
            .strengths(["top-tier reasoning", "math", "hard problems"])
            .recommended_for(["complex reasoning", "math proofs", "algorithm design"])
            .not_recommended_for(["simple conversation", "fast responses"])
            .build(),
        ProfileBuilder::new("o1-mini", "openai")
            .display_name("o1-mini")
            .description("Lightweight o1, strong reasoning at lower cost")
            .capabilities([Streaming])
            .task_scores([
                (Chat, 0.70),
                (Reasoning, 0.92),
                (Coding, 0.90),
                (Analysis, 0.85),
                (Summarization, 0.75),
                (Extraction, 0.80),
                (Creative, 0.65),
                (Translation, 0.75),
                (Math, 0.92),
                (VisionTask, 0.50),
            ])
            .complexity_scores([(Simple, 0.75), (Medium, 0.88), (Complex, 0.90), (Expert, 0.85)])
            .latency_ms(5000)
            .cost(3.0, 12.0)
            .context_length(128_000)
            .tiers(4, 2, 3)
            .strengths(["reasoning", "value for money"])
            .recommended_for(["mid-complexity reasoning", "programming tasks"])
            .build(),
        ProfileBuilder::new("deepseek-chat", "deepseek")
            .display_name("DeepSeek Chat")
            .description("DeepSeek conversational model, excellent at code, very cheap")
            .capabilities([Functions, Streaming, JsonMode])
            .task_scores([
                (Chat, 0.90),
                (Reasoning, 0.88),
                (Coding, 0.95),
                (Analysis, 0.85),
                (Summarization, 0.85),
                (Extraction, 0.88),
                (Creative, 0.82),
                (Translation, 0.88),
                (Math, 0.90),
                (VisionTask, 0.50),
            ])
            .complexity_scores([(Simple, 0.92), (Medium, 0.90), (Complex, 0.85), (Expert, 0.75)])
            .latency_ms(1200)
            .cost(0.14, 0.28)
            .context_length(64_000)
            .tiers(4, 4, 1)
            .strengths(["strong coding", "very low cost", "good Chinese"])
            .recommended_for(["code generation", "code review", "Chinese conversation"])
            .build(),
        ProfileBuilder::new("deepseek-reasoner", "deepseek")
            .display_name("DeepSeek Reasoner")
            .description("DeepSeek reasoning model for hard problems")
            .capabilities([Streaming])
            .task_scores([
                (Chat, 0.75),
                (Reasoning, 0.95),
                (Coding, 0.92),
                (Analysis, 0.90),
                (Summarization, 0.80),
                (Extraction, 0.85),
                (Creative, 0.70),
                (Translation, 0.80),
                (Math, 0.95),
                (VisionTask, 0.50),
            ])
            .complexity_scores([(Simple, 0.75), (Medium, 0.85), (Complex, 0.92), (Expert, 0.90)])
            .latency_ms(8000)
            .cost(0.55, 2.19)
            .context_length(64_000)
            .tiers(5, 2, 1)
            .strengths(["strong reasoning", "exceptional value"])
            .recommended_for(["complex reasoning", "math problems", "programming"])
            .build(),
        ProfileBuilder::new("claude-3-5-sonnet-20241022", "anthropic")
            .display_name("Claude 3.5 Sonnet")
            .description("Anthropic's latest model, strong all-rounder")
            .capabilities([Vision, Functions, Streaming])
            .task_scores([
                (Chat, 0.95),
                (Reasoning, 0.93),
                (Coding, 0.95),
                (Analysis, 0.93),
                (Summarization, 0.92),
                (Extraction, 0.90),
                (Creative, 0.95),
                (Translation, 0.90),
                (Math, 0.88),
                (VisionTask, 0.92),
            ])
            .complexity_scores([(Simple, 0.95), (Medium, 0.95), (Complex, 0.92), (Expert, 0.88)])
            .latency_ms(1500)
            .cost(3.0, 15.0)
            .context_length(200_000)
            .tiers(5, 4, 3)
            .strengths(["creative writing", "coding", "safety"])
            .recommended_for(["creative writing", "code generation", "deep analysis"])
            .build(),
        ProfileBuilder::new("claude-3-opus-20240229", "anthropic")
            .display_name("Claude 3 Opus")
            .description("Anthropic flagship, top-tier capability")
            .capabilities([Vision, Functions, Streaming])
            .task_scores([
                (Chat, 0.95),
                (Reasoning, 0.95),
                (Coding, 0.93),
                (Analysis, 0.95),
                (Summarization, 0.93),
                (Extraction, 0.90),
                (Creative, 0.98),
                (Translation, 0.92),
                (Math, 0.90),
                (VisionTask, 0.93),
            ])
            .complexity_scores([(Simple, 0.92), (Medium, 0.95), (Complex, 0.95), (Expert, 0.92)])
            .latency_ms(3000)
            .cost(15.0, 75.0)
            .context_length(200_000)
            .tiers(5, 2, 5)
            .strengths(["creative writing", "deep analysis", "hard tasks"])
            .recommended_for(["hardest tasks", "creative writing", "research analysis"])
            .build(),
        ProfileBuilder::new("claude-3-haiku-20240307", "anthropic")
            .display_name("Claude 3 Haiku")
            .description("Anthropic's light model, fast and cheap")
            .capabilities([Vision, Functions, Streaming])
            .task_scores([
                (Chat, 0.85),
                (Reasoning, 0.78),
                (Coding, 0.80),
                (Analysis, 0.75),
                (Summarization, 0.85),
                (Extraction, 0.85),
                (Creative, 0.80),
                (Translation, 0.82),
                (Math, 0.72),
                (VisionTask, 0.78),
            ])
            .complexity_scores([(Simple, 0.95), (Medium, 0.82), (Complex, 0.65), (Expert, 0.50)])
            .latency_ms(500)
            .cost(0.25, 1.25)
            .context_length(200_000)
            .tiers(3, 5, 1)
            .strengths(["very fast", "low cost"])
            .recommended_for(["simple tasks", "fast responses", "bulk processing"])
            .build(),
        ProfileBuilder::new("gemini-1.5-pro", "google")
            .display_name("Gemini 1.5 Pro")
            .description("Google flagship with an extreme context window")
            .capabilities([Vision, Functions, Streaming])
            .task_scores([
                (Chat, 0.92),
                (Reasoning, 0.90),
                (Coding, 0.88),
                (Analysis, 0.90),
                (Summarization, 0.92),
                (Extraction, 0.88),
                (Creative, 0.88),
                (Translation, 0.90),
                (Math, 0.85),
                (VisionTask, 0.92),
            ])
            .complexity_scores([(Simple, 0.92), (Medium, 0.92), (Complex, 0.88), (Expert, 0.82)])
            .latency_ms(2000)
            .cost(1.25, 5.0)
            .context_length(2_000_000)
            .tiers(5, 3, 2)
            .strengths(["extreme context", "multimodal"])
            .recommended_for(["long documents", "video understanding"])
            .build(),
        ProfileBuilder::new("gemini-1.5-flash", "google")
            .display_name("Gemini 1.5 Flash")
            .description("Google's fast model, balanced speed and capability")
            .capabilities([Vision, Functions, Streaming])
            .task_scores([
                (Chat, 0.85),
                (Reasoning, 0.82),
                (Coding, 0.80),
                (Analysis, 0.82),
                (Summarization, 0.85),
                (Extraction, 0.85),
                (Creative, 0.80),
                (Translation, 0.85),
                (Math, 0.78),
                (VisionTask, 0.85),
            ])
            .complexity_scores([(Simple, 0.95), (Medium, 0.85), (Complex, 0.72), (Expert, 0.60)])
            .latency_ms(800)
            .cost(0.075, 0.3)
            .context_length(1_000_000)
            .tiers(4, 5, 1)
            .strengths(["fast", "long context", "low cost"])
            .recommended_for(["simple tasks", "bulk processing"])
            .build(),
        ProfileBuilder::new("qwen-max", "qwen")
            .display_name("Qwen Max")
            .description("Alibaba flagship, strong Chinese capability")
            .capabilities([Functions, Streaming, JsonMode])
            .task_scores([
                (Chat, 0.92),
                (Reasoning, 0.88),
                (Coding, 0.88),
                (Analysis, 0.88),
                (Summarization, 0.90),
                (Extraction, 0.88),
                (Creative, 0.90),
                (Translation, 0.92),
                (Math, 0.85),
                (VisionTask, 0.50),
            ])
            .complexity_scores([(Simple, 0.92), (Medium, 0.90), (Complex, 0.85), (Expert, 0.78)])
            .latency_ms(1500)
            .cost(2.0, 6.0)
            .context_length(32_000)
            .tiers(4, 4, 2)
            .strengths(["strong Chinese", "good translation"])
            .recommended_for(["Chinese conversation", "translation", "creative writing"])
            .build(),
        ProfileBuilder::new("qwen-turbo", "qwen")
            .display_name("Qwen Turbo")
            .description("Alibaba's fast model, good value")
            .capabilities([Functions, Streaming])
            .task_scores([
                (Chat, 0.85),
                (Reasoning, 0.78),
                (Coding, 0.80),
                (Analysis, 0.78),
                (Summarization, 0.85),
                (Extraction, 0.82),
                (Creative, 0.82),
                (Translation, 0.85),
                (Math, 0.75),
                (VisionTask, 0.50),
            ])
            .complexity_scores([(Simple, 0.92), (Medium, 0.82), (Complex, 0.68), (Expert, 0.55)])
            .latency_ms(600)
            .cost(0.3, 0.6)
            .context_length(131_072)
            .tiers(3, 5, 1)
            .strengths(["fast", "cheap", "long context"])
            .recommended_for(["simple conversation", "fast responses"])
            .build(),
        ProfileBuilder::new("llama3.1:70b", "ollama")
            .display_name("Llama 3.1 70B")
            .description("Meta open-weights model, local deployment")
            .capabilities([Streaming])
            .task_scores([
                (Chat, 0.88),
                (Reasoning, 0.85),
                (Coding, 0.85),
                (Analysis, 0.82),
                (Summarization, 0.85),
                (Extraction, 0.82),
                (Creative, 0.85),
                (Translation, 0.82),
                (Math, 0.78),
                (VisionTask, 0.50),
            ])
            .complexity_scores([(Simple, 0.90), (Medium, 0.85), (Complex, 0.78), (Expert, 0.68)])
            .latency_ms(3000)
            .cost(0.0, 0.0)
            .context_length(128_000)
            .tiers(4, 2, 1)
            .strengths(["local deployment", "private", "no API cost"])
            .recommended_for(["privacy-sensitive workloads", "offline use"])
            .build(),
        ProfileBuilder::new("llama3.1:8b", "ollama")
            .display_name("Llama 3.1 8B")
            .description("Meta open-weights small model, fast locally")
            .capabilities([Streaming])
            .task_scores([
                (Chat, 0.78),
                (Reasoning, 0.72),
                (Coding, 0.75),
                (Analysis, 0.70),
                (Summarization, 0.78),
                (Extraction, 0.75),
                (Creative, 0.75),
                (Translation, 0.72),
                (Math, 0.68),
                (VisionTask, 0.50),
            ])
            .complexity_scores([(Simple, 0.88), (Medium, 0.75), (Complex, 0.58), (Expert, 0.45)])
            .latency_ms(800)
            .cost(0.0, 0.0)
            .context_length(128_000)
            .tiers(3, 4, 1)
            .strengths(["fast locally", "low footprint"])
            .recommended_for(["simple tasks", "edge devices"])
            .build(),
        ProfileBuilder::new("qwen2.5:72b", "ollama")
            .display_name("Qwen 2.5 72B")
            .description("Qwen open-weights model, local deployment, strong Chinese")
            .capabilities([Streaming])
            .task_scores([
                (Chat, 0.90),
                (Reasoning, 0.85),
                (Coding, 0.88),
                (Analysis, 0.85),
                (Summarization, 0.88),
                (Extraction, 0.85),
                (Creative, 0.88),
                (Translation, 0.90),
                (Math, 0.82),
                (VisionTask, 0.50),
            ])
            .complexity_scores([(Simple, 0.92), (Medium, 0.88), (Complex, 0.80), (Expert, 0.70)])
            .latency_ms(3500)
            .cost(0.0, 0.0)
            .context_length(131_072)
            .tiers(4, 2, 1)
            .strengths(["strong Chinese", "local deployment", "coding"])
            .recommended_for(["Chinese workloads", "privacy-sensitive use"])
            .build(),
    ];

    profiles.into_iter().map(|p| (p.id.clone(), p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_scores_are_neutral() {
        let profile = ProfileBuilder::new("m", "p").build();
        assert_eq!(profile.task_score(TaskType::Coding), 0.5);
        assert_eq!(profile.complexity_score(TaskComplexity::Expert), 0.5);
    }

    #[test]
    fn default_catalog_scores_in_range() {
        for (id, profile) in default_profiles() {
            assert_eq!(profile.id, id);
            for score in profile.task_scores.values() {
                assert!((0.0..=1.0).contains(score), "{id} task score {score}");
            }
            for score in profile.complexity_scores.values() {
                assert!((0.0..=1.0).contains(score), "{id} complexity score {score}");
            }
            assert!((1..=5).contains(&profile.quality_tier));
        }
    }

    #[test]
    fn total_cost_adds_both_directions() {
        let profiles = default_profiles();
        let deepseek = &profiles["deepseek-chat"];
        assert!((deepseek.total_cost_per_million() - 0.42).abs() < 1e-9);
    }
}
