//! Task taxonomy used by classification and routing.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The nature of a request, used to pick the best-suited model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskType {
    /// Everyday conversation and Q&A
    Chat,
    /// Logical reasoning and problem analysis
    Reasoning,
    /// Code generation, review and debugging
    Coding,
    /// Data analysis and report generation
    Analysis,
    /// Text summarization and condensation
    Summarization,
    /// Structured data and entity extraction
    Extraction,
    /// Creative writing and content creation
    Creative,
    /// Multi-language translation
    Translation,
    /// Math problem solving and derivation
    Math,
    /// Image and chart understanding
    Vision,
}

impl TaskType {
    /// All task types, in canonical order.
    pub fn all() -> [TaskType; 10] {
        [
            TaskType::Chat,
            TaskType::Reasoning,
            TaskType::Coding,
            TaskType::Analysis,
            TaskType::Summarization,
            TaskType::Extraction,
            TaskType::Creative,
            TaskType::Translation,
            TaskType::Math,
            TaskType::Vision,
        ]
    }
}

/// Difficulty of a task, ordered from simple to expert.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskComplexity {
    /// Simple Q&A, format conversion
    Simple,
    /// Routine programming, text analysis
    Medium,
    /// Architecture design, deep analysis
    Complex,
    /// Frontier research, hardest problems
    Expert,
}

impl TaskComplexity {
    /// Numeric score used in routing computations.
    pub fn score(&self) -> f64 {
        match self {
            TaskComplexity::Simple => 0.25,
            TaskComplexity::Medium => 0.5,
            TaskComplexity::Complex => 0.75,
            TaskComplexity::Expert => 1.0,
        }
    }

    /// All complexities, in ascending order.
    pub fn all() -> [TaskComplexity; 4] {
        [
            TaskComplexity::Simple,
            TaskComplexity::Medium,
            TaskComplexity::Complex,
            TaskComplexity::Expert,
        ]
    }
}
