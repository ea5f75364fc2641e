//! Strategy-based and task-aware routing across LLM providers.
//!
//! [`Router`] keeps a registry of named providers and selects one per
//! request by strategy (round-robin, random, least-latency, least-cost,
//! weighted, fallback), with model-match precedence, health flags, EWMA
//! latency tracking and a single fallback retry. [`SmartRouter`] layers
//! task-aware scoring over it: a classifier maps the request to a task type
//! and complexity, candidate models are filtered by constraints and scored
//! on six axes, and the outcome is recorded for analysis.

pub use {
    classify::{
        ClassificationRule, CompositeClassifier, LlmClassifier, RuleClassifier, TaskClassifier,
    },
    health::HealthChecker,
    profile::{default_profiles, ModelProfile, ProfileBuilder},
    router::{ProviderStats, Router, RouterStats, Strategy},
    smart::{
        AlternativeModel, RoutingConstraints, RoutingContext, RoutingDecision, RoutingPriority,
        RoutingRecord, RoutingStats, ScoreBreakdown, SmartRouter,
    },
    task::{TaskComplexity, TaskType},
};

mod classify;
mod health;
mod profile;
mod router;
mod smart;
mod task;
