//! Task-aware routing on top of the base [`Router`].
//!
//! `SmartRouter` filters the registered (provider, model) pairs against the
//! request's constraints, scores each survivor on six axes, and picks the
//! best total under the requested priority. Outcomes are appended to a
//! bounded history for later analysis. Profiles and history sit behind
//! separate locks so scoring does not contend with recording.

use crate::classify::{RuleClassifier, TaskClassifier};
use crate::profile::{default_profiles, ModelProfile};
use crate::router::Router;
use crate::task::{TaskComplexity, TaskType};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use relay_core::{
    CompletionRequest, CompletionResponse, CompletionStream, Error, Feature, ModelInfo, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Cost normalization ceiling: a request estimated at this cost or above
/// scores the floor.
const MAX_COST_PER_REQUEST: f64 = 0.1;

/// Latency normalization ceiling in milliseconds.
const MAX_LATENCY_MS: f64 = 10_000.0;

/// Assumed output tokens when the request does not cap them.
const DEFAULT_OUTPUT_TOKENS: u32 = 500;

/// How routing axes are weighted against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPriority {
    /// Favor task fit above all
    Quality,
    /// Favor the cheapest adequate model
    Cost,
    /// Favor the fastest adequate model
    Latency,
    /// Balance all axes
    #[default]
    Balanced,
}

/// Hard limits and preferences constraining candidate models.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoutingConstraints {
    /// Maximum acceptable latency in milliseconds (0 = unlimited)
    pub max_latency_ms: u64,

    /// Maximum acceptable cost per request in USD (0 = unlimited)
    pub max_cost_per_request: f64,

    /// Providers to favor
    pub preferred_providers: Vec<CompactString>,

    /// Providers to skip entirely
    pub excluded_providers: Vec<CompactString>,

    /// Models to favor
    pub preferred_models: Vec<CompactString>,

    /// Models to skip entirely
    pub excluded_models: Vec<CompactString>,

    /// Require streaming support
    pub require_streaming: bool,

    /// Require vision support
    pub require_vision: bool,

    /// Require function calling support
    pub require_functions: bool,

    /// Require JSON output mode
    pub require_json: bool,
}

/// Task characteristics and constraints guiding a routing decision.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingContext {
    /// The nature of the task
    pub task_type: TaskType,

    /// The difficulty of the task
    pub complexity: TaskComplexity,

    /// Capabilities every candidate must advertise
    pub required_capabilities: Vec<Feature>,

    /// Hard limits and preferences
    pub constraints: RoutingConstraints,

    /// Axis weighting
    pub priority: RoutingPriority,

    /// Free-form hints for callers layered on top
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub hints: Map<String, Value>,
}

impl RoutingContext {
    /// Create a context with the default balanced priority.
    pub fn new(task_type: TaskType, complexity: TaskComplexity) -> Self {
        Self {
            task_type,
            complexity,
            required_capabilities: Vec::new(),
            constraints: RoutingConstraints::default(),
            priority: RoutingPriority::Balanced,
            hints: Map::new(),
        }
    }

    /// Require capabilities of every candidate.
    pub fn with_capabilities(mut self, caps: impl IntoIterator<Item = Feature>) -> Self {
        self.required_capabilities.extend(caps);
        self
    }

    /// Set the maximum acceptable latency.
    pub fn with_max_latency(mut self, ms: u64) -> Self {
        self.constraints.max_latency_ms = ms;
        self
    }

    /// Set the maximum acceptable cost per request.
    pub fn with_max_cost(mut self, cost: f64) -> Self {
        self.constraints.max_cost_per_request = cost;
        self
    }

    /// Set the axis weighting.
    pub fn with_priority(mut self, priority: RoutingPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Favor the given providers.
    pub fn with_preferred_providers(
        mut self,
        providers: impl IntoIterator<Item = CompactString>,
    ) -> Self {
        self.constraints.preferred_providers.extend(providers);
        self
    }

    /// Favor the given models.
    pub fn with_preferred_models(
        mut self,
        models: impl IntoIterator<Item = CompactString>,
    ) -> Self {
        self.constraints.preferred_models.extend(models);
        self
    }

    /// Exclude the given providers.
    pub fn with_excluded_providers(
        mut self,
        providers: impl IntoIterator<Item = CompactString>,
    ) -> Self {
        self.constraints.excluded_providers.extend(providers);
        self
    }

    /// Require vision support.
    pub fn require_vision(mut self) -> Self {
        self.constraints.require_vision = true;
        if !self.required_capabilities.contains(&Feature::Vision) {
            self.required_capabilities.push(Feature::Vision);
        }
        self
    }

    /// Require function calling support.
    pub fn require_functions(mut self) -> Self {
        self.constraints.require_functions = true;
        if !self.required_capabilities.contains(&Feature::Functions) {
            self.required_capabilities.push(Feature::Functions);
        }
        self
    }

    /// Require streaming support.
    pub fn require_streaming(mut self) -> Self {
        self.constraints.require_streaming = true;
        if !self.required_capabilities.contains(&Feature::Streaming) {
            self.required_capabilities.push(Feature::Streaming);
        }
        self
    }
}

impl Default for RoutingContext {
    fn default() -> Self {
        Self::new(TaskType::Chat, TaskComplexity::Medium)
    }
}

/// Per-axis scores, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ScoreBreakdown {
    /// Task fit
    pub task: f64,
    /// Complexity fit
    pub complexity: f64,
    /// Cost (higher = cheaper)
    pub cost: f64,
    /// Latency (higher = faster)
    pub latency: f64,
    /// Fraction of required capabilities satisfied
    pub capability: f64,
    /// Preference bonus
    pub preference: f64,
}

/// A model that ranked below the selected one.
#[derive(Debug, Clone, Serialize)]
pub struct AlternativeModel {
    /// Provider name
    pub provider_name: CompactString,
    /// Model id
    pub model_id: CompactString,
    /// Total score
    pub score: f64,
    /// Why it was not chosen
    pub reason: String,
}

/// The outcome of a routing decision.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    /// Name of the selected provider
    pub provider_name: CompactString,

    /// Id of the selected model
    pub model_id: CompactString,

    /// Metadata of the selected model
    pub model_info: ModelInfo,

    /// Human-readable explanation of the choice
    pub reason: String,

    /// Total score in [0, 1]
    pub score: f64,

    /// Per-axis score detail
    pub scores: ScoreBreakdown,

    /// Estimated request cost in USD
    pub estimated_cost: f64,

    /// Estimated latency in milliseconds
    pub estimated_latency_ms: u64,

    /// Up to three runners-up
    pub alternatives: Vec<AlternativeModel>,

    /// When the decision was made
    pub decided_at: DateTime<Utc>,
}

/// A routing decision together with its observed outcome.
#[derive(Debug, Clone)]
pub struct RoutingRecord {
    /// The decision that was executed
    pub decision: RoutingDecision,

    /// The context it was made under
    pub context: RoutingContext,

    /// Whether the provider call succeeded
    pub success: bool,

    /// Observed latency
    pub actual_latency: Duration,

    /// Observed cost in USD, from usage and profile pricing
    pub actual_cost: f64,

    /// When the record was taken
    pub timestamp: DateTime<Utc>,
}

/// Aggregate statistics over the routing history.
#[derive(Debug, Clone, Default)]
pub struct RoutingStats {
    /// Total recorded requests
    pub total_requests: usize,
    /// Requests that succeeded
    pub successful_requests: usize,
    /// Requests per model id
    pub model_usage: HashMap<CompactString, usize>,
    /// Requests per provider
    pub provider_usage: HashMap<CompactString, usize>,
    /// Requests per task type
    pub task_usage: HashMap<TaskType, usize>,
    /// Mean observed latency per model id
    pub average_latency: HashMap<CompactString, Duration>,
    /// Mean observed cost per model id
    pub average_cost: HashMap<CompactString, f64>,
    /// Success ratio per model id
    pub success_rate: HashMap<CompactString, f64>,
}

struct Candidate {
    provider_name: CompactString,
    model: ModelInfo,
    profile: Option<ModelProfile>,
}

struct Scored {
    candidate: Candidate,
    scores: ScoreBreakdown,
    total: f64,
}

/// Task-aware router over a base [`Router`].
pub struct SmartRouter {
    base: Router,
    classifier: Option<Arc<dyn TaskClassifier>>,
    profiles: RwLock<HashMap<CompactString, ModelProfile>>,
    history: Mutex<Vec<RoutingRecord>>,
    max_history: usize,
    auto_classify: bool,
}

impl SmartRouter {
    /// Create a smart router over a base router, seeded with the default
    /// profile catalog and the rule-based classifier.
    pub fn new(base: Router) -> Self {
        Self {
            base,
            classifier: Some(Arc::new(RuleClassifier::new())),
            profiles: RwLock::new(default_profiles()),
            history: Mutex::new(Vec::new()),
            max_history: 1000,
            auto_classify: true,
        }
    }

    /// Replace the task classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn TaskClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Enable or disable automatic classification of unrouted requests.
    pub fn with_auto_classify(mut self, enabled: bool) -> Self {
        self.auto_classify = enabled;
        self
    }

    /// Cap the routing history length.
    pub fn with_max_history(mut self, size: usize) -> Self {
        self.max_history = size;
        self
    }

    /// Replace the profile registry.
    pub fn with_profiles(mut self, profiles: HashMap<CompactString, ModelProfile>) -> Self {
        *self.profiles.get_mut().expect("profiles lock poisoned") = profiles;
        self
    }

    /// The underlying base router.
    pub fn base(&self) -> &Router {
        &self.base
    }

    /// Register or replace a model profile.
    pub fn register_profile(&self, profile: ModelProfile) {
        let mut profiles = self.profiles.write().expect("profiles lock poisoned");
        profiles.insert(profile.id.clone(), profile);
    }

    /// Look up a model profile.
    pub fn profile(&self, model_id: &str) -> Option<ModelProfile> {
        let profiles = self.profiles.read().expect("profiles lock poisoned");
        profiles.get(model_id).cloned()
    }

    /// Decide the best (provider, model) pair for a request.
    ///
    /// When `routing_ctx` is absent and auto-classification is enabled, the
    /// configured classifier supplies the task type and complexity.
    pub async fn route(
        &self,
        req: &CompletionRequest,
        routing_ctx: Option<&RoutingContext>,
    ) -> Result<RoutingDecision> {
        let ctx = self.resolve_context(req, routing_ctx).await;
        self.route_resolved(req, &ctx)
    }

    /// Route, execute, and record the outcome.
    ///
    /// Provider errors propagate unmodified — there is no automatic retry
    /// against the next-best candidate; the caller owns retry policy.
    pub async fn complete_with_routing(
        &self,
        req: CompletionRequest,
        routing_ctx: Option<&RoutingContext>,
    ) -> Result<(CompletionResponse, RoutingDecision)> {
        let ctx = self.resolve_context(&req, routing_ctx).await;
        let decision = self.route_resolved(&req, &ctx)?;

        let provider = self
            .base
            .provider(&decision.provider_name)
            .ok_or_else(|| Error::Unavailable(decision.provider_name.to_string()))?;

        let mut req = req;
        req.model = decision.model_id.clone();

        let start = Instant::now();
        let result = provider.complete(req).await;
        let elapsed = start.elapsed();

        let actual_cost = match &result {
            Ok(resp) => self.actual_cost(&decision.model_id, resp),
            Err(_) => 0.0,
        };
        self.record(RoutingRecord {
            decision: decision.clone(),
            context: ctx,
            success: result.is_ok(),
            actual_latency: elapsed,
            actual_cost,
            timestamp: Utc::now(),
        });

        result.map(|resp| (resp, decision))
    }

    /// Route and open a stream. Streaming force-requires the streaming
    /// capability of every candidate.
    pub async fn stream_with_routing(
        &self,
        req: CompletionRequest,
        routing_ctx: Option<&RoutingContext>,
    ) -> Result<(CompletionStream, RoutingDecision)> {
        let ctx = self.resolve_context(&req, routing_ctx).await.require_streaming();
        let decision = self.route_resolved(&req, &ctx)?;

        let provider = self
            .base
            .provider(&decision.provider_name)
            .ok_or_else(|| Error::Unavailable(decision.provider_name.to_string()))?;

        let mut req = req;
        req.model = decision.model_id.clone();

        let stream = provider.stream(req).await?;
        Ok((stream, decision))
    }

    /// A copy of the routing history, oldest first.
    pub fn history(&self) -> Vec<RoutingRecord> {
        self.history.lock().expect("history lock poisoned").clone()
    }

    /// Aggregate statistics over the routing history.
    pub fn stats(&self) -> RoutingStats {
        let history = self.history.lock().expect("history lock poisoned");

        let mut stats = RoutingStats {
            total_requests: history.len(),
            ..Default::default()
        };
        let mut latency_sums: HashMap<CompactString, Duration> = HashMap::new();
        let mut cost_sums: HashMap<CompactString, f64> = HashMap::new();
        let mut success_counts: HashMap<CompactString, usize> = HashMap::new();

        for record in history.iter() {
            let model = record.decision.model_id.clone();
            *stats.model_usage.entry(model.clone()).or_default() += 1;
            *stats
                .provider_usage
                .entry(record.decision.provider_name.clone())
                .or_default() += 1;
            *stats.task_usage.entry(record.context.task_type).or_default() += 1;

            *latency_sums.entry(model.clone()).or_default() += record.actual_latency;
            *cost_sums.entry(model.clone()).or_default() += record.actual_cost;
            if record.success {
                *success_counts.entry(model).or_default() += 1;
                stats.successful_requests += 1;
            }
        }

        for (model, count) in &stats.model_usage {
            let n = *count as u32;
            stats
                .average_latency
                .insert(model.clone(), latency_sums[model] / n);
            stats
                .average_cost
                .insert(model.clone(), cost_sums[model] / *count as f64);
            stats.success_rate.insert(
                model.clone(),
                success_counts.get(model).copied().unwrap_or(0) as f64 / *count as f64,
            );
        }

        stats
    }

    async fn resolve_context(
        &self,
        req: &CompletionRequest,
        routing_ctx: Option<&RoutingContext>,
    ) -> RoutingContext {
        if let Some(ctx) = routing_ctx {
            return ctx.clone();
        }
        if self.auto_classify {
            if let Some(classifier) = &self.classifier {
                let (task, complexity) = classifier.classify(req).await;
                return RoutingContext::new(task, complexity);
            }
        }
        RoutingContext::default()
    }

    fn route_resolved(
        &self,
        req: &CompletionRequest,
        ctx: &RoutingContext,
    ) -> Result<RoutingDecision> {
        let candidates = self.candidates(ctx, req);
        if candidates.is_empty() {
            return Err(Error::NoCandidates);
        }

        let mut scored: Vec<Scored> = candidates
            .into_iter()
            .map(|candidate| {
                let scores = self.score(&candidate, ctx, req);
                let total = total_score(&scores, ctx.priority);
                Scored {
                    candidate,
                    scores,
                    total,
                }
            })
            .collect();

        // Stable sort: candidates were enumerated in registration order, so
        // equal totals resolve deterministically.
        scored.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));

        let alternatives = scored
            .iter()
            .skip(1)
            .take(3)
            .map(|alt| AlternativeModel {
                provider_name: alt.candidate.provider_name.clone(),
                model_id: alt.candidate.model.id.clone(),
                score: alt.total,
                reason: format!("score {:.2}, below the best candidate", alt.total),
            })
            .collect();

        let best = &scored[0];
        Ok(RoutingDecision {
            provider_name: best.candidate.provider_name.clone(),
            model_id: best.candidate.model.id.clone(),
            model_info: best.candidate.model.clone(),
            reason: decision_reason(best, ctx),
            score: best.total,
            scores: best.scores,
            estimated_cost: estimate_cost(&best.candidate.model, req),
            estimated_latency_ms: self.estimate_latency(&best.candidate),
            alternatives,
            decided_at: Utc::now(),
        })
    }

    /// Enumerate candidate (provider, model) pairs in registration order.
    ///
    /// A missing profile never excludes a model — it just scores neutral.
    /// Budget constraints are hard filters: a model whose estimated cost or
    /// latency exceeds the caps is not a candidate at all.
    fn candidates(&self, ctx: &RoutingContext, req: &CompletionRequest) -> Vec<Candidate> {
        let health_filtered = self.base.health_check_enabled();
        let profiles = self.profiles.read().expect("profiles lock poisoned");

        let mut candidates = Vec::new();
        for (name, provider) in self.base.providers() {
            if ctx.constraints.excluded_providers.contains(&name) {
                continue;
            }
            if health_filtered && !self.base.is_healthy(&name) {
                continue;
            }

            for model in provider.models() {
                if ctx.constraints.excluded_models.contains(&model.id) {
                    continue;
                }
                if !meets_capability_requirements(&model, ctx) {
                    continue;
                }

                let profile = profiles.get(&model.id).cloned();
                let candidate = Candidate {
                    provider_name: name.clone(),
                    model,
                    profile,
                };
                if self.violates_budget(&candidate, ctx, req) {
                    continue;
                }
                candidates.push(candidate);
            }
        }

        candidates
    }

    fn violates_budget(&self, c: &Candidate, ctx: &RoutingContext, req: &CompletionRequest) -> bool {
        let constraints = &ctx.constraints;
        if constraints.max_cost_per_request > 0.0
            && estimate_cost(&c.model, req) > constraints.max_cost_per_request
        {
            return true;
        }
        if constraints.max_latency_ms > 0 {
            // Only a known latency can violate the cap.
            let known = match &c.profile {
                Some(profile) if profile.average_latency_ms > 0 => {
                    Some(profile.average_latency_ms as f64)
                }
                _ => self.base.latency_ms(&c.provider_name).filter(|l| *l > 0.0),
            };
            if let Some(latency_ms) = known {
                if latency_ms > constraints.max_latency_ms as f64 {
                    return true;
                }
            }
        }
        false
    }

    fn score(&self, c: &Candidate, ctx: &RoutingContext, req: &CompletionRequest) -> ScoreBreakdown {
        ScoreBreakdown {
            task: c
                .profile
                .as_ref()
                .map(|p| p.task_score(ctx.task_type))
                .unwrap_or(0.5),
            complexity: c
                .profile
                .as_ref()
                .map(|p| p.complexity_score(ctx.complexity))
                .unwrap_or(0.5),
            cost: cost_score(c, ctx, req),
            latency: self.latency_score(c, ctx),
            capability: capability_score(c, ctx),
            preference: preference_score(c, ctx),
        }
    }

    fn latency_score(&self, c: &Candidate, ctx: &RoutingContext) -> f64 {
        let latency_ms = match &c.profile {
            Some(profile) if profile.average_latency_ms > 0 => profile.average_latency_ms as f64,
            _ => match self.base.latency_ms(&c.provider_name) {
                Some(l) if l > 0.0 => l,
                // No data yet — score neutral.
                _ => return 0.5,
            },
        };

        let max = ctx.constraints.max_latency_ms;
        if max > 0 && latency_ms > max as f64 {
            return 0.0;
        }

        if latency_ms >= MAX_LATENCY_MS {
            0.1
        } else {
            1.0 - latency_ms / MAX_LATENCY_MS
        }
    }

    fn estimate_latency(&self, c: &Candidate) -> u64 {
        if let Some(profile) = &c.profile {
            if profile.average_latency_ms > 0 {
                return profile.average_latency_ms;
            }
        }
        match self.base.latency_ms(&c.provider_name) {
            Some(l) if l > 0.0 => l as u64,
            _ => 1000,
        }
    }

    fn actual_cost(&self, model_id: &str, resp: &CompletionResponse) -> f64 {
        match self.profile(model_id) {
            Some(profile) => {
                (resp.usage.prompt_tokens as f64 * profile.input_cost_per_million
                    + resp.usage.completion_tokens as f64 * profile.output_cost_per_million)
                    / 1_000_000.0
            }
            None => 0.0,
        }
    }

    fn record(&self, record: RoutingRecord) {
        let mut history = self.history.lock().expect("history lock poisoned");
        history.push(record);
        let len = history.len();
        if len > self.max_history {
            history.drain(0..len - self.max_history);
        }
    }
}

fn meets_capability_requirements(model: &ModelInfo, ctx: &RoutingContext) -> bool {
    if ctx
        .required_capabilities
        .iter()
        .any(|cap| !model.has_feature(*cap))
    {
        return false;
    }

    let c = &ctx.constraints;
    if c.require_vision && !model.has_feature(Feature::Vision) {
        return false;
    }
    if c.require_functions && !model.has_feature(Feature::Functions) {
        return false;
    }
    if c.require_streaming && !model.has_feature(Feature::Streaming) {
        return false;
    }
    if c.require_json && !model.has_feature(Feature::JsonMode) {
        return false;
    }

    true
}

/// Estimate request cost in USD: ~4 chars per input token plus the capped or
/// assumed output budget.
fn estimate_cost(model: &ModelInfo, req: &CompletionRequest) -> f64 {
    let input_tokens: usize = req.messages.iter().map(|m| m.content.len() / 4).sum();
    let output_tokens = req.max_tokens.unwrap_or(DEFAULT_OUTPUT_TOKENS);

    (input_tokens as f64 * model.input_cost_per_million
        + output_tokens as f64 * model.output_cost_per_million)
        / 1_000_000.0
}

fn cost_score(c: &Candidate, ctx: &RoutingContext, req: &CompletionRequest) -> f64 {
    let estimated = estimate_cost(&c.model, req);

    let max = ctx.constraints.max_cost_per_request;
    if max > 0.0 && estimated > max {
        return 0.0;
    }

    if estimated >= MAX_COST_PER_REQUEST {
        0.1
    } else {
        1.0 - estimated / MAX_COST_PER_REQUEST
    }
}

fn capability_score(c: &Candidate, ctx: &RoutingContext) -> f64 {
    if ctx.required_capabilities.is_empty() {
        return 1.0;
    }
    let matched = ctx
        .required_capabilities
        .iter()
        .filter(|cap| c.model.has_feature(**cap))
        .count();
    matched as f64 / ctx.required_capabilities.len() as f64
}

fn preference_score(c: &Candidate, ctx: &RoutingContext) -> f64 {
    let mut score: f64 = 0.5;
    if ctx
        .constraints
        .preferred_providers
        .contains(&c.provider_name)
    {
        score += 0.3;
    }
    if ctx.constraints.preferred_models.contains(&c.model.id) {
        score += 0.2;
    }
    score.min(1.0)
}

fn total_score(s: &ScoreBreakdown, priority: RoutingPriority) -> f64 {
    match priority {
        RoutingPriority::Quality => {
            s.task * 0.4
                + s.complexity * 0.25
                + s.capability * 0.2
                + s.cost * 0.05
                + s.latency * 0.05
                + s.preference * 0.05
        }
        RoutingPriority::Cost => {
            s.cost * 0.5
                + s.task * 0.2
                + s.complexity * 0.1
                + s.capability * 0.1
                + s.latency * 0.05
                + s.preference * 0.05
        }
        RoutingPriority::Latency => {
            s.latency * 0.5
                + s.task * 0.2
                + s.complexity * 0.1
                + s.capability * 0.1
                + s.cost * 0.05
                + s.preference * 0.05
        }
        RoutingPriority::Balanced => {
            s.task * 0.25
                + s.complexity * 0.15
                + s.cost * 0.2
                + s.latency * 0.15
                + s.capability * 0.15
                + s.preference * 0.1
        }
    }
}

fn decision_reason(best: &Scored, ctx: &RoutingContext) -> String {
    format!(
        "selected {} ({}) for {} task, total score {:.2} (task {:.2}, complexity {:.2}, cost {:.2}, latency {:.2})",
        best.candidate.model.id,
        best.candidate.provider_name,
        ctx.task_type,
        best.total,
        best.scores.task,
        best.scores.complexity,
        best.scores.cost,
        best.scores.latency,
    )
}
