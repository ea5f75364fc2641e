//! Multi-provider router with strategy-based selection.
//!
//! `Router` is a concurrent-safe named provider map behind a single
//! reader-writer lock. Selection takes the write lock only to advance the
//! round-robin cursor; every other strategy runs under the read lock.
//! Callers never hold the lock while performing LLM calls — selection
//! returns a cloned `Arc<dyn Provider>` handle, so unregistering a provider
//! is safe relative to in-flight requests.

use async_trait::async_trait;
use compact_str::CompactString;
use rand::Rng;
use relay_core::{
    CompletionRequest, CompletionResponse, CompletionStream, Error, Message, ModelInfo, Provider,
    Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use strum::{Display, EnumString};

/// Smoothing factor of the per-provider latency moving average.
const LATENCY_EWMA_ALPHA: f64 = 0.3;

/// Provider selection policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    /// Cycle through healthy providers in order
    #[default]
    RoundRobin,
    /// Pick a healthy provider uniformly at random
    Random,
    /// Pick the provider with the lowest recorded latency
    LeastLatency,
    /// Pick the provider offering the cheapest matching model
    LeastCost,
    /// Weighted random pick by configured provider weights
    Weighted,
    /// First healthy provider in registration order
    Fallback,
    /// Honor the requested model's provider mapping
    ModelMatch,
}

struct Inner {
    providers: HashMap<CompactString, Arc<dyn Provider>>,
    /// Registration order; drives round-robin and tie-breaks.
    order: Vec<CompactString>,
    weights: HashMap<CompactString, u32>,
    /// model id -> provider name, first-writer-wins.
    model_map: HashMap<CompactString, CompactString>,
    healthy: HashMap<CompactString, bool>,
    /// EWMA latency per provider, in milliseconds.
    latencies: HashMap<CompactString, f64>,
    strategy: Strategy,
    fallback: Option<CompactString>,
    health_check: bool,
    rr_cursor: usize,
}

/// Multi-provider router.
///
/// Cloning shares the underlying state — hand clones to the health checker
/// and the smart router.
pub struct Router {
    inner: Arc<RwLock<Inner>>,
}

impl Router {
    /// Create an empty router with the default round-robin strategy.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                providers: HashMap::new(),
                order: Vec::new(),
                weights: HashMap::new(),
                model_map: HashMap::new(),
                healthy: HashMap::new(),
                latencies: HashMap::new(),
                strategy: Strategy::default(),
                fallback: None,
                health_check: false,
                rr_cursor: 0,
            })),
        }
    }

    /// Set the selection strategy.
    pub fn with_strategy(self, strategy: Strategy) -> Self {
        self.write().strategy = strategy;
        self
    }

    /// Set the fallback provider used to retry a failed request once.
    pub fn with_fallback(self, name: impl Into<CompactString>) -> Self {
        self.write().fallback = Some(name.into());
        self
    }

    /// Enable health filtering of selection candidates.
    pub fn with_health_check(self, enabled: bool) -> Self {
        self.write().health_check = enabled;
        self
    }

    /// Set provider weights for the weighted strategy.
    pub fn with_weights(self, weights: impl IntoIterator<Item = (CompactString, u32)>) -> Self {
        self.write().weights.extend(weights);
        self
    }

    /// Register a provider under a name.
    ///
    /// Auto-maps every model the provider advertises to it, first writer
    /// wins. The provider starts healthy with weight 1 unless a weight was
    /// configured earlier.
    pub fn register(&self, name: impl Into<CompactString>, provider: Arc<dyn Provider>) {
        let name = name.into();
        let models = provider.models();

        let mut inner = self.write();
        if !inner.providers.contains_key(&name) {
            inner.order.push(name.clone());
        }
        inner.healthy.insert(name.clone(), true);
        inner.weights.entry(name.clone()).or_insert(1);
        for model in models {
            inner
                .model_map
                .entry(model.id)
                .or_insert_with(|| name.clone());
        }
        inner.providers.insert(name, provider);
    }

    /// Remove a provider and every reference to it.
    ///
    /// In-flight calls holding the provider's `Arc` run to completion.
    pub fn unregister(&self, name: &str) {
        let mut inner = self.write();
        inner.providers.remove(name);
        inner.healthy.remove(name);
        inner.latencies.remove(name);
        inner.weights.remove(name);
        inner.order.retain(|n| n != name);
        inner.model_map.retain(|_, provider| provider != name);
    }

    /// Map a model id to a provider explicitly, overriding auto-mapping.
    pub fn map_model(&self, model: impl Into<CompactString>, provider: impl Into<CompactString>) {
        self.write().model_map.insert(model.into(), provider.into());
    }

    /// Mark a provider healthy or unhealthy.
    pub fn set_healthy(&self, name: &str, healthy: bool) {
        let mut inner = self.write();
        if let Some(flag) = inner.healthy.get_mut(name) {
            *flag = healthy;
        }
    }

    /// Whether a provider is currently marked healthy.
    pub fn is_healthy(&self, name: &str) -> bool {
        self.read().healthy.get(name).copied().unwrap_or(false)
    }

    /// Whether selection filters by health.
    pub fn health_check_enabled(&self) -> bool {
        self.read().health_check
    }

    /// Look up a provider handle by name.
    pub fn provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.read().providers.get(name).cloned()
    }

    /// Providers in registration order.
    pub fn providers(&self) -> Vec<(CompactString, Arc<dyn Provider>)> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|name| {
                inner
                    .providers
                    .get(name)
                    .map(|p| (name.clone(), p.clone()))
            })
            .collect()
    }

    /// Recorded EWMA latency for a provider, in milliseconds.
    pub fn latency_ms(&self, name: &str) -> Option<f64> {
        self.read().latencies.get(name).copied()
    }

    /// Snapshot of per-provider state.
    pub fn stats(&self) -> RouterStats {
        let inner = self.read();
        RouterStats {
            provider_count: inner.order.len(),
            providers: inner
                .order
                .iter()
                .map(|name| {
                    (
                        name.clone(),
                        ProviderStats {
                            name: name.clone(),
                            healthy: inner.healthy.get(name).copied().unwrap_or(false),
                            latency_ms: inner.latencies.get(name).copied(),
                            weight: inner.weights.get(name).copied().unwrap_or(1),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Record a latency sample for a provider (EWMA, alpha 0.3).
    pub fn record_latency(&self, name: &str, latency: Duration) {
        let sample = latency.as_secs_f64() * 1000.0;
        let mut inner = self.write();
        let value = match inner.latencies.get(name) {
            Some(old) => old * (1.0 - LATENCY_EWMA_ALPHA) + sample * LATENCY_EWMA_ALPHA,
            None => sample,
        };
        inner.latencies.insert(name.into(), value);
    }

    /// Select a provider for a request targeting `model` (may be empty).
    ///
    /// Model-match takes precedence over the configured strategy: a
    /// non-empty model mapped to a healthy provider is always honored.
    pub fn select(&self, model: &str) -> Result<(CompactString, Arc<dyn Provider>)> {
        let strategy = {
            let inner = self.read();
            if inner.order.is_empty() {
                return Err(Error::NoProviders);
            }

            if !model.is_empty() {
                if let Some(name) = inner.model_map.get(model) {
                    if let Some(provider) = inner.providers.get(name) {
                        if !inner.health_check || inner.healthy.get(name).copied().unwrap_or(false)
                        {
                            return Ok((name.clone(), provider.clone()));
                        }
                    }
                }
            }

            let available = healthy_names(&inner);
            if available.is_empty() {
                return Err(Error::NoHealthyProviders);
            }

            match inner.strategy {
                Strategy::Random => {
                    let idx = rand::thread_rng().gen_range(0..available.len());
                    return lookup(&inner, &available[idx]);
                }
                Strategy::LeastLatency => {
                    let name = least_latency(&inner, &available);
                    return lookup(&inner, &name);
                }
                Strategy::LeastCost => {
                    let name = least_cost(&inner, &available, model);
                    return lookup(&inner, &name);
                }
                Strategy::Weighted => {
                    let name = weighted(&inner, &available);
                    return lookup(&inner, &name);
                }
                Strategy::Fallback => {
                    return lookup(&inner, &available[0]);
                }
                Strategy::RoundRobin | Strategy::ModelMatch => inner.strategy,
            }
        };

        // Round-robin advances the cursor under the write lock. The healthy
        // set is re-captured here; the cursor is advisory, not a global
        // sequencer, so a membership change between the two reads is benign.
        debug_assert!(matches!(
            strategy,
            Strategy::RoundRobin | Strategy::ModelMatch
        ));
        let mut inner = self.write();
        let available = healthy_names(&inner);
        if available.is_empty() {
            return Err(Error::NoHealthyProviders);
        }
        let idx = inner.rr_cursor % available.len();
        // Reset instead of wrapping when the cursor would overflow.
        inner.rr_cursor = inner.rr_cursor.checked_add(1).unwrap_or(0);
        lookup(&inner, &available[idx])
    }

    fn fallback_provider(&self) -> Option<(CompactString, Arc<dyn Provider>)> {
        let inner = self.read();
        let name = inner.fallback.clone()?;
        let provider = inner.providers.get(&name)?.clone();
        Some((name, provider))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("router lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("router lock poisoned")
    }
}

fn healthy_names(inner: &Inner) -> Vec<CompactString> {
    if !inner.health_check {
        return inner.order.clone();
    }
    inner
        .order
        .iter()
        .filter(|name| inner.healthy.get(*name).copied().unwrap_or(false))
        .cloned()
        .collect()
}

fn lookup(inner: &Inner, name: &CompactString) -> Result<(CompactString, Arc<dyn Provider>)> {
    inner
        .providers
        .get(name)
        .map(|p| (name.clone(), p.clone()))
        .ok_or(Error::NoHealthyProviders)
}

fn least_latency(inner: &Inner, available: &[CompactString]) -> CompactString {
    let mut selected: Option<(&CompactString, f64)> = None;
    for name in available {
        // Providers without a recorded latency are skipped.
        let Some(latency) = inner.latencies.get(name).copied() else {
            continue;
        };
        if latency <= 0.0 {
            continue;
        }
        match selected {
            Some((_, best)) if latency >= best => {}
            _ => selected = Some((name, latency)),
        }
    }
    selected
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| available[0].clone())
}

fn least_cost(inner: &Inner, available: &[CompactString], model: &str) -> CompactString {
    let mut selected: Option<(&CompactString, f64)> = None;
    for name in available {
        let Some(provider) = inner.providers.get(name) else {
            continue;
        };
        for info in provider.models() {
            if !model.is_empty() && info.id != model {
                continue;
            }
            let cost = info.input_cost_per_million + info.output_cost_per_million;
            match selected {
                Some((_, best)) if cost >= best => {}
                _ => selected = Some((name, cost)),
            }
        }
    }
    selected
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| available[0].clone())
}

fn weighted(inner: &Inner, available: &[CompactString]) -> CompactString {
    let total: u32 = available
        .iter()
        .map(|name| inner.weights.get(name).copied().unwrap_or(0))
        .sum();
    if total == 0 {
        return available[0].clone();
    }

    let target = rand::thread_rng().gen_range(0..total);
    let mut current = 0;
    for name in available {
        current += inner.weights.get(name).copied().unwrap_or(0);
        if current > target {
            return name.clone();
        }
    }
    available[0].clone()
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Router {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("Router")
            .field("providers", &inner.order)
            .field("strategy", &inner.strategy)
            .field("fallback", &inner.fallback)
            .finish()
    }
}

#[async_trait]
impl Provider for Router {
    fn name(&self) -> &str {
        "router"
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse> {
        let (name, provider) = self.select(&req.model)?;

        let start = Instant::now();
        let result = provider.complete(req.clone()).await;
        self.record_latency(&name, start.elapsed());

        match result {
            Ok(resp) => Ok(resp),
            // Cancellation is the caller's signal; never mask it with a retry.
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(err) => {
                if let Some((fb_name, fb)) = self.fallback_provider() {
                    if fb_name != name {
                        return fb.complete(req).await;
                    }
                }
                Err(err)
            }
        }
    }

    async fn stream(&self, req: CompletionRequest) -> Result<CompletionStream> {
        let (name, provider) = self.select(&req.model)?;

        match provider.stream(req.clone()).await {
            Ok(stream) => Ok(stream),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(err) => {
                if let Some((fb_name, fb)) = self.fallback_provider() {
                    if fb_name != name {
                        return fb.stream(req).await;
                    }
                }
                Err(err)
            }
        }
    }

    /// Models across all providers, de-duplicated by id.
    fn models(&self) -> Vec<ModelInfo> {
        let providers = self.providers();
        let mut seen = std::collections::HashSet::new();
        let mut models = Vec::new();
        for (_, provider) in providers {
            for model in provider.models() {
                if seen.insert(model.id.clone()) {
                    models.push(model);
                }
            }
        }
        models
    }

    fn count_tokens(&self, messages: &[Message]) -> Result<usize> {
        let providers = self.providers();
        let (_, first) = providers.first().ok_or(Error::NoProviders)?;
        first.count_tokens(messages)
    }
}

/// Snapshot of router state.
#[derive(Debug, Clone, Serialize)]
pub struct RouterStats {
    /// Number of registered providers
    pub provider_count: usize,
    /// Per-provider state keyed by name
    pub providers: HashMap<CompactString, ProviderStats>,
}

/// Per-provider state in a [`RouterStats`] snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    /// Provider name
    pub name: CompactString,
    /// Current health flag
    pub healthy: bool,
    /// EWMA latency in milliseconds, if recorded
    pub latency_ms: Option<f64>,
    /// Weight for the weighted strategy
    pub weight: u32,
}
