//! Tests for the smart router: filtering, scoring, decisions, history.

mod common;

use common::{model, MockProvider};
use relay_core::{CompletionRequest, Error, Feature, Message};
use relay_router::{
    Router, RoutingContext, RoutingPriority, SmartRouter, TaskComplexity, TaskType,
};
use std::sync::Arc;

fn coding_router() -> (SmartRouter, Arc<MockProvider>, Arc<MockProvider>) {
    let openai = Arc::new(MockProvider::new(
        "openai",
        vec![
            model(
                "gpt-4o",
                2.5,
                10.0,
                &[Feature::Vision, Feature::Functions, Feature::Streaming],
            ),
            model(
                "gpt-4o-mini",
                0.15,
                0.6,
                &[Feature::Vision, Feature::Functions, Feature::Streaming],
            ),
        ],
    ));
    let deepseek = Arc::new(MockProvider::new(
        "deepseek",
        vec![model(
            "deepseek-chat",
            0.14,
            0.28,
            &[Feature::Functions, Feature::Streaming],
        )],
    ));

    let base = Router::new();
    base.register("openai", openai.clone());
    base.register("deepseek", deepseek.clone());

    (SmartRouter::new(base), openai, deepseek)
}

fn coding_request() -> CompletionRequest {
    CompletionRequest::from_messages(vec![Message::user("请写一个快速排序算法")])
}

#[tokio::test]
async fn routes_coding_task_to_strong_cheap_model() {
    let (router, _, _) = coding_router();
    let ctx = RoutingContext::new(TaskType::Coding, TaskComplexity::Medium);

    let decision = router.route(&coding_request(), Some(&ctx)).await.unwrap();

    assert!(
        decision.model_id == "deepseek-chat" || decision.model_id == "gpt-4o",
        "unexpected model {}",
        decision.model_id
    );
    assert!(decision.score > 0.7, "score was {}", decision.score);
    assert!(!decision.reason.is_empty());
}

#[tokio::test]
async fn cost_priority_prefers_cheapest_adequate() {
    let (router, _, _) = coding_router();
    let ctx = RoutingContext::new(TaskType::Chat, TaskComplexity::Simple)
        .with_priority(RoutingPriority::Cost);

    let decision = router.route(&coding_request(), Some(&ctx)).await.unwrap();
    let cheapest = decision.model_info.input_cost_per_million
        + decision.model_info.output_cost_per_million;
    assert!(cheapest < 1.0, "cost priority picked {}", decision.model_id);
}

#[tokio::test]
async fn vision_requirement_filters_candidates() {
    let (router, _, _) = coding_router();
    let ctx = RoutingContext::new(TaskType::Vision, TaskComplexity::Medium).require_vision();

    let decision = router.route(&coding_request(), Some(&ctx)).await.unwrap();
    // deepseek-chat has no vision; only the OpenAI models qualify.
    assert!(decision.model_id.starts_with("gpt-4o"));
    assert_eq!(decision.scores.capability, 1.0);
}

#[tokio::test]
async fn impossible_capability_yields_no_candidates() {
    let (router, _, _) = coding_router();
    let ctx = RoutingContext::new(TaskType::Chat, TaskComplexity::Simple)
        .with_capabilities([Feature::Embedding]);

    let err = router.route(&coding_request(), Some(&ctx)).await.unwrap_err();
    assert!(matches!(err, Error::NoCandidates));
}

#[tokio::test]
async fn budget_caps_are_hard_filters() {
    let (router, _, _) = coding_router();

    // A cap everyone violates leaves no candidates.
    let ctx = RoutingContext::new(TaskType::Chat, TaskComplexity::Simple)
        .with_max_cost(1e-9);
    let err = router.route(&coding_request(), Some(&ctx)).await.unwrap_err();
    assert!(matches!(err, Error::NoCandidates));

    // A cap only gpt-4o violates excludes exactly it, even under quality
    // priority where the cost axis barely weighs.
    let ctx = RoutingContext::new(TaskType::Coding, TaskComplexity::Medium)
        .with_max_cost(0.001)
        .with_priority(RoutingPriority::Quality);
    let decision = router.route(&coding_request(), Some(&ctx)).await.unwrap();
    assert_ne!(decision.model_id, "gpt-4o");
}

#[tokio::test]
async fn excluded_providers_are_skipped() {
    let (router, _, _) = coding_router();
    let ctx = RoutingContext::new(TaskType::Coding, TaskComplexity::Medium)
        .with_excluded_providers(["deepseek".into()]);

    let decision = router.route(&coding_request(), Some(&ctx)).await.unwrap();
    assert_eq!(decision.provider_name, "openai");
}

#[tokio::test]
async fn preferences_raise_the_preference_axis() {
    let (router, _, _) = coding_router();
    let ctx = RoutingContext::new(TaskType::Coding, TaskComplexity::Medium)
        .with_preferred_providers(["deepseek".into()])
        .with_preferred_models(["deepseek-chat".into()]);

    let decision = router.route(&coding_request(), Some(&ctx)).await.unwrap();
    assert_eq!(decision.model_id, "deepseek-chat");
    assert_eq!(decision.scores.preference, 1.0);
}

#[tokio::test]
async fn alternatives_are_ranked_runners_up() {
    let (router, _, _) = coding_router();
    let ctx = RoutingContext::new(TaskType::Coding, TaskComplexity::Medium);

    let decision = router.route(&coding_request(), Some(&ctx)).await.unwrap();
    assert_eq!(decision.alternatives.len(), 2);
    assert!(decision.alternatives[0].score >= decision.alternatives[1].score);
    assert!(decision.score >= decision.alternatives[0].score);
}

#[tokio::test]
async fn auto_classification_kicks_in_without_context() {
    let (router, _, _) = coding_router();
    let decision = router.route(&coding_request(), None).await.unwrap();
    assert!(!decision.model_id.is_empty());
    assert!(decision.score > 0.0);
}

#[tokio::test]
async fn missing_profiles_score_neutral() {
    let unknown = Arc::new(MockProvider::new(
        "unknown",
        vec![model("never-profiled", 1.0, 1.0, &[Feature::Streaming])],
    ));
    let base = Router::new();
    base.register("unknown", unknown);

    let router = SmartRouter::new(base);
    let ctx = RoutingContext::new(TaskType::Coding, TaskComplexity::Expert);

    let decision = router.route(&coding_request(), Some(&ctx)).await.unwrap();
    assert_eq!(decision.model_id, "never-profiled");
    assert_eq!(decision.scores.task, 0.5);
    assert_eq!(decision.scores.complexity, 0.5);
}

#[tokio::test]
async fn complete_with_routing_records_history() {
    let (router, _, _) = coding_router();
    let ctx = RoutingContext::new(TaskType::Coding, TaskComplexity::Medium);

    let (resp, decision) = router
        .complete_with_routing(coding_request(), Some(&ctx))
        .await
        .unwrap();
    assert_eq!(resp.model, decision.model_id);

    let history = router.history();
    assert_eq!(history.len(), 1);
    let record = &history[0];
    assert!(record.success);
    assert_eq!(record.decision.model_id, decision.model_id);
    // usage 100/50 against the profile's per-million pricing.
    assert!(record.actual_cost > 0.0);
    assert_eq!(record.context.task_type, TaskType::Coding);
}

#[tokio::test]
async fn provider_errors_propagate_unmodified() {
    let (router, openai, deepseek) = coding_router();
    openai.set_failing(true);
    deepseek.set_failing(true);

    let ctx = RoutingContext::new(TaskType::Coding, TaskComplexity::Medium);
    let err = router
        .complete_with_routing(coding_request(), Some(&ctx))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Upstream { status: 500, .. }));

    // The failed attempt is still recorded.
    let history = router.history();
    assert_eq!(history.len(), 1);
    assert!(!history[0].success);
}

#[tokio::test]
async fn history_is_trimmed_from_the_front() {
    let (router, _, _) = coding_router();
    let router = router.with_max_history(3);
    let ctx = RoutingContext::new(TaskType::Chat, TaskComplexity::Simple);

    for _ in 0..5 {
        router
            .complete_with_routing(coding_request(), Some(&ctx))
            .await
            .unwrap();
    }

    assert_eq!(router.history().len(), 3);
    assert_eq!(router.stats().total_requests, 3);
}

#[tokio::test]
async fn stream_with_routing_requires_streaming() {
    use futures_util::StreamExt;

    let no_stream = Arc::new(MockProvider::new(
        "nostream",
        vec![model("plain", 0.1, 0.1, &[Feature::Functions])],
    ));
    let streaming = Arc::new(MockProvider::new(
        "streaming",
        vec![model("streamy", 1.0, 1.0, &[Feature::Streaming])],
    ));

    let base = Router::new();
    base.register("nostream", no_stream);
    base.register("streaming", streaming);
    let router = SmartRouter::new(base);

    let ctx = RoutingContext::new(TaskType::Chat, TaskComplexity::Simple);
    let (mut stream, decision) = router
        .stream_with_routing(coding_request(), Some(&ctx))
        .await
        .unwrap();
    assert_eq!(decision.model_id, "streamy");

    let first = stream.next().await.unwrap().unwrap();
    assert!(first.content.is_some());
}

#[tokio::test]
async fn stats_aggregate_usage_and_success() {
    let (router, openai, deepseek) = coding_router();
    let ctx = RoutingContext::new(TaskType::Coding, TaskComplexity::Medium);

    router
        .complete_with_routing(coding_request(), Some(&ctx))
        .await
        .unwrap();
    openai.set_failing(true);
    deepseek.set_failing(true);
    let _ = router
        .complete_with_routing(coding_request(), Some(&ctx))
        .await;

    let stats = router.stats();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.successful_requests, 1);
    let model = stats.model_usage.keys().next().unwrap();
    assert_eq!(stats.model_usage[model], 2);
    assert!((stats.success_rate[model] - 0.5).abs() < 1e-9);
    assert_eq!(stats.task_usage[&TaskType::Coding], 2);
}

#[tokio::test]
async fn registered_profile_overrides_default() {
    use relay_router::ProfileBuilder;

    let (router, _, _) = coding_router();
    router.register_profile(
        ProfileBuilder::new("deepseek-chat", "deepseek")
            .task_scores([(TaskType::Coding, 0.01)])
            .complexity_scores([(TaskComplexity::Medium, 0.01)])
            .latency_ms(9000)
            .cost(0.14, 0.28)
            .build(),
    );

    let ctx = RoutingContext::new(TaskType::Coding, TaskComplexity::Medium);
    let decision = router.route(&coding_request(), Some(&ctx)).await.unwrap();
    assert_ne!(decision.model_id, "deepseek-chat");
}
