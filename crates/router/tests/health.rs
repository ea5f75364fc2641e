//! Tests for the health checker.

mod common;

use common::{model, MockProvider};
use relay_core::Feature;
use relay_router::{HealthChecker, Router};
use std::sync::Arc;
use std::time::Duration;

fn router_with(provider: Arc<MockProvider>) -> Router {
    let router = Router::new().with_health_check(true);
    router.register("mock", provider);
    router
}

#[tokio::test]
async fn probe_marks_failing_provider_unhealthy() {
    let provider = Arc::new(MockProvider::new(
        "mock",
        vec![model("m", 1.0, 1.0, &[Feature::Streaming])],
    ));
    let router = router_with(provider.clone());
    assert!(router.is_healthy("mock"));

    provider.set_failing(true);
    let checker = HealthChecker::new(router.clone(), Duration::from_secs(60));
    checker.check_now().await;
    assert!(!router.is_healthy("mock"));

    provider.set_failing(false);
    checker.check_now().await;
    assert!(router.is_healthy("mock"));
}

#[tokio::test]
async fn periodic_loop_updates_health() {
    let provider = Arc::new(MockProvider::new(
        "mock",
        vec![model("m", 1.0, 1.0, &[Feature::Streaming])],
    ));
    provider.set_failing(true);

    let router = router_with(provider.clone());
    let checker = HealthChecker::new(router.clone(), Duration::from_millis(20));
    let handle = checker.start();

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(!router.is_healthy("mock"));

    checker.stop();
    handle.await.unwrap();
}

#[tokio::test]
async fn stop_is_idempotent() {
    let router = Router::new();
    let checker = HealthChecker::new(router, Duration::from_millis(10));
    let handle = checker.start();

    checker.stop();
    checker.stop();
    handle.await.unwrap();
}
