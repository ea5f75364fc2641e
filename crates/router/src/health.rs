//! Periodic provider health checking.
//!
//! The checker probes every registered provider on an interval and flips the
//! router's health flags. It is decoupled from selection — the router only
//! reads the flags.

use crate::router::Router;
use relay_core::Message;
use std::time::Duration;
use tokio::{sync::broadcast, task::JoinHandle, time};

/// Upper bound on a single health probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Periodic health checker for a [`Router`].
pub struct HealthChecker {
    router: Router,
    interval: Duration,
    shutdown: broadcast::Sender<()>,
}

impl HealthChecker {
    /// Create a checker probing at the given interval.
    pub fn new(router: Router, interval: Duration) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            router,
            interval,
            shutdown,
        }
    }

    /// Start the probe loop.
    ///
    /// Returns a [`JoinHandle`]. The loop stops when [`stop`](Self::stop) is
    /// called or the handle is aborted.
    pub fn start(&self) -> JoinHandle<()> {
        let router = self.router.clone();
        let interval = self.interval;
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            // The first tick of a tokio interval fires immediately; consume
            // it so probes start one interval after launch.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.recv() => return,
                    _ = ticker.tick() => check_all(&router).await,
                }
            }
        })
    }

    /// Stop the probe loop. Safe to call more than once.
    pub fn stop(&self) {
        let _ = self.shutdown.send(());
    }

    /// Probe every provider once and update the router's health flags.
    pub async fn check_now(&self) {
        check_all(&self.router).await;
    }
}

async fn check_all(router: &Router) {
    for (name, provider) in router.providers() {
        let healthy = probe(provider.as_ref()).await;
        if router.is_healthy(&name) != healthy {
            if healthy {
                tracing::info!("provider '{name}' recovered");
            } else {
                tracing::warn!("provider '{name}' failed its health probe");
            }
        }
        router.set_healthy(&name, healthy);
    }
}

/// A cheap liveness probe: count tokens on a trivial message.
async fn probe(provider: &dyn relay_core::Provider) -> bool {
    let messages = [Message::user("test")];
    matches!(
        time::timeout(PROBE_TIMEOUT, async { provider.count_tokens(&messages) }).await,
        Ok(Ok(_))
    )
}
