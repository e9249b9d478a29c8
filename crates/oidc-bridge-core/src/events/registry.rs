//! Hook registry and dispatcher.
//!
//! The registry holds hooks; the dispatcher drains the broadcast channel and
//! hands each event to the registry, which runs every matching hook in an
//! isolated task.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, error, info, warn};

use super::hooks::{HookError, OidcHook};
use super::types::OidcEvent;

/// Default timeout for hook execution.
const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Hook Registry
// ============================================================================

/// Registry of identity event hooks.
pub struct HookRegistry {
    hooks: RwLock<Vec<Arc<dyn OidcHook>>>,
    timeout: Duration,
}

impl HookRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_HOOK_TIMEOUT)
    }

    /// Create a new registry with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
            timeout,
        }
    }

    /// Register a hook.
    pub async fn register(&self, hook: Arc<dyn OidcHook>) {
        let name = hook.name().to_string();
        self.hooks.write().await.push(hook);
        debug!(hook = %name, "Registered OIDC hook");
    }

    /// Get the number of registered hooks.
    pub async fn hook_count(&self) -> usize {
        self.hooks.read().await.len()
    }

    /// Get hooks that match an event.
    pub async fn get_matching_hooks(&self, event: &OidcEvent) -> Vec<Arc<dyn OidcHook>> {
        let hooks = self.hooks.read().await;
        hooks.iter().filter(|h| h.matches(event)).cloned().collect()
    }

    /// Dispatch an event to all matching hooks.
    ///
    /// Each hook runs in its own tokio task under a timeout, with panics
    /// caught. Outcomes are logged; nothing is returned to the caller.
    pub async fn dispatch(&self, event: &OidcEvent) {
        let hooks = self.get_matching_hooks(event).await;

        if hooks.is_empty() {
            debug!(event = %event.event_type(), "No hooks matched event");
            return;
        }

        let timeout = self.timeout;

        for hook in hooks {
            let event = event.clone();

            tokio::spawn(async move {
                let hook_name = hook.name().to_string();

                let result = tokio::time::timeout(timeout, async {
                    AssertUnwindSafe(hook.handle(&event)).catch_unwind().await
                })
                .await;

                match result {
                    Ok(Ok(Ok(()))) => {
                        debug!(hook = %hook_name, "Hook executed successfully");
                    }
                    Ok(Ok(Err(e))) => {
                        warn!(hook = %hook_name, error = %e, "Hook execution failed");
                    }
                    Ok(Err(panic)) => {
                        let panic_msg = if let Some(s) = panic.downcast_ref::<&str>() {
                            s.to_string()
                        } else if let Some(s) = panic.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "Unknown panic".to_string()
                        };
                        error!(hook = %hook_name, panic = %panic_msg, "Hook panicked");
                    }
                    Err(_) => {
                        error!(
                            hook = %hook_name,
                            timeout_secs = timeout.as_secs(),
                            "Hook timed out"
                        );
                    }
                }
            });
        }
    }

    /// Call on_shutdown for all hooks.
    pub async fn on_shutdown(&self) -> Result<(), HookError> {
        let hooks = self.hooks.read().await;
        for hook in hooks.iter() {
            if let Err(e) = hook.on_shutdown().await {
                warn!(hook = %hook.name(), error = %e, "Hook on_shutdown failed");
            }
        }
        Ok(())
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Hook Dispatcher
// ============================================================================

/// Background task forwarding broadcast events to the registry.
pub struct HookDispatcher {
    registry: Arc<HookRegistry>,
}

impl HookDispatcher {
    /// Create a new dispatcher.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// Run the dispatcher until the channel closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<OidcEvent>) {
        info!("Starting OIDC hook dispatcher");

        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.registry.dispatch(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "Dispatcher lagged, missed events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Hook dispatcher channel closed, stopping");
                    break;
                }
            }
        }

        if let Err(e) = self.registry.on_shutdown().await {
            warn!(error = %e, "Error during hook shutdown");
        }
    }

    /// Get the registry.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }
}

impl std::fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookDispatcher")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBroadcaster;
    use crate::events::types::OidcEventType;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHook {
        count: Arc<AtomicUsize>,
        types: Vec<OidcEventType>,
    }

    #[async_trait]
    impl OidcHook for CountingHook {
        fn name(&self) -> &str {
            "counting"
        }

        fn event_types(&self) -> &[OidcEventType] {
            &self.types
        }

        async fn handle(&self, _event: &OidcEvent) -> Result<(), HookError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct PanickingHook;

    #[async_trait]
    impl OidcHook for PanickingHook {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn handle(&self, _event: &OidcEvent) -> Result<(), HookError> {
            panic!("subscriber bug");
        }
    }

    struct SlowHook;

    #[async_trait]
    impl OidcHook for SlowHook {
        fn name(&self) -> &str {
            "slow"
        }

        async fn handle(&self, _event: &OidcEvent) -> Result<(), HookError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_registry_register() {
        let registry = HookRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        registry
            .register(Arc::new(CountingHook {
                count,
                types: vec![],
            }))
            .await;
        assert_eq!(registry.hook_count().await, 1);
    }

    #[tokio::test]
    async fn test_dispatch_respects_event_filter() {
        let registry = HookRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        registry
            .register(Arc::new(CountingHook {
                count: count.clone(),
                types: vec![OidcEventType::TokenIssued],
            }))
            .await;

        registry
            .dispatch(&OidcEvent::logout_initiated(None, None))
            .await;
        registry
            .dispatch(&OidcEvent::token_issued("1", "c", vec![]))
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_hook_does_not_affect_others() {
        let registry = HookRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        registry.register(Arc::new(PanickingHook)).await;
        registry
            .register(Arc::new(CountingHook {
                count: count.clone(),
                types: vec![],
            }))
            .await;

        registry
            .dispatch(&OidcEvent::userinfo_requested("1", vec![]))
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_hook_does_not_block_dispatch() {
        let registry = HookRegistry::with_timeout(Duration::from_millis(20));
        registry.register(Arc::new(SlowHook)).await;

        let started = std::time::Instant::now();
        registry
            .dispatch(&OidcEvent::userinfo_requested("1", vec![]))
            .await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_dispatcher_stops_when_channel_closes() {
        let registry = Arc::new(HookRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));
        registry
            .register(Arc::new(CountingHook {
                count: count.clone(),
                types: vec![],
            }))
            .await;

        let broadcaster = EventBroadcaster::new();
        let handle = tokio::spawn(HookDispatcher::new(registry).run(broadcaster.subscribe()));

        broadcaster.send(OidcEvent::token_issued("1", "c", vec![]));
        drop(broadcaster);

        handle.await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
