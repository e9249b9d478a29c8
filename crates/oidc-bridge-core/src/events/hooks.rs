//! Hook trait for reacting to identity events.
//!
//! Hooks run asynchronously in their own tasks. Errors are logged by the
//! dispatcher and never reach the code that published the event.

use async_trait::async_trait;

use super::types::{OidcEvent, OidcEventType};

/// Error type for hook operations.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Hook execution failed with a message.
    #[error("Hook execution failed: {0}")]
    Execution(String),

    /// Hook failed to forward the event to a downstream channel.
    #[error("Channel send failed: {0}")]
    Channel(String),

    /// Generic error with source.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HookError {
    /// Create an execution error from a string.
    pub fn execution(msg: impl Into<String>) -> Self {
        HookError::Execution(msg.into())
    }

    /// Create a channel error from a string.
    pub fn channel(msg: impl Into<String>) -> Self {
        HookError::Channel(msg.into())
    }
}

/// Subscriber for identity events (audit logs, analytics, webhooks).
///
/// # Example
///
/// ```ignore
/// struct AuditHook;
///
/// #[async_trait]
/// impl OidcHook for AuditHook {
///     fn name(&self) -> &str { "audit" }
///
///     async fn handle(&self, event: &OidcEvent) -> Result<(), HookError> {
///         tracing::info!(event = %event.event_type(), "identity event");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait OidcHook: Send + Sync {
    /// Unique name for this hook (for logging).
    fn name(&self) -> &str;

    /// Event types this hook handles.
    ///
    /// Return an empty slice to match every event type.
    fn event_types(&self) -> &[OidcEventType] {
        &[]
    }

    /// Handle an event. Should be quick; push heavy work to a channel.
    async fn handle(&self, event: &OidcEvent) -> Result<(), HookError>;

    /// Called when the dispatcher shuts down.
    async fn on_shutdown(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Check if this hook should handle the given event.
    fn matches(&self, event: &OidcEvent) -> bool {
        let types = self.event_types();
        types.is_empty() || types.contains(&event.event_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LogoutOnly;

    #[async_trait]
    impl OidcHook for LogoutOnly {
        fn name(&self) -> &str {
            "logout_only"
        }

        fn event_types(&self) -> &[OidcEventType] {
            &[OidcEventType::LogoutInitiated]
        }

        async fn handle(&self, _event: &OidcEvent) -> Result<(), HookError> {
            Ok(())
        }
    }

    struct Everything;

    #[async_trait]
    impl OidcHook for Everything {
        fn name(&self) -> &str {
            "everything"
        }

        async fn handle(&self, _event: &OidcEvent) -> Result<(), HookError> {
            Ok(())
        }
    }

    #[test]
    fn test_hook_event_filter() {
        let hook = LogoutOnly;
        assert!(hook.matches(&OidcEvent::logout_initiated(None, None)));
        assert!(!hook.matches(&OidcEvent::userinfo_requested("1", vec![])));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let hook = Everything;
        assert!(hook.matches(&OidcEvent::logout_initiated(None, None)));
        assert!(hook.matches(&OidcEvent::token_issued("1", "c", vec![])));
    }

    #[test]
    fn test_hook_error_display() {
        assert_eq!(
            HookError::execution("boom").to_string(),
            "Hook execution failed: boom"
        );
    }
}
