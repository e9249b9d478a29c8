//! Audit hook: writes every identity event to the log.

use async_trait::async_trait;
use oidc_bridge_core::{HookError, OidcEvent, OidcHook};

pub struct AuditHook;

#[async_trait]
impl OidcHook for AuditHook {
    fn name(&self) -> &str {
        "audit"
    }

    async fn handle(&self, event: &OidcEvent) -> Result<(), HookError> {
        tracing::info!(
            target: "oidc_bridge::audit",
            event = %event.event_type(),
            user_id = event.user_id().unwrap_or("-"),
            client_id = event.client_id().unwrap_or("-"),
            at = %event.timestamp(),
            "identity event"
        );
        Ok(())
    }
}
