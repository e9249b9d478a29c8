//! RP-initiated logout.
//!
//! Logout never fails from the caller's point of view: a malformed hint, an
//! unknown client, a rejected redirect or a broken session store all end in
//! a redirect, at worst to the application root.

use std::sync::Arc;

use oidc_bridge_core::{EventBroadcaster, OidcEvent};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use url::{Url, form_urlencoded};

use super::redirect::{PostLogoutRedirectValidator, append_state};
use crate::storage::{ClientStorage, SessionStorage};
use crate::token::jwt::decode_unverified;
use crate::types::{Client, Session};

/// Where logout lands when no requested redirect is acceptable.
pub const LOGOUT_FALLBACK_REDIRECT: &str = "/";

/// Logout query parameters.
#[derive(Debug, Clone, Default)]
pub struct LogoutRequest {
    pub post_logout_redirect_uri: Option<String>,
    pub id_token_hint: Option<String>,
    pub state: Option<String>,
}

impl LogoutRequest {
    /// Parses a raw query string. Repeated parameters keep their last value
    /// and unknown ones are ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut request = Self::default();
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match name.as_ref() {
                "post_logout_redirect_uri" => &mut request.post_logout_redirect_uri,
                "id_token_hint" => &mut request.id_token_hint,
                "state" => &mut request.state,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        request
    }
}

/// Result of a logout.
#[derive(Debug, Clone)]
pub struct LogoutOutcome {
    /// Redirect target.
    pub redirect_to: String,
    /// The fresh anonymous session, `None` if the session store failed.
    pub session: Option<Session>,
}

/// Ends the current session and picks the redirect target.
#[derive(Clone)]
pub struct LogoutService {
    clients: Arc<dyn ClientStorage>,
    sessions: Arc<dyn SessionStorage>,
    validator: PostLogoutRedirectValidator,
    app_url: String,
    events: Option<Arc<EventBroadcaster>>,
}

impl LogoutService {
    /// `app_url` is the allow-list used when the hint names no client.
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientStorage>,
        sessions: Arc<dyn SessionStorage>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            clients,
            sessions,
            validator: PostLogoutRedirectValidator::new(),
            app_url: app_url.into(),
            events: None,
        }
    }

    /// Publishes [`OidcEvent::LogoutInitiated`] on every logout.
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventBroadcaster>) -> Self {
        self.events = Some(events);
        self
    }

    #[instrument(skip_all)]
    pub async fn logout(&self, session_id: Option<&str>, request: &LogoutRequest) -> LogoutOutcome {
        let client = match non_empty(request.id_token_hint.as_deref()) {
            Some(hint) => self.client_from_hint(hint).await,
            None => None,
        };

        let user_id = match session_id {
            Some(id) => self
                .sessions
                .find(id)
                .await
                .inspect_err(|e| warn!(error = %e, "Session lookup failed during logout"))
                .ok()
                .flatten()
                .and_then(|s| s.user_id),
            None => None,
        };

        if let Some(events) = &self.events {
            events.send(OidcEvent::logout_initiated(
                user_id,
                client.as_ref().map(|c| c.client_id.clone()),
            ));
        }

        let session = self
            .sessions
            .regenerate(session_id)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to invalidate session during logout"))
            .ok();

        LogoutOutcome {
            redirect_to: self.redirect_target(client.as_ref(), request),
            session,
        }
    }

    fn redirect_target(&self, client: Option<&Client>, request: &LogoutRequest) -> String {
        let Some(requested) = non_empty(request.post_logout_redirect_uri.as_deref()) else {
            return LOGOUT_FALLBACK_REDIRECT.to_string();
        };

        let allowed = match client {
            Some(client) => self.validator.is_allowed(requested, &client.redirect_uris),
            None => self.validator.is_allowed(requested, &[self.app_url.as_str()]),
        };
        if !allowed {
            debug!(
                client_id = client.map(|c| c.client_id.as_str()),
                "Post-logout redirect URI not allowed"
            );
            return LOGOUT_FALLBACK_REDIRECT.to_string();
        }

        // Redirect to the parsed form that passed validation, never the raw input.
        match non_empty(request.state.as_deref()) {
            Some(state) => append_state(requested, state),
            None => Url::parse(requested)
                .map_or_else(|_| LOGOUT_FALLBACK_REDIRECT.to_string(), String::from),
        }
    }

    async fn client_from_hint(&self, hint: &str) -> Option<Client> {
        let claims = decode_unverified::<Value>(hint)
            .inspect_err(|e| debug!(error = %e, "Ignoring unparseable id_token_hint"))
            .ok()?;

        let audience = match claims.get("aud")? {
            Value::String(aud) => aud.clone(),
            Value::Array(values) => values.first()?.as_str()?.to_string(),
            _ => return None,
        };

        self.clients
            .find_by_client_id(&audience)
            .await
            .inspect_err(|e| warn!(error = %e, "Client lookup failed during logout"))
            .ok()
            .flatten()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    use crate::AuthResult;
    use crate::error::AuthError;

    struct Clients;

    #[async_trait]
    impl ClientStorage for Clients {
        async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
            Ok((client_id == "web").then(|| {
                Client::public("web", "Web").with_redirect_uris(["https://rp.example.org/bye"])
            }))
        }
    }

    #[derive(Default)]
    struct Sessions {
        live: Mutex<HashMap<String, Session>>,
    }

    #[async_trait]
    impl SessionStorage for Sessions {
        async fn find(&self, session_id: &str) -> AuthResult<Option<Session>> {
            Ok(self.live.lock().unwrap().get(session_id).cloned())
        }

        async fn regenerate(&self, session_id: Option<&str>) -> AuthResult<Session> {
            let mut live = self.live.lock().unwrap();
            if let Some(id) = session_id {
                live.remove(id);
            }
            let session = Session::new(None);
            live.insert(session.id.clone(), session.clone());
            Ok(session)
        }
    }

    struct BrokenSessions;

    #[async_trait]
    impl SessionStorage for BrokenSessions {
        async fn find(&self, _session_id: &str) -> AuthResult<Option<Session>> {
            Err(AuthError::storage("down"))
        }

        async fn regenerate(&self, _session_id: Option<&str>) -> AuthResult<Session> {
            Err(AuthError::storage("down"))
        }
    }

    fn hint(aud: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": "42", "aud": aud }).to_string());
        format!("{header}.{payload}.c2ln")
    }

    fn request(uri: Option<&str>, hint: Option<String>, state: Option<&str>) -> LogoutRequest {
        LogoutRequest {
            post_logout_redirect_uri: uri.map(str::to_string),
            id_token_hint: hint,
            state: state.map(str::to_string),
        }
    }

    fn service(sessions: Arc<dyn SessionStorage>) -> LogoutService {
        LogoutService::new(Arc::new(Clients), sessions, "https://example.com")
    }

    #[tokio::test]
    async fn test_redirect_to_app_url_without_hint() {
        let outcome = service(Arc::new(Sessions::default()))
            .logout(None, &request(Some("https://example.com/x"), None, Some("abc")))
            .await;
        assert_eq!(outcome.redirect_to, "https://example.com/x?state=abc");
    }

    #[tokio::test]
    async fn test_redirect_to_client_uri_from_hint() {
        let service = service(Arc::new(Sessions::default()));

        for aud in [json!("web"), json!(["web", "other"])] {
            let outcome = service
                .logout(None, &request(Some("https://rp.example.org/bye"), Some(hint(aud)), None))
                .await;
            assert_eq!(outcome.redirect_to, "https://rp.example.org/bye");
        }
    }

    #[tokio::test]
    async fn test_client_allow_list_replaces_app_url() {
        let outcome = service(Arc::new(Sessions::default()))
            .logout(None, &request(Some("https://example.com/x"), Some(hint(json!("web"))), None))
            .await;
        assert_eq!(outcome.redirect_to, LOGOUT_FALLBACK_REDIRECT);
    }

    #[tokio::test]
    async fn test_rejected_or_missing_redirect_goes_to_root() {
        let service = service(Arc::new(Sessions::default()));
        for req in [
            request(Some("https://evil.com"), None, Some("abc")),
            request(Some("https://example.com.evil.com/x"), None, None),
            request(None, None, Some("abc")),
            request(Some(""), None, None),
        ] {
            let outcome = service.logout(None, &req).await;
            assert_eq!(outcome.redirect_to, LOGOUT_FALLBACK_REDIRECT);
        }
    }

    #[tokio::test]
    async fn test_malformed_hint_is_ignored() {
        let outcome = service(Arc::new(Sessions::default()))
            .logout(None, &request(Some("https://example.com/x"), Some("a.b.c".to_string()), None))
            .await;
        assert_eq!(outcome.redirect_to, "https://example.com/x");
    }

    #[test]
    fn test_from_query_keeps_last_value() {
        let request = LogoutRequest::from_query(
            "state=a&post_logout_redirect_uri=https%3A%2F%2Fexample.com%2Fx&state=b&extra=1",
        );
        assert_eq!(request.state.as_deref(), Some("b"));
        assert_eq!(request.post_logout_redirect_uri.as_deref(), Some("https://example.com/x"));
        assert!(request.id_token_hint.is_none());

        let empty = LogoutRequest::from_query("");
        assert!(empty.state.is_none() && empty.post_logout_redirect_uri.is_none());
    }

    #[tokio::test]
    async fn test_redirect_uses_normalized_uri() {
        let service = service(Arc::new(Sessions::default()));
        for raw in ["https://example.com/x\n", "https://exa\tmple.com/x", " https://example.com/x"] {
            let outcome = service.logout(None, &request(Some(raw), None, None)).await;
            assert_eq!(outcome.redirect_to, "https://example.com/x");
        }
    }

    #[tokio::test]
    async fn test_session_is_rotated_and_event_carries_user() {
        let sessions = Arc::new(Sessions::default());
        let old = Session::new(Some("42".to_string()));
        sessions.live.lock().unwrap().insert(old.id.clone(), old.clone());

        let events = EventBroadcaster::new_shared();
        let mut receiver = events.subscribe();
        let service = service(sessions.clone()).with_events(events);

        let outcome = service
            .logout(Some(&old.id), &request(None, Some(hint(json!("web"))), None))
            .await;

        let fresh = outcome.session.unwrap();
        assert_ne!(fresh.id, old.id);
        assert_ne!(fresh.csrf_token, old.csrf_token);
        assert!(fresh.user_id.is_none());
        assert!(!sessions.live.lock().unwrap().contains_key(&old.id));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.user_id(), Some("42"));
        assert_eq!(event.client_id(), Some("web"));
    }

    #[tokio::test]
    async fn test_broken_session_store_still_redirects() {
        let outcome = service(Arc::new(BrokenSessions))
            .logout(Some("sid"), &request(Some("https://example.com/x"), None, None))
            .await;
        assert!(outcome.session.is_none());
        assert_eq!(outcome.redirect_to, "https://example.com/x");
    }
}
