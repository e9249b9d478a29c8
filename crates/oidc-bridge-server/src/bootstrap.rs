//! Seeds the in-memory stores from the `[bootstrap]` config tables.

use oidc_bridge_auth::oauth::hash_client_secret;
use oidc_bridge_auth::{AttributeUser, Client};
use oidc_bridge_auth_memory::MemoryStores;
use tracing::info;

use crate::config::{BootstrapClient, BootstrapConfig, BootstrapUser};

/// Inserts every configured client and user. Client secrets are hashed with
/// argon2 before storage.
pub fn seed(stores: &MemoryStores, bootstrap: &BootstrapConfig) -> anyhow::Result<()> {
    for entry in &bootstrap.clients {
        stores.clients.insert(client_from(entry)?);
    }
    for entry in &bootstrap.users {
        stores.users.insert_attributes(user_from(entry));
    }

    if !bootstrap.clients.is_empty() || !bootstrap.users.is_empty() {
        info!(
            clients = bootstrap.clients.len(),
            users = bootstrap.users.len(),
            "Bootstrap records seeded"
        );
    }
    Ok(())
}

fn client_from(entry: &BootstrapClient) -> anyhow::Result<Client> {
    let name = if entry.name.is_empty() {
        entry.client_id.clone()
    } else {
        entry.name.clone()
    };

    let client = match entry.secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) if entry.confidential => {
            let hash = hash_client_secret(secret)
                .map_err(|e| anyhow::anyhow!("hashing secret for {}: {e}", entry.client_id))?;
            Client::confidential(&entry.client_id, name, hash)
        }
        _ => Client::public(&entry.client_id, name),
    };
    Ok(client.with_redirect_uris(entry.redirect_uris.iter().cloned()))
}

fn user_from(entry: &BootstrapUser) -> AttributeUser {
    entry
        .attributes
        .iter()
        .fold(AttributeUser::new(&entry.id), |user, (name, value)| {
            user.with(name.as_str(), value.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oidc_bridge_auth::OidcUser;
    use oidc_bridge_auth::oauth::verify_client_secret;
    use oidc_bridge_auth::storage::{ClientStorage, UserStorage};
    use serde_json::json;

    fn bootstrap() -> BootstrapConfig {
        serde_json::from_value(json!({
            "clients": [
                {
                    "client_id": "backend",
                    "secret": "s3cret",
                    "confidential": true,
                    "redirect_uris": ["https://rp.example.com/"]
                },
                { "client_id": "spa", "name": "Single page app" }
            ],
            "users": [
                { "id": "42", "attributes": { "name": "Ada", "email": "ada@example.com" } }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_seed_hashes_secrets() {
        let stores = MemoryStores::new();
        seed(&stores, &bootstrap()).unwrap();

        let backend = stores
            .clients
            .find_by_client_id("backend")
            .await
            .unwrap()
            .unwrap();
        assert!(backend.confidential);
        assert_eq!(backend.name, "backend");
        assert_eq!(backend.redirect_uris, vec!["https://rp.example.com/"]);
        let hash = backend.secret_hash.unwrap();
        assert_ne!(hash, "s3cret");
        assert!(verify_client_secret("s3cret", &hash).unwrap());

        let spa = stores.clients.find_by_client_id("spa").await.unwrap().unwrap();
        assert!(!spa.confidential);
        assert_eq!(spa.name, "Single page app");
    }

    #[tokio::test]
    async fn test_seed_users() {
        let stores = MemoryStores::new();
        seed(&stores, &bootstrap()).unwrap();

        let user = stores.users.find_by_id("42").await.unwrap().unwrap();
        assert_eq!(user.subject(), "42");
        assert_eq!(user.attribute("email"), Some(json!("ada@example.com")));
    }
}
