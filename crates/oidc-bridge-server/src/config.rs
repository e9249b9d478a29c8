use std::net::{IpAddr, SocketAddr};

use oidc_bridge_auth::OidcConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub oidc: OidcConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn addr(&self) -> SocketAddr {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::from([0, 0, 0, 0]));
        SocketAddr::new(ip, self.server.port)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.shutdown_timeout_ms == 0 {
            return Err("server.shutdown_timeout_ms must be > 0".into());
        }

        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }

        self.oidc
            .validate()
            .map_err(|e| format!("oidc: {e}"))?;

        for (idx, client) in self.bootstrap.clients.iter().enumerate() {
            if client.client_id.trim().is_empty() {
                return Err(format!("bootstrap.clients[{idx}].client_id must not be empty"));
            }
            if client.confidential && client.secret.as_deref().unwrap_or("").is_empty() {
                return Err(format!(
                    "bootstrap.clients[{idx}] is confidential but has no secret"
                ));
            }
        }
        for (idx, user) in self.bootstrap.users.iter().enumerate() {
            if user.id.trim().is_empty() {
                return Err(format!("bootstrap.users[{idx}].id must not be empty"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long in-flight hooks get to finish after the listener stops.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_shutdown_timeout_ms() -> u64 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Clients and users seeded into the in-memory stores at start-up.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub clients: Vec<BootstrapClient>,
    #[serde(default)]
    pub users: Vec<BootstrapUser>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapClient {
    pub client_id: String,
    #[serde(default)]
    pub name: String,
    /// Plain secret; hashed before it reaches the client store.
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,
    #[serde(default)]
    pub confidential: bool,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapUser {
    pub id: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, Value>,
}

pub mod loader {
    use super::AppConfig;
    use anyhow::{Context, anyhow};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "oidc-bridge.toml";

    /// Loads the file at `path` (or the default file) and applies
    /// `OIDC_BRIDGE__...` environment overrides on top.
    pub fn load_config(path: Option<&str>) -> anyhow::Result<AppConfig> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., OIDC_BRIDGE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("OIDC_BRIDGE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder.build().context("config build error")?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .context("config deserialize error")?;
        merged.validate().map_err(|e| anyhow!(e))?;
        Ok(merged)
    }
}
