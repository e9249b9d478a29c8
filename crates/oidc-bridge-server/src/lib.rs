pub mod audit;
pub mod bootstrap;
pub mod config;
pub mod observability;
pub mod server;

pub use config::{AppConfig, BootstrapConfig, LoggingConfig, ServerConfig};
pub use observability::init_tracing;
pub use server::{OidcBridgeServer, ServerBuilder, build_app};
