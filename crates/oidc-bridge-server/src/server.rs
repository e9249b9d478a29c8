use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, header};
use oidc_bridge_auth::{KeyMaterial, OidcRoutes, OidcState, RouteMiddleware};
use oidc_bridge_auth_memory::MemoryStores;
use oidc_bridge_core::{EventBroadcaster, HookDispatcher, HookRegistry};
use tokio::task::JoinHandle;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{audit::AuditHook, bootstrap, config::AppConfig};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

pub struct OidcBridgeServer {
    addr: SocketAddr,
    app: Router,
    stores: MemoryStores,
    dispatcher: JoinHandle<()>,
    shutdown_timeout: Duration,
}

/// Builds the OIDC router over `stores`, seeding them from the bootstrap
/// config and starting the hook dispatcher.
pub async fn build_app(
    cfg: &AppConfig,
    stores: &MemoryStores,
    keys: KeyMaterial,
) -> anyhow::Result<Router> {
    let (app, _dispatcher) = assemble(cfg, stores, keys).await?;
    Ok(app)
}

async fn assemble(
    cfg: &AppConfig,
    stores: &MemoryStores,
    keys: KeyMaterial,
) -> anyhow::Result<(Router, JoinHandle<()>)> {
    bootstrap::seed(stores, &cfg.bootstrap)?;

    let events = EventBroadcaster::new_shared();
    let registry = Arc::new(HookRegistry::new());
    registry.register(Arc::new(AuditHook)).await;
    let dispatcher = tokio::spawn(HookDispatcher::new(registry).run(events.subscribe()));

    let state = OidcState::new(cfg.oidc.clone(), stores.oidc_stores(), keys, events)?;
    Ok((routes(state), dispatcher))
}

fn routes(state: OidcState) -> Router {
    let routes_cfg = state.config.routes.clone();
    if !routes_cfg.enabled {
        tracing::warn!("OIDC routes are disabled");
        return Router::new();
    }

    let groups = OidcRoutes::new(state);
    with_middleware(groups.discovery, &routes_cfg.discovery_middleware)
        .merge(with_middleware(groups.token, &routes_cfg.token_middleware))
        .merge(with_middleware(
            groups.userinfo,
            &routes_cfg.userinfo_middleware,
        ))
}

/// Layers a route group with its configured middleware, in list order.
fn with_middleware(router: Router, middleware: &[RouteMiddleware]) -> Router {
    middleware.iter().fold(router, |router, mw| match mw {
        RouteMiddleware::Trace => router.layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = tracing::field::Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        ),
        RouteMiddleware::Cors => router.layer(CorsLayer::permissive()),
        RouteMiddleware::Compression => router.layer(CompressionLayer::new()),
        RouteMiddleware::NoStore => router.layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        )),
    })
}

pub struct ServerBuilder {
    config: AppConfig,
    stores: MemoryStores,
    keys: Option<KeyMaterial>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            stores: MemoryStores::new(),
            keys: None,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    pub fn with_stores(mut self, stores: MemoryStores) -> Self {
        self.stores = stores;
        self
    }

    /// Uses `keys` instead of reading `oidc.keys` from disk.
    pub fn with_keys(mut self, keys: KeyMaterial) -> Self {
        self.keys = Some(keys);
        self
    }

    pub async fn build(self) -> anyhow::Result<OidcBridgeServer> {
        let keys = self
            .keys
            .unwrap_or_else(|| KeyMaterial::load(&self.config.oidc.keys));
        let (app, dispatcher) = assemble(&self.config, &self.stores, keys).await?;

        Ok(OidcBridgeServer {
            addr: self.config.addr(),
            app,
            stores: self.stores,
            dispatcher,
            shutdown_timeout: Duration::from_millis(self.config.server.shutdown_timeout_ms),
        })
    }
}

impl OidcBridgeServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);

        let tokens = self.stores.tokens.clone();
        let purger = tokio::spawn(async move {
            let mut interval = tokio::time::interval(PURGE_INTERVAL);
            loop {
                interval.tick().await;
                let purged = tokens.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Expired tokens purged");
                }
            }
        });

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        purger.abort();

        // The router held the last event sender; the dispatcher now drains and stops.
        if tokio::time::timeout(self.shutdown_timeout, self.dispatcher)
            .await
            .is_err()
        {
            tracing::warn!("hook dispatcher did not stop in time");
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
