use std::net::SocketAddr;

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use lemon_auth::{RoutePolicy, RouteTable, middleware::protect};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::{config::AppConfig, handlers, state::AppState};

/// Permission guarding the permission-flag refresh.
pub const REFRESH_PERMISSION: &str = "system.permission.refresh";

/// Route policies of the server. Unlisted routes require authentication.
pub fn routes() -> RouteTable {
    RouteTable::new()
        .any("/healthz", RoutePolicy::public())
        .route(Method::POST, "/admin/auth/login", RoutePolicy::public())
        .route(Method::POST, "/admin/auth/logout", RoutePolicy::required())
        .route(Method::GET, "/admin/auth/permissions", RoutePolicy::required())
        .route(Method::GET, "/admin/auth/user-info", RoutePolicy::required())
        .route(
            Method::POST,
            "/admin/auth/permissions/refresh",
            RoutePolicy::required()
                .permission(REFRESH_PERMISSION)
                .audit("Refresh permissions"),
        )
}

pub fn build_app(state: AppState) -> Router {
    let auth = state.auth.clone();
    let router = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/admin/auth/login", post(handlers::login))
        .route("/admin/auth/logout", post(handlers::logout))
        .route("/admin/auth/permissions", get(handlers::permissions))
        .route(
            "/admin/auth/permissions/refresh",
            post(handlers::refresh_permissions),
        )
        .route("/admin/auth/user-info", get(handlers::user_info));

    protect(router, auth)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .with_state(state)
}

pub struct LemonServer {
    addr: SocketAddr,
    app: Router,
    sweeper: JoinHandle<()>,
}

pub struct ServerBuilder {
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<LemonServer> {
        let (state, sweeper) = crate::state::connect(&self.config).await?;
        Ok(LemonServer {
            addr: self.config.addr(),
            app: build_app(state),
            sweeper,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LemonServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        self.sweeper.abort();
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
