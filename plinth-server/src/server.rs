//! Server assembly: middleware stack, listener and lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{ConnectInfo, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use plinth_config::Config;
use plinth_store::{ConnectionManager, Store};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};
use crate::routes::{HandlerRegistry, build_router};
use crate::state::AppState;

/// Run the server until shutdown.
///
/// Builds the store access layer, mounts the configured route table and
/// serves until ctrl-c or SIGTERM; the shared store handle is released on
/// the way out.
pub async fn run_server(config: Config, registry: HandlerRegistry) -> ServerResult<()> {
    let manager = Arc::new(ConnectionManager::new(config.store.clone()));
    let store = Store::new(manager.clone());

    // Reachability probe. The pool connects lazily, so a down store at
    // startup is logged, not fatal.
    match manager.acquire().await {
        Ok(handle) => {
            if let Err(err) = handle.ping().await {
                warn!("store unreachable at startup: {}", err);
            }
        }
        Err(err) => warn!("store configuration rejected: {}", err),
    }

    let state = AppState::new(store);
    let app = assemble(&config, &registry, state)?;

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .map_err(|e| ServerError::BadRequest(format!("invalid bind address: {}", e)))?;

    info!("listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    manager.release();
    info!("server shutdown complete");
    Ok(())
}

/// Assemble the router with the middleware stack and static fallback.
fn assemble(config: &Config, registry: &HandlerRegistry, state: AppState) -> ServerResult<Router> {
    let middleware = ServiceBuilder::new()
        .layer(middleware::from_fn(access_log))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let mut router = build_router(&config.server, registry, state)?;

    if let Some(ref dir) = config.server.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    Ok(router.layer(middleware))
}

/// Access log: remote address and requested URI, one line per request.
async fn access_log(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    info!(remote = %addr.ip(), method = %req.method(), uri = %req.uri(), "request");
    next.run(req).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("ctrl-c received"),
        _ = terminate => info!("SIGTERM received"),
    }
}
