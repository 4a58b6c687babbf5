//! Handler registry and router construction from the route table.
//!
//! Routes are declared in configuration as (method, path, handler-name)
//! triples; handler names resolve against a [`HandlerRegistry`] populated
//! at startup. An entry naming an unregistered handler fails router
//! construction, not the first request.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use plinth_config::{RouteMethod, ServerConfig};
use serde_json::json;
use tracing::info;

use crate::error::{ServerError, ServerResult};
use crate::params::Params;
use crate::state::AppState;

type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A registered request handler.
pub type Handler = Arc<dyn Fn(AppState, Params) -> HandlerFuture + Send + Sync>;

/// Maps handler names from the route table to handler functions.
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    /// Create a registry with the built-in `health` handler.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };
        registry.register("health", health);
        registry
    }

    /// Register a handler under a name the route table can reference.
    /// Re-registering a name replaces the previous handler.
    pub fn register<F, Fut, R>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(AppState, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let handler = Arc::new(handler);
        let erased: Handler = Arc::new(move |state, params| {
            let handler = handler.clone();
            Box::pin(async move { handler(state, params).await.into_response() })
        });
        self.handlers.insert(name.into(), erased);
    }

    /// Look up a handler by name.
    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }

    /// Names of all registered handlers.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the router from the configured route table.
pub fn build_router(
    config: &ServerConfig,
    registry: &HandlerRegistry,
    state: AppState,
) -> ServerResult<Router> {
    let mut router = Router::new();

    for route in &config.routes {
        let handler = registry
            .get(&route.handler)
            .ok_or_else(|| ServerError::UnknownHandler(route.handler.clone()))?;

        let state = state.clone();
        let endpoint = move |params: Params| {
            let handler = handler.clone();
            let state = state.clone();
            async move { handler(state, params).await }
        };

        let method_router = match route.method {
            RouteMethod::Get => get(endpoint),
            RouteMethod::Post => post(endpoint),
        };

        info!(method = ?route.method, path = %route.path, handler = %route.handler, "route mounted");
        router = router.route(&route.path, method_router);
    }

    Ok(router)
}

/// Built-in liveness endpoint.
async fn health(_state: AppState, _params: Params) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
