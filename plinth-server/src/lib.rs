//! HTTP scaffold for Plinth.
//!
//! Dispatches requests to named handler functions according to the
//! configured route table, hands each handler a uniform [`Params`] shape
//! (GET query or POST body) and the shared [`AppState`] carrying the
//! document-store access layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use plinth_config::Config;
//! use plinth_server::{HandlerRegistry, Params, run_server};
//! use plinth_server::state::AppState;
//! use axum::Json;
//!
//! async fn list_users(state: AppState, _params: Params) -> Json<serde_json::Value> {
//!     // call state.store() data-access operations here
//!     Json(serde_json::json!([]))
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("plinth.toml".as_ref())?;
//!     let mut registry = HandlerRegistry::new();
//!     registry.register("list_users", list_users);
//!     run_server(config, registry).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod params;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ServerError, ServerResult};
pub use params::Params;
pub use routes::{HandlerRegistry, build_router};
pub use server::run_server;
pub use state::AppState;

use tracing_subscriber::EnvFilter;

/// Initialize process logging from the configured level. Falls back to
/// `info` when the filter does not parse.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
