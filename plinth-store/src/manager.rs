//! Connection manager owning the shared store handle.

use std::sync::Arc;

use mongodb::Client;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::handle::StoreHandle;

/// Owns the single shared [`StoreHandle`], created lazily on first use and
/// reused for the lifetime of the process.
///
/// Constructed once at startup and passed by reference to every
/// data-access call. Concurrent callers observing no handle may race to
/// create one; the race is not serialized — the last successful connect
/// wins as the shared handle, and in-flight operations complete against
/// whichever handle they captured. At worst a redundant connect occurs.
pub struct ConnectionManager {
    config: StoreConfig,
    handle: RwLock<Option<Arc<StoreHandle>>>,
}

impl ConnectionManager {
    /// Create a manager. No connection is made until the first
    /// [`acquire`](Self::acquire).
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            handle: RwLock::new(None),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get the shared handle, connecting if none exists or the existing
    /// one reports itself disconnected.
    pub async fn acquire(&self) -> StoreResult<Arc<StoreHandle>> {
        if let Some(handle) = self.current() {
            if handle.is_connected() {
                return Ok(handle);
            }
        }
        self.connect().await
    }

    /// Close the shared handle if one exists. Idempotent; used at process
    /// shutdown. The driver tears its pool down when the last clone of the
    /// client is dropped.
    pub fn release(&self) {
        if let Some(handle) = self.handle.write().take() {
            handle.mark_disconnected();
            info!("store handle released");
        }
    }

    fn current(&self) -> Option<Arc<StoreHandle>> {
        self.handle.read().clone()
    }

    async fn connect(&self) -> StoreResult<Arc<StoreHandle>> {
        debug!(uri = %self.config.connection_uri(), "connecting to store");

        let options = self.config.to_client_options().await?;
        let client = Client::with_options(options)
            .map_err(|e| StoreError::connection(format!("failed to create client: {}", e)))?;

        let handle = Arc::new(StoreHandle::new(client, &self.config.database));

        // Last successful connect wins as the shared handle.
        *self.handle.write() = Some(handle.clone());

        info!(
            database = %self.config.database,
            pool_size = self.config.pool_size,
            "store client created"
        );

        Ok(handle)
    }
}
