//! The shared connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use bson::{Document, doc};
use mongodb::{Client, Collection, Database};
use tracing::debug;

use crate::error::StoreResult;

/// A live link to the document store.
///
/// Wraps the driver client (which pools connections internally) together
/// with the database reference scoped to the configured database name.
/// The driver exposes no connected/disconnected state of its own, so the
/// handle carries a flag that the operations layer flips when a driver
/// error is connection-class; the manager then replaces the handle on the
/// next acquire.
pub struct StoreHandle {
    client: Client,
    database: Database,
    connected: AtomicBool,
}

impl StoreHandle {
    pub(crate) fn new(client: Client, database_name: &str) -> Self {
        let database = client.database(database_name);
        Self {
            client,
            database,
            connected: AtomicBool::new(true),
        }
    }

    /// Resolve a named collection, fresh on every call.
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get the underlying driver client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Whether the handle still considers itself connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Mark the handle disconnected so the manager replaces it.
    pub fn mark_disconnected(&self) {
        debug!("store handle marked disconnected");
        self.connected.store(false, Ordering::Release);
    }

    /// Check server reachability with a ping round trip.
    pub async fn ping(&self) -> StoreResult<()> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
