//! Application state shared across handlers.

use plinth_store::Store;

/// Shared application state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    store: Store,
}

impl AppState {
    /// Create the state from the data-access layer.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The document-store access layer.
    pub fn store(&self) -> &Store {
        &self.store
    }
}
