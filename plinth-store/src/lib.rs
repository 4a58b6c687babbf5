//! # plinth-store
//!
//! Document-store access layer for the Plinth scaffold.
//!
//! This crate provides:
//! - A connection manager owning one lazily-created, shared client handle
//! - Ten CRUD-style operations with uniform timeout and
//!   success-verification semantics
//! - Document conversion utilities via BSON
//!
//! ## Example
//!
//! ```rust,ignore
//! use plinth_store::{ConnectionManager, ReadCriteria, Store, StoreConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::builder()
//!         .host("localhost")
//!         .port(27017)
//!         .database("mydb")
//!         .build()?;
//!
//!     let store = Store::new(Arc::new(ConnectionManager::new(config)));
//!
//!     // Insert a document; the store-assigned _id comes back filled in
//!     let doc = store
//!         .insert_one("users", bson::doc! { "name": "Alice", "age": 30 })
//!         .await?;
//!
//!     let found = store
//!         .find_one("users", bson::doc! { "age": 30 }, ReadCriteria::default())
//!         .await?;
//!     assert_eq!(found.as_ref(), Some(&doc));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Documents
//!
//! Documents are schemaless [`bson::Document`] values. Callers that want a
//! typed boundary convert at the edge:
//!
//! ```rust,ignore
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: i32,
//! }
//!
//! let doc = plinth_store::document::to_document(&user)?;
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod handle;
pub mod manager;
pub mod ops;

pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{StoreError, StoreResult};
pub use handle::StoreHandle;
pub use manager::ConnectionManager;
pub use ops::{ReadCriteria, Store};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{StoreConfig, StoreConfigBuilder};
    pub use crate::document::DocumentExt;
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::handle::StoreHandle;
    pub use crate::manager::ConnectionManager;
    pub use crate::ops::{ReadCriteria, Store};
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
}
