//! Document conversion helpers.
//!
//! Documents are schemaless [`bson::Document`] values; no shape invariant
//! is imposed here. Callers that want typed records convert at their own
//! boundary with these helpers.

use bson::{Document, oid::ObjectId};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{StoreError, StoreResult};

/// Extension trait for BSON documents.
pub trait DocumentExt {
    /// The store identity field (`_id`) as an ObjectId.
    fn id(&self) -> StoreResult<ObjectId>;

    /// Deserialize into a typed struct.
    fn to_struct<T: DeserializeOwned>(&self) -> StoreResult<T>;
}

impl DocumentExt for Document {
    fn id(&self) -> StoreResult<ObjectId> {
        self.get_object_id("_id")
            .map_err(|_| StoreError::serialization("field '_id' is not an ObjectId"))
    }

    fn to_struct<T: DeserializeOwned>(&self) -> StoreResult<T> {
        bson::from_document(self.clone()).map_err(StoreError::from)
    }
}

/// Serialize a struct into a BSON document.
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    bson::to_document(value).map_err(StoreError::from)
}

/// Deserialize a BSON document into a struct.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    bson::from_document(doc).map_err(StoreError::from)
}
