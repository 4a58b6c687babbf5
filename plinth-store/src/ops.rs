//! Data-access operations over the shared connection.
//!
//! Every operation follows the same shape: acquire the shared handle,
//! resolve the named collection, execute one store command with a
//! normalized option set, verify the success signal and return a
//! normalized result. Errors are logged once at this boundary and
//! propagated as typed [`StoreError`]s; nothing is swallowed and nothing
//! is retried.
//!
//! Reads carry the configured server-side execution bound (`max_time`);
//! writes carry a journaled write concern with the same bound as the
//! write timeout. Both are request-scoped, never connection-scoped.

use std::sync::Arc;

use bson::{Bson, Document};
use mongodb::Cursor;
use mongodb::error::ErrorKind;
use mongodb::options::{
    DeleteOptions, FindOneAndUpdateOptions, FindOneOptions, FindOptions, InsertManyOptions,
    InsertOneOptions, ReturnDocument, UpdateOptions,
};
use tracing::{debug, error};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::handle::StoreHandle;
use crate::manager::ConnectionManager;

/// Per-call read options. The default matches everything, returns all
/// fields in natural order and is unbounded.
#[derive(Debug, Clone, Default)]
pub struct ReadCriteria {
    /// Field projection.
    pub projection: Option<Document>,
    /// Sort order.
    pub sort: Option<Document>,
    /// Number of documents to skip.
    pub skip: u64,
    /// Maximum number of documents to return; 0 means unbounded.
    pub limit: i64,
}

/// The data-access operations, built on top of a [`ConnectionManager`].
///
/// Stateless aside from the shared connection; cheap to clone.
#[derive(Clone)]
pub struct Store {
    manager: Arc<ConnectionManager>,
}

impl Store {
    /// Create a store over the given connection manager.
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    /// Get the connection manager.
    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    fn config(&self) -> &StoreConfig {
        self.manager.config()
    }

    /// Find the first document matching `query`. Absence of a match is a
    /// valid, non-error outcome.
    pub async fn find_one(
        &self,
        collection: &str,
        query: Document,
        criteria: ReadCriteria,
    ) -> StoreResult<Option<Document>> {
        debug!(collection, "enter find_one");

        let handle = self.manager.acquire().await?;
        let options = self.find_one_options(criteria);

        handle
            .collection(collection)
            .find_one(query, options)
            .await
            .map_err(|e| self.driver_failure("find_one", collection, &handle, e))
    }

    /// Find all documents matching `query` as a lazy cursor, bounded by
    /// `criteria.limit` (0 = unbounded).
    pub async fn find_many(
        &self,
        collection: &str,
        query: Document,
        criteria: ReadCriteria,
    ) -> StoreResult<Cursor<Document>> {
        debug!(collection, "enter find_many");

        let handle = self.manager.acquire().await?;
        let options = self.find_options(criteria);

        handle
            .collection(collection)
            .find(query, options)
            .await
            .map_err(|e| self.driver_failure("find_many", collection, &handle, e))
    }

    /// Insert a single document. Succeeds only when the store acknowledges
    /// the write and reports exactly one inserted id; returns the document
    /// with the store-assigned `_id` filled in.
    pub async fn insert_one(&self, collection: &str, mut doc: Document) -> StoreResult<Document> {
        debug!(collection, "enter insert_one");

        let handle = self.manager.acquire().await?;
        let mut options = InsertOneOptions::default();
        options.write_concern = Some(self.config().write_concern());

        let result = handle
            .collection(collection)
            .insert_one(&doc, options)
            .await
            .map_err(|e| self.driver_failure("insert_one", collection, &handle, e))?;

        if matches!(result.inserted_id, Bson::Null) {
            return Err(self.verification_failure(
                "insert_one",
                collection,
                StoreError::insert("store reported no inserted id"),
            ));
        }

        if !doc.contains_key("_id") {
            doc.insert("_id", result.inserted_id);
        }
        Ok(doc)
    }

    /// Insert a sequence of documents. Fails as a whole with an insert
    /// error unless the store reports an inserted count equal to the input
    /// count; never returns a partial list.
    pub async fn insert_many(
        &self,
        collection: &str,
        mut docs: Vec<Document>,
    ) -> StoreResult<Vec<Document>> {
        debug!(collection, count = docs.len(), "enter insert_many");

        let handle = self.manager.acquire().await?;
        let mut options = InsertManyOptions::default();
        options.write_concern = Some(self.config().write_concern());

        let result = handle
            .collection(collection)
            .insert_many(&docs, options)
            .await
            .map_err(|e| self.driver_failure("insert_many", collection, &handle, e))?;

        if let Err(err) = verify_inserted(docs.len(), result.inserted_ids.len()) {
            return Err(self.verification_failure("insert_many", collection, err));
        }

        for (index, id) in result.inserted_ids {
            if let Some(doc) = docs.get_mut(index) {
                if !doc.contains_key("_id") {
                    doc.insert("_id", id);
                }
            }
        }
        Ok(docs)
    }

    /// Delete the first document matching `filter`. A count of 0 is a
    /// valid, non-failing outcome.
    pub async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        debug!(collection, "enter delete_one");

        let handle = self.manager.acquire().await?;
        let mut options = DeleteOptions::default();
        options.write_concern = Some(self.config().write_concern());

        let result = handle
            .collection(collection)
            .delete_one(filter, options)
            .await
            .map_err(|e| self.driver_failure("delete_one", collection, &handle, e))?;

        Ok(result.deleted_count)
    }

    /// Delete all documents matching `filter`, returning the count.
    pub async fn delete_many(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        debug!(collection, "enter delete_many");

        let handle = self.manager.acquire().await?;
        let mut options = DeleteOptions::default();
        options.write_concern = Some(self.config().write_concern());

        let result = handle
            .collection(collection)
            .delete_many(filter, options)
            .await
            .map_err(|e| self.driver_failure("delete_many", collection, &handle, e))?;

        Ok(result.deleted_count)
    }

    /// Drop a collection. A drop the server refuses (e.g. the namespace
    /// does not exist) is a [`StoreError::Drop`]; transport faults pass
    /// through as driver errors.
    pub async fn drop_collection(&self, collection: &str) -> StoreResult<()> {
        debug!(collection, "enter drop_collection");

        let handle = self.manager.acquire().await?;

        handle
            .collection(collection)
            .drop(None)
            .await
            .map_err(|e| match &*e.kind {
                ErrorKind::Command(_) => self.verification_failure(
                    "drop_collection",
                    collection,
                    StoreError::drop_collection(e.to_string()),
                ),
                _ => self.driver_failure("drop_collection", collection, &handle, e),
            })
    }

    /// Atomically update (or, when nothing matches, upsert) the first
    /// document matching `filter` and return its post-update state. Upsert
    /// is always enabled.
    pub async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        sort: Option<Document>,
    ) -> StoreResult<Document> {
        debug!(collection, "enter find_one_and_update");

        let handle = self.manager.acquire().await?;
        let options = self.find_one_and_update_options(sort);

        let updated = handle
            .collection(collection)
            .find_one_and_update(filter, update, options)
            .await
            .map_err(|e| self.driver_failure("find_one_and_update", collection, &handle, e))?;

        updated.ok_or_else(|| {
            self.verification_failure(
                "find_one_and_update",
                collection,
                StoreError::update("store returned no post-update document"),
            )
        })
    }

    /// Update at most the first document matching `filter`. The caller's
    /// options are kept; the configured write timeout is merged in. Returns
    /// the id of an upserted document, absent when an existing document was
    /// modified instead.
    pub async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<Option<Bson>> {
        debug!(collection, "enter update_one");

        let handle = self.manager.acquire().await?;
        let options = self.merge_write_timeout(options);

        let result = handle
            .collection(collection)
            .update_one(filter, update, options)
            .await
            .map_err(|e| self.driver_failure("update_one", collection, &handle, e))?;

        Ok(result.upserted_id)
    }

    /// Update all documents matching `filter`, with the same option
    /// merging as [`update_one`](Self::update_one).
    pub async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<Option<Bson>> {
        debug!(collection, "enter update_many");

        let handle = self.manager.acquire().await?;
        let options = self.merge_write_timeout(options);

        let result = handle
            .collection(collection)
            .update_many(filter, update, options)
            .await
            .map_err(|e| self.driver_failure("update_many", collection, &handle, e))?;

        Ok(result.upserted_id)
    }

    fn find_one_options(&self, criteria: ReadCriteria) -> FindOneOptions {
        let mut options = FindOneOptions::default();
        options.projection = criteria.projection;
        options.sort = criteria.sort;
        options.skip = Some(criteria.skip);
        options.max_time = Some(self.config().max_time());
        options
    }

    fn find_options(&self, criteria: ReadCriteria) -> FindOptions {
        let mut options = FindOptions::default();
        options.projection = criteria.projection;
        options.sort = criteria.sort;
        options.skip = Some(criteria.skip);
        options.limit = (criteria.limit != 0).then_some(criteria.limit);
        options.max_time = Some(self.config().max_time());
        options
    }

    fn find_one_and_update_options(&self, sort: Option<Document>) -> FindOneAndUpdateOptions {
        let mut options = FindOneAndUpdateOptions::default();
        options.upsert = Some(true);
        options.sort = sort;
        options.max_time = Some(self.config().max_time());
        options.return_document = Some(ReturnDocument::After);
        options.write_concern = Some(self.config().write_concern());
        options
    }

    /// Merge the configured write timeout into caller-supplied options.
    /// Idempotent; a caller-specified write concern keeps its other
    /// settings.
    fn merge_write_timeout(&self, mut options: UpdateOptions) -> UpdateOptions {
        let mut write_concern = options
            .write_concern
            .take()
            .unwrap_or_else(|| self.config().write_concern());
        write_concern.w_timeout = Some(self.config().max_time());
        options.write_concern = Some(write_concern);
        options
    }

    fn driver_failure(
        &self,
        operation: &str,
        collection: &str,
        handle: &StoreHandle,
        err: mongodb::error::Error,
    ) -> StoreError {
        if is_connection_class(&err) {
            handle.mark_disconnected();
        }
        error!(operation, collection, error = %err, "store operation failed");
        StoreError::Driver(err)
    }

    fn verification_failure(
        &self,
        operation: &str,
        collection: &str,
        err: StoreError,
    ) -> StoreError {
        error!(operation, collection, error = %err, "success verification failed");
        err
    }
}

/// The inserted count must equal the input count or the insert fails as a
/// whole.
fn verify_inserted(expected: usize, reported: usize) -> Result<(), StoreError> {
    if reported == expected {
        Ok(())
    } else {
        Err(StoreError::insert(format!(
            "store reported {} of {} documents inserted",
            reported, expected
        )))
    }
}

/// Whether a driver fault means the shared handle should be replaced.
fn is_connection_class(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. }
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bson::doc;
    use mongodb::options::WriteConcern;

    use super::*;

    fn store(max_time_ms: u64) -> Store {
        let config = StoreConfig::builder()
            .database("testdb")
            .max_time_ms(max_time_ms)
            .build()
            .unwrap();
        Store::new(Arc::new(ConnectionManager::new(config)))
    }

    #[test]
    fn test_find_options_bound_by_max_time() {
        let store = store(1200);
        let options = store.find_options(ReadCriteria::default());

        assert_eq!(options.max_time, Some(Duration::from_millis(1200)));
        assert_eq!(options.skip, Some(0));
        assert_eq!(options.limit, None);
    }

    #[test]
    fn test_find_options_limit_zero_is_unbounded() {
        let store = store(1000);

        let bounded = store.find_options(ReadCriteria {
            limit: 25,
            ..Default::default()
        });
        assert_eq!(bounded.limit, Some(25));

        let unbounded = store.find_options(ReadCriteria {
            limit: 0,
            ..Default::default()
        });
        assert_eq!(unbounded.limit, None);
    }

    #[test]
    fn test_find_one_options_carry_criteria() {
        let store = store(1000);
        let options = store.find_one_options(ReadCriteria {
            projection: Some(doc! { "name": 1 }),
            sort: Some(doc! { "age": -1 }),
            skip: 3,
            limit: 0,
        });

        assert_eq!(options.projection, Some(doc! { "name": 1 }));
        assert_eq!(options.sort, Some(doc! { "age": -1 }));
        assert_eq!(options.skip, Some(3));
        assert_eq!(options.max_time, Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_find_one_and_update_always_upserts() {
        let store = store(1000);
        let options = store.find_one_and_update_options(Some(doc! { "age": 1 }));

        assert_eq!(options.upsert, Some(true));
        assert!(matches!(
            options.return_document,
            Some(ReturnDocument::After)
        ));
        assert_eq!(options.sort, Some(doc! { "age": 1 }));
        assert_eq!(options.max_time, Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_merge_write_timeout_into_empty_options() {
        let store = store(2000);
        let merged = store.merge_write_timeout(UpdateOptions::default());

        let wc = merged.write_concern.expect("write concern expected");
        assert_eq!(wc.w_timeout, Some(Duration::from_millis(2000)));
        assert_eq!(wc.journal, Some(true));
    }

    #[test]
    fn test_merge_write_timeout_keeps_caller_settings() {
        let store = store(2000);

        let mut options = UpdateOptions::default();
        options.upsert = Some(true);
        options.write_concern = Some(
            WriteConcern::builder()
                .journal(false)
                .w_timeout(Duration::from_millis(50))
                .build(),
        );

        let merged = store.merge_write_timeout(options);
        assert_eq!(merged.upsert, Some(true));

        // The caller's journal choice survives; the timeout is ours.
        let wc = merged.write_concern.expect("write concern expected");
        assert_eq!(wc.journal, Some(false));
        assert_eq!(wc.w_timeout, Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_merge_write_timeout_is_idempotent() {
        let store = store(2000);

        let once = store.merge_write_timeout(UpdateOptions::default());
        let twice = store.merge_write_timeout(once.clone());

        assert_eq!(
            once.write_concern.as_ref().and_then(|wc| wc.w_timeout),
            twice.write_concern.as_ref().and_then(|wc| wc.w_timeout),
        );
    }

    #[test]
    fn test_verify_inserted() {
        assert!(verify_inserted(3, 3).is_ok());

        let err = verify_inserted(3, 2).unwrap_err();
        assert!(err.is_verification_error());
        assert_eq!(
            err.to_string(),
            "insert error: store reported 2 of 3 documents inserted"
        );
    }
}
