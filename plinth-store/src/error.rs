//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
///
/// The write-operation variants (`Insert`, `Delete`, `Update`, `Drop`)
/// mean the store acknowledged the call but the success signal did not
/// check out (false acknowledgment or a count mismatch). Faults raised by
/// the driver itself pass through as [`StoreError::Driver`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// MongoDB driver error.
    #[error("store error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// BSON serialization error.
    #[error("bson error: {0}")]
    Bson(#[from] bson::ser::Error),

    /// BSON deserialization error.
    #[error("bson deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Cannot establish or reuse a store connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// Insert acknowledged with a bad success signal.
    #[error("insert error: {0}")]
    Insert(String),

    /// Delete acknowledged with a bad success signal.
    ///
    /// The driver folds the delete acknowledgment into the call result,
    /// so no current delete path constructs this; the variant keeps the
    /// delete failure kind addressable in the error taxonomy.
    #[error("delete error: {0}")]
    Delete(String),

    /// Update acknowledged with a bad success signal.
    #[error("update error: {0}")]
    Update(String),

    /// Collection drop did not complete.
    #[error("drop error: {0}")]
    Drop(String),

    /// Document conversion error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create an insert error.
    pub fn insert(message: impl Into<String>) -> Self {
        Self::Insert(message.into())
    }

    /// Create a delete error.
    pub fn delete(message: impl Into<String>) -> Self {
        Self::Delete(message.into())
    }

    /// Create an update error.
    pub fn update(message: impl Into<String>) -> Self {
        Self::Update(message.into())
    }

    /// Create a drop error.
    pub fn drop_collection(message: impl Into<String>) -> Self {
        Self::Drop(message.into())
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a write-verification error (acknowledged by the
    /// store but the success signal failed).
    pub fn is_verification_error(&self) -> bool {
        matches!(
            self,
            Self::Insert(_) | Self::Delete(_) | Self::Update(_) | Self::Drop(_)
        )
    }

    /// Check if this is a driver passthrough error.
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::Driver(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StoreError::config("missing database name");
        assert!(matches!(err, StoreError::Config(_)));

        let err = StoreError::connection("connection refused");
        assert!(err.is_connection_error());

        let err = StoreError::insert("inserted 0 of 1");
        assert!(err.is_verification_error());

        let err = StoreError::update("acknowledged: false");
        assert!(err.is_verification_error());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::config("test error");
        assert_eq!(err.to_string(), "configuration error: test error");

        let err = StoreError::Delete("acknowledged: false".to_string());
        assert_eq!(err.to_string(), "delete error: acknowledged: false");

        let err = StoreError::Drop("users".to_string());
        assert_eq!(err.to_string(), "drop error: users");
    }
}
