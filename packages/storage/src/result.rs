use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
