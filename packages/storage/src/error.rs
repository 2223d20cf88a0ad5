use std::io::ErrorKind;
use std::time::Duration;
use thiserror::Error;

/// Failure of a storage operation. "Record not found" is not an error.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Storage disabled or full
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Corrupt(e.to_string())
    }
}

impl StorageError {
    /// Map an IO error, folding quota and permission failures into `Unavailable`
    pub fn from_io(e: std::io::Error) -> Self {
        match e.kind() {
            ErrorKind::StorageFull | ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem => {
                StorageError::Unavailable(e.to_string())
            }
            _ => StorageError::Io(e),
        }
    }

    /// True when the store cannot be used for the rest of the session
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_maps_to_unavailable() {
        let err = StorageError::from_io(std::io::Error::new(ErrorKind::StorageFull, "quota"));
        assert!(err.is_unavailable());

        let err = StorageError::from_io(std::io::Error::new(ErrorKind::Other, "boom"));
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn test_json_error_is_corrupt() {
        let err: StorageError = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
