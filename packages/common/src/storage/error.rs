use std::fmt;

use super::exact::SizeMismatch;

/// Errors that can occur during blob storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested blob was not found.
    NotFound(String),
    /// A blob is already stored under this key.
    AlreadyExists(String),
    /// The payload length differs from the size declared by the caller.
    SizeMismatch { expected: u64, actual: u64 },
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The remote backend rejected or failed the operation.
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "blob not found: {key}"),
            Self::AlreadyExists(key) => write!(f, "blob already exists: {key}"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "blob size mismatch: declared {expected} bytes, got {actual}")
            }
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        if let Some(mismatch) = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<SizeMismatch>())
        {
            return Self::SizeMismatch {
                expected: mismatch.expected,
                actual: mismatch.actual,
            };
        }
        Self::Io(err)
    }
}
