//! Error types for bplusdb.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in bplusdb.
///
/// Tree operations report three kinds of failure: a rejected duplicate
/// insert, a delete of an absent entry, and I/O or format faults. The first
/// two leave the file untouched; see [`Error::is_benign`].
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The exact `(key, value)` pair is already stored.
    #[error("Entry ({key}, {value}) already exists")]
    DuplicateEntry { key: String, value: i32 },

    /// The exact `(key, value)` pair is not stored.
    #[error("Entry ({key}, {value}) not found")]
    NotFound { key: String, value: i32 },

    /// Key is longer than the file's `max_key_len`.
    #[error("Key of {len} bytes exceeds maximum of {max}")]
    KeyTooLong { len: usize, max: usize },

    /// Key cannot be stored (contains a NUL byte).
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Tree parameters failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// File was created with different format parameters.
    #[error("Configuration mismatch for {field}: file has {stored}, requested {requested}")]
    ConfigMismatch {
        field: &'static str,
        stored: u32,
        requested: u32,
    },

    /// File contents failed a magic, checksum or structural check.
    #[error("Corrupted tree file: {0}")]
    Corrupted(String),

    /// Requested node slot does not exist on disk.
    #[error("Node {0} not found")]
    NodeNotFound(u32),
}

impl Error {
    /// Whether this error is an expected outcome of a well-formed request
    /// (`DuplicateEntry` or `NotFound`) rather than a fault.
    pub fn is_benign(&self) -> bool {
        matches!(self, Error::DuplicateEntry { .. } | Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NodeNotFound(42);
        assert_eq!(format!("{}", err), "Node 42 not found");

        let err = Error::DuplicateEntry {
            key: "abc".to_string(),
            value: 1,
        };
        assert_eq!(format!("{}", err), "Entry (abc, 1) already exists");

        let err = Error::ConfigMismatch {
            field: "leaf_capacity",
            stored: 85,
            requested: 4,
        };
        assert_eq!(
            format!("{}", err),
            "Configuration mismatch for leaf_capacity: file has 85, requested 4"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_is_benign() {
        assert!(Error::NotFound {
            key: "k".to_string(),
            value: 0
        }
        .is_benign());
        assert!(Error::DuplicateEntry {
            key: "k".to_string(),
            value: 0
        }
        .is_benign());
        assert!(!Error::Corrupted("bad magic".to_string()).is_benign());
        assert!(!Error::NodeNotFound(3).is_benign());
    }
}
