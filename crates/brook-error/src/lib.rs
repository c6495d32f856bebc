use brook_types::StreamId;
use thiserror::Error;

/// Primary error type for brook planning operations.
///
/// The ordering core itself has no recoverable failures; every variant here
/// originates in the access probe (catalog and statistics reads) and is
/// propagated through the core unchanged.
#[derive(Error, Debug)]
pub enum BrookError {
    // === Catalog ===
    /// Reading catalog metadata for a stream failed.
    #[error("catalog read failed for stream {stream}: {detail}")]
    CatalogRead { stream: StreamId, detail: String },

    /// The index named by the catalog could not be opened.
    #[error("index {name} is unavailable")]
    IndexUnavailable { name: String },

    // === Statistics ===
    /// No cardinality or selectivity statistics exist for a stream.
    #[error("no statistics available for stream {stream}")]
    MissingStatistics { stream: StreamId },

    // === I/O ===
    /// File I/O error while reading catalog pages.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the planner crates.
pub type Result<T> = std::result::Result<T, BrookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BrookError::CatalogRead {
            stream: StreamId::new(4),
            detail: "page checksum mismatch".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "catalog read failed for stream 4: page checksum mismatch"
        );

        let err = BrookError::MissingStatistics {
            stream: StreamId::new(0),
        };
        assert_eq!(err.to_string(), "no statistics available for stream 0");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BrookError = io.into();
        assert!(matches!(err, BrookError::Io(_)));
    }
}
