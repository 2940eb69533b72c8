//! Error types for the HDF5 access layer

use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the HDF5 access layer (local and streaming backends)
#[derive(Error, Debug)]
pub enum Hdf5Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error at {path:?}: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected end of data at offset {0}")]
    UnexpectedEof(u64),

    #[error("malformed HDF5 structure at offset {offset}: {message}")]
    Malformed { offset: u64, message: String },

    #[error("dataset or group not found: {0}")]
    NotFound(String),

    #[error("unsupported dataset: {0}")]
    UnsupportedDataset(String),

    #[error("network error fetching range {range:?}: {message}")]
    NetworkError {
        range: Range<u64>,
        message: String,
    },

    #[error("streaming worker channel closed unexpectedly")]
    WorkerClosed,

    #[error("streaming transport does not support range requests")]
    RangeUnsupported,
}

pub type Result<T> = std::result::Result<T, Hdf5Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_carries_range() {
        let err = Hdf5Error::NetworkError {
            range: 10..20,
            message: "timeout".into(),
        };
        match err {
            Hdf5Error::NetworkError { range, .. } => assert_eq!(range, 10..20),
            _ => panic!("wrong variant"),
        }
    }
}
