//! Error taxonomy for SLP schema decoding (spec §7).

use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlpError {
    /// A required root dataset/group is absent, `metadata.attrs.json` is
    /// missing, or the JSON metadata blob failed to parse.
    #[error("invalid SLP file: {0}")]
    InvalidSlp(String),

    /// The active backend cannot decode a dataset of this shape (e.g. a
    /// compound table under a backend that only reads shapes).
    #[error("unsupported dataset: {0}")]
    UnsupportedDataset(String),

    /// A required field was absent and no legacy default applies.
    #[error("schema version error: field {field:?} is required but absent")]
    SchemaVersionError { field: String },

    /// An embedded video frame failed to decode. Non-fatal: callers treat
    /// this as `getFrame` returning `None`, never as a reason to abort a
    /// whole load.
    #[error("failed to decode frame {frame} ({format}): {message}")]
    DecodeError {
        frame: u64,
        format: String,
        message: String,
    },

    /// The HDF5 access layer failed; `NetworkError`'s byte range, if any,
    /// survives inside the wrapped `Hdf5Error`.
    #[error(transparent)]
    Hdf5(#[from] slp_core::Hdf5Error),

    #[error("malformed JSON metadata: {0}")]
    Json(#[from] serde_json::Error),
}

impl SlpError {
    /// True for the one `NetworkError` variant the core can surface, so
    /// callers can special-case retryable transport failures.
    pub fn network_range(&self) -> Option<Range<u64>> {
        match self {
            SlpError::Hdf5(slp_core::Hdf5Error::NetworkError { range, .. }) => Some(range.clone()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SlpError>;
