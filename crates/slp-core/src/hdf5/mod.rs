//! HDF5 access layer: one capability trait, two backends.
//!
//! Mirrors the container-parser split elsewhere in this codebase (a pure
//! binary-layout parser behind a small trait), applied to the HDF5 file
//! format instead of ISO-BMFF/Matroska.

pub mod binary;
pub mod local;
pub mod streaming;

use crate::error::Result;
use std::collections::HashMap;

/// An opaque handle to a group or dataset, addressed by its absolute path.
///
/// Backends key everything by canonical path; no live file-offset handles
/// escape this module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Hdf5Item {
    Group(String),
    Dataset(String),
}

impl Hdf5Item {
    pub fn path(&self) -> &str {
        match self {
            Hdf5Item::Group(p) | Hdf5Item::Dataset(p) => p,
        }
    }
}

/// A single attribute or scalar value as it comes off the wire, before any
/// higher-level (e.g. JSON) interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
}

impl AttrValue {
    /// Best-effort conversion to a UTF-8 string, trimming trailing NULs.
    ///
    /// HDF5 fixed-length string attributes are frequently NUL-padded; the
    /// JSON metadata blobs SLP stores as attributes rely on this.
    pub fn as_str_lossy(&self) -> Option<String> {
        match self {
            AttrValue::Str(s) => Some(s.trim_end_matches('\0').to_string()),
            AttrValue::Bytes(b) => {
                let end = b.iter().position(|&c| c == 0).unwrap_or(b.len());
                std::str::from_utf8(&b[..end]).ok().map(|s| s.to_string())
            }
            AttrValue::Float(_) | AttrValue::Int(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(f) => Some(*f),
            AttrValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// Scalar element types appearing in compound dataset fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    I8,
    U8,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    pub fn size(self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::I64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }
}

/// One named member of a compound HDF5 datatype.
#[derive(Debug, Clone)]
pub struct CompoundField {
    pub name: String,
    pub offset: usize,
    pub dtype: ScalarType,
}

/// The layout of a compound datatype: field list plus total row stride.
#[derive(Debug, Clone)]
pub struct CompoundLayout {
    pub fields: Vec<CompoundField>,
    pub row_size: usize,
}

impl CompoundLayout {
    pub fn field(&self, name: &str) -> Option<&CompoundField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The shape of a dataset (outer dimension first, per HDF5 convention).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape(pub Vec<u64>);

impl Shape {
    pub fn rows(&self) -> u64 {
        self.0.first().copied().unwrap_or(0)
    }
}

/// A decoded dataset value, in whatever shape its HDF5 layout implies.
#[derive(Debug, Clone)]
pub enum DatasetValue {
    /// A single contiguous byte buffer (scalar/contiguous datasets, and the
    /// "contiguous buffer" embedded-video layout of spec.md §4.5).
    Raw(bytes::Bytes),
    /// A variable-length array of independent byte blobs, one per row (the
    /// "vlen-array" embedded-video layout, and `tracks_json`/`videos_json`
    /// style per-row JSON string datasets).
    VlenBytes(Vec<bytes::Bytes>),
    /// Packed compound rows plus the field layout needed to slice them.
    Compound {
        layout: CompoundLayout,
        rows: bytes::Bytes,
    },
}

/// The one capability set every HDF5 backend exposes (spec.md §4.1).
///
/// Async because the streaming backend suspends at every call (spec.md §5);
/// the local backend's implementations simply never hit an `.await` point
/// that actually yields.
#[async_trait::async_trait]
pub trait Hdf5Source: Send + Sync {
    /// Look up a group or dataset by absolute path. Returns `None` rather
    /// than erroring when the node is simply absent.
    async fn get(&self, path: &str) -> Result<Option<Hdf5Item>>;

    async fn attrs(&self, item: &Hdf5Item) -> Result<HashMap<String, AttrValue>>;

    async fn shape(&self, item: &Hdf5Item) -> Result<Option<Shape>>;

    async fn value(&self, item: &Hdf5Item) -> Result<DatasetValue>;

    /// Names of the root group's immediate children.
    async fn keys(&self) -> Result<Vec<String>>;

    async fn close(&self) -> Result<()>;

    /// Whether this backend can serve ranged/partial reads. The lite loader
    /// degrades to shape-only reads when this is false for the full-record
    /// path, per spec.md §4.1 `UnsupportedDataset` semantics.
    fn supports_streaming(&self) -> bool {
        false
    }
}
