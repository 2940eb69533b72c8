//! HDF5 access layer for the SLP file format: local (in-memory / mmap) and
//! streaming (HTTP byte-range) backends behind one `Hdf5Source` trait.
//!
//! This crate knows nothing about skeletons, instances, or any other
//! SLP-specific schema; it exposes groups, datasets, attributes, and
//! compound/vlen values exactly as the HDF5 container stores them. The
//! schema-aware decoding lives in `slp-format`, one layer up.

pub mod byte_source;
pub mod error;
pub mod hdf5;

pub use error::{Hdf5Error, Result};
pub use hdf5::local::LocalSource;
pub use hdf5::streaming::{StreamMode, StreamingSource};
pub use hdf5::{AttrValue, CompoundField, CompoundLayout, DatasetValue, Hdf5Item, Hdf5Source, ScalarType, Shape};
