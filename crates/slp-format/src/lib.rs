//! SLP (animal-pose label) schema decoding on top of `slp-core`'s HDF5
//! access layer: JSON metadata parsers, compound record-table decoders,
//! the cross-linker, the embedded-video backend, the `Labels` object
//! model, and the metadata-only ("lite") fast path.
//!
//! `load_slp`/`load_slp_lite` are the two public entry points; everything
//! else in this crate exists to make those two functions correct.

pub mod config;
pub mod error;
pub mod json;
pub mod linker;
pub mod lite;
pub mod loader;
pub mod model;
pub mod tables;
pub mod video;

pub use config::LoaderConfig;
pub use error::{Result, SlpError};
pub use lite::{is_hdf5_buffer, validate_slp_buffer, LiteCounts, LiteLabels};
pub use loader::{load_slp, load_slp_lite};
pub use model::Labels;
