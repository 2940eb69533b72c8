//! Pure decoders from the SLP file's JSON metadata blobs into typed
//! entities (spec §4.2). Nothing here touches the HDF5 layer directly —
//! callers hand in already-extracted `serde_json::Value`s.

pub mod attr;
pub mod sessions;
pub mod skeleton;
pub mod suggestions;
pub mod tracks;
pub mod videos;

pub use attr::{decode_json_attribute, decode_json_bytes};
