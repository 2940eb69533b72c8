//! In-memory / memory-mapped HDF5 backend.
//!
//! Parses the whole file's structure once at construction time (see
//! `binary::index`) and answers every `Hdf5Source` call from that index
//! plus direct reads against the underlying byte source — no repeated
//! tree walks.

use super::binary::datatype::Datatype;
use super::binary::global_heap;
use super::binary::index::{self, FileIndex, NodeInfo};
use super::binary::layout::Layout;
use super::{AttrValue, CompoundLayout, DatasetValue, Hdf5Item, Hdf5Source, Shape};
use crate::byte_source::{ByteSource, InMemorySource};
use crate::error::{Hdf5Error, Result};
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub struct LocalSource {
    bytes: Arc<dyn ByteSource>,
    index: FileIndex,
}

impl LocalSource {
    /// Opens a byte buffer already resident in memory.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        let data: Bytes = data.into();
        let index = index::build(&data)?;
        Ok(Self {
            bytes: Arc::new(InMemorySource::new(data)),
            index,
        })
    }

    /// Opens a file from disk via a memory-mapped, LRU-cached byte source.
    pub fn from_path(path: &Path) -> Result<Self> {
        let cache = crate::byte_source::ByteCache::open(path)?;
        let whole = cache.read_range(0, cache.len() as usize)?;
        let index = index::build(&whole)?;
        Ok(Self {
            bytes: Arc::new(cache),
            index,
        })
    }

    fn node(&self, path: &str) -> Option<&NodeInfo> {
        self.index.nodes.get(path)
    }

    fn whole_file(&self) -> Result<Vec<u8>> {
        self.bytes.read_range(0, self.bytes.len() as usize)
    }

    fn raw_for_layout(&self, layout: &Layout) -> Result<Vec<u8>> {
        match layout {
            Layout::Compact { data } => Ok(data.clone()),
            Layout::Contiguous { addr, size } => self.bytes.read_range(*addr, *size as usize),
            Layout::Chunked { .. } => Err(Hdf5Error::UnsupportedDataset(
                "chunked datasets with more than one chunk are not supported".into(),
            )),
        }
    }
}

#[async_trait::async_trait]
impl Hdf5Source for LocalSource {
    async fn get(&self, path: &str) -> Result<Option<Hdf5Item>> {
        let normalized = normalize(path);
        Ok(self.node(&normalized).map(|n| {
            if n.is_group {
                Hdf5Item::Group(normalized.clone())
            } else {
                Hdf5Item::Dataset(normalized.clone())
            }
        }))
    }

    async fn attrs(&self, item: &Hdf5Item) -> Result<HashMap<String, AttrValue>> {
        let node = self
            .node(item.path())
            .ok_or_else(|| Hdf5Error::NotFound(item.path().to_string()))?;
        Ok(node.attrs.clone())
    }

    async fn shape(&self, item: &Hdf5Item) -> Result<Option<Shape>> {
        let node = self
            .node(item.path())
            .ok_or_else(|| Hdf5Error::NotFound(item.path().to_string()))?;
        Ok(node.shape.clone())
    }

    async fn value(&self, item: &Hdf5Item) -> Result<DatasetValue> {
        let node = self
            .node(item.path())
            .ok_or_else(|| Hdf5Error::NotFound(item.path().to_string()))?;
        let layout = node
            .layout
            .as_ref()
            .ok_or_else(|| Hdf5Error::UnsupportedDataset(format!("{} has no data layout", item.path())))?;
        let raw = self.raw_for_layout(layout)?;

        match node.datatype.as_ref() {
            Some(Datatype::Compound(layout)) => Ok(DatasetValue::Compound {
                layout: clone_layout(layout),
                rows: Bytes::from(raw),
            }),
            Some(Datatype::VlenString) | Some(Datatype::VlenSequence { .. }) => {
                self.decode_vlen_rows(node, &raw)
            }
            _ => Ok(DatasetValue::Raw(Bytes::from(raw))),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let root = self
            .node("")
            .ok_or_else(|| Hdf5Error::NotFound("/".to_string()))?;
        Ok(root
            .children
            .iter()
            .filter_map(|c| c.rsplit('/').next().map(|s| s.to_string()))
            .collect())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn supports_streaming(&self) -> bool {
        false
    }
}

impl LocalSource {
    fn decode_vlen_rows(&self, node: &NodeInfo, raw: &[u8]) -> Result<DatasetValue> {
        let rows = node.shape.as_ref().map(|s| s.rows()).unwrap_or(1).max(1);
        let descriptor_size = self.index.length_size as usize + self.index.offset_size as usize + 4;
        let mut out = Vec::with_capacity(rows as usize);

        // Global heap collections can live anywhere in the file, so
        // resolving even one descriptor needs the whole buffer in view.
        let file = self.whole_file()?;

        for i in 0..rows {
            let start = i as usize * descriptor_size;
            let end = start + descriptor_size;
            if end > raw.len() {
                return Err(Hdf5Error::UnexpectedEof(end as u64));
            }
            let desc = global_heap::parse_descriptor(
                &raw[start..end],
                self.index.length_size,
                self.index.offset_size,
            )?;
            let bytes = global_heap::resolve(&file, &desc, self.index.length_size)?;
            out.push(Bytes::from(bytes));
        }

        Ok(DatasetValue::VlenBytes(out))
    }
}

fn clone_layout(layout: &CompoundLayout) -> CompoundLayout {
    CompoundLayout {
        fields: layout.fields.clone(),
        row_size: layout.row_size,
    }
}

/// Canonicalizes a caller-supplied path to the `/name` form `index::build`
/// keys every node under (root is `""`, children are `format!("{path}/{name}")`
/// — see `binary::index::walk_group`). Bare names (`"metadata"`, as every
/// root-key lookup in `slp-format` uses) must gain a leading slash, not just
/// have a trailing one stripped, or every lookup misses the index.
fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
