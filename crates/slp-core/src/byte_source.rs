//! Random-access byte sources backing the local HDF5 reader
//!
//! Adapted from the byte-cache used elsewhere in this codebase for
//! memory-mapped media files: the same mmap + LRU segment cache, but
//! generalized behind a small trait so the HDF5 binary parser does not
//! care whether its bytes came from a file on disk or an in-memory buffer.

use crate::error::{Hdf5Error, Result};
use bytes::Bytes;
use lru::LruCache;
use memmap2::Mmap;
use parking_lot::RwLock;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Anything that can serve byte ranges by absolute offset.
pub trait ByteSource: Send + Sync {
    /// Total length of the underlying data in bytes.
    fn len(&self) -> u64;

    /// Read `len` bytes starting at `offset`. Errors on out-of-bounds ranges.
    fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A byte buffer already resident in memory (the "byte buffer" variant of
/// the local reader in spec.md §4.1).
pub struct InMemorySource {
    data: Bytes,
}

impl InMemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl ByteSource for InMemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let start = offset as usize;
        let end = start
            .checked_add(len)
            .ok_or(Hdf5Error::UnexpectedEof(offset))?;
        self.data
            .get(start..end)
            .map(|s| s.to_vec())
            .ok_or(Hdf5Error::UnexpectedEof(offset))
    }
}

/// Memory-mapped file with an LRU segment cache, for the "local file" variant
/// of the local reader.
pub struct ByteCache {
    mmap: Arc<Mmap>,
    original_size: u64,
    segment_size: usize,
    cache: RwLock<LruCache<u64, Bytes>>,
    file_path: PathBuf,
}

impl ByteCache {
    pub const DEFAULT_SEGMENT_SIZE: usize = 256 * 1024;
    pub const DEFAULT_MAX_MEMORY: usize = 256 * 1024 * 1024;

    pub fn open(file_path: &Path) -> Result<Self> {
        Self::with_budget(file_path, Self::DEFAULT_SEGMENT_SIZE, Self::DEFAULT_MAX_MEMORY)
    }

    pub fn with_budget(file_path: &Path, segment_size: usize, max_memory: usize) -> Result<Self> {
        let file = File::open(file_path).map_err(|e| Hdf5Error::IoAt {
            path: file_path.to_path_buf(),
            source: e,
        })?;

        let mmap = unsafe {
            Mmap::map(&file).map_err(|e| Hdf5Error::IoAt {
                path: file_path.to_path_buf(),
                source: e,
            })?
        };

        let original_size = mmap.len() as u64;
        let num_segments = (max_memory / segment_size).max(1);

        Ok(Self {
            mmap: Arc::new(mmap),
            original_size,
            segment_size,
            cache: RwLock::new(LruCache::new(NonZeroUsize::new(num_segments).unwrap())),
            file_path: file_path.to_path_buf(),
        })
    }

    fn segment(&self, segment_idx: u64) -> Bytes {
        if let Some(bytes) = self.cache.write().get(&segment_idx) {
            return bytes.clone();
        }
        let offset = segment_idx * self.segment_size as u64;
        let remaining = self.mmap.len() as u64 - offset.min(self.mmap.len() as u64);
        let seg_len = (self.segment_size as u64).min(remaining) as usize;
        let bytes = Bytes::copy_from_slice(&self.mmap[offset as usize..offset as usize + seg_len]);
        self.cache.write().put(segment_idx, bytes.clone());
        bytes
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl ByteSource for ByteCache {
    fn len(&self) -> u64 {
        self.original_size
    }

    fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(Hdf5Error::UnexpectedEof(offset))?;
        if end > self.mmap.len() as u64 {
            return Err(Hdf5Error::UnexpectedEof(offset));
        }

        // Fast path when the range sits inside a single cache segment.
        let seg_size = self.segment_size as u64;
        let start_seg = offset / seg_size;
        let end_seg = (end.saturating_sub(1)) / seg_size;
        if start_seg == end_seg {
            let seg = self.segment(start_seg);
            let seg_off = (offset - start_seg * seg_size) as usize;
            return Ok(seg[seg_off..seg_off + len].to_vec());
        }

        // Range spans multiple segments: fall back to a direct mmap slice.
        Ok(self.mmap[offset as usize..end as usize].to_vec())
    }
}
