//! Pure-Rust HDF5 binary layout parser.
//!
//! No external HDF5 library: this walks the on-disk superblock, object
//! headers, v1 B-trees, and local heaps directly, the same way the
//! sibling container parsers in this codebase walk ISO-BMFF boxes or
//! Matroska elements — a `Cursor`-driven reader with explicit bounds
//! checks instead of a `read_exact` that can panic.
//!
//! Scope: this reader targets the file layout h5py actually produces for
//! SLP files (v0 superblock, "earliest"-format v1 object headers,
//! old-style symbol-table groups). HDF5's newer v2 object headers and
//! "new-style" compact/dense group layouts are not implemented; a file
//! written with `libver='latest'` is out of scope, matching the non-goal
//! in spec.md §1 of supporting arbitrary HDF5 files.

pub mod attribute;
pub mod btree;
pub mod datatype;
pub mod dataspace;
pub mod global_heap;
pub mod heap;
pub mod index;
pub mod layout;
pub mod object_header;
pub mod superblock;

use crate::error::{Hdf5Error, Result};

/// A little-endian cursor over borrowed bytes with bounds-checked reads,
/// matching the teacher's big-endian `Cursor<&[u8]>` helpers but for
/// HDF5's little-endian convention.
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Borrows everything from the current position to the end.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Hdf5Error::UnexpectedEof(self.pos as u64));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads a variable-width unsigned integer (HDF5 "offset"/"length"
    /// fields are 4 or 8 bytes depending on the superblock).
    pub fn read_uint(&mut self, width: u8) -> Result<u64> {
        match width {
            4 => Ok(self.read_u32()? as u64),
            8 => self.read_u64(),
            other => Err(Hdf5Error::Malformed {
                offset: self.pos as u64,
                message: format!("unsupported integer width {other}"),
            }),
        }
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n)?;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    /// Reads a NUL-terminated string, leaving the cursor just past the NUL.
    pub fn read_cstr(&mut self) -> Result<String> {
        let start = self.pos;
        let end = self.data[start..]
            .iter()
            .position(|&b| b == 0)
            .map(|i| start + i)
            .ok_or(Hdf5Error::UnexpectedEof(start as u64))?;
        let s = std::str::from_utf8(&self.data[start..end])
            .map_err(|_| Hdf5Error::Malformed {
                offset: start as u64,
                message: "invalid UTF-8 in HDF5 name".into(),
            })?
            .to_string();
        self.pos = end + 1;
        Ok(s)
    }
}

/// Rounds `n` up to the next multiple of 8, the alignment HDF5 pads
/// object header messages and heap entries to.
pub fn align8(n: usize) -> usize {
    (n + 7) & !7
}

pub const HDF5_SIGNATURE: [u8; 8] = [0x89, 0x48, 0x44, 0x46, 0x0D, 0x0A, 0x1A, 0x0A];
