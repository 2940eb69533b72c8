//! Data Layout message parsing (v3 encoding: compact / contiguous / chunked).

use super::Cursor;
use crate::error::{Hdf5Error, Result};

#[derive(Debug, Clone)]
pub enum Layout {
    Compact { data: Vec<u8> },
    Contiguous { addr: u64, size: u64 },
    /// Best-effort: only the first chunk's address is tracked. SLP datasets
    /// are written without chunking/compression in practice, so a second
    /// chunk is never expected; encountering one surfaces as
    /// `UnsupportedDataset` at read time rather than silently truncating.
    Chunked { first_chunk_addr: u64, dims: Vec<u32> },
}

const CLASS_COMPACT: u8 = 0;
const CLASS_CONTIGUOUS: u8 = 1;
const CLASS_CHUNKED: u8 = 2;

pub fn parse(data: &[u8], offset_size: u8, length_size: u8) -> Result<Layout> {
    let mut c = Cursor::new(data);
    let version = c.read_u8()?;
    if version != 3 {
        return Err(Hdf5Error::UnsupportedDataset(format!(
            "data layout message version {version} not supported (expected v3)"
        )));
    }
    let class = c.read_u8()?;
    match class {
        CLASS_COMPACT => {
            let size = c.read_u16()? as usize;
            Ok(Layout::Compact {
                data: c.read_bytes(size)?,
            })
        }
        CLASS_CONTIGUOUS => {
            let addr = c.read_uint(offset_size)?;
            let size = c.read_uint(length_size)?;
            Ok(Layout::Contiguous { addr, size })
        }
        CLASS_CHUNKED => {
            let dimensionality = c.read_u8()? as usize;
            let addr = c.read_uint(offset_size)?;
            let mut dims = Vec::with_capacity(dimensionality);
            for _ in 0..dimensionality {
                dims.push(c.read_u32()?);
            }
            Ok(Layout::Chunked {
                first_chunk_addr: addr,
                dims,
            })
        }
        other => Err(Hdf5Error::UnsupportedDataset(format!(
            "unsupported data layout class {other}"
        ))),
    }
}
