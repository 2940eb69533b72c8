//! Local heap parsing — resolves link-name offsets to strings.

use super::Cursor;
use crate::error::{Hdf5Error, Result};

const HEAP_SIGNATURE: &[u8; 4] = b"HEAP";

pub struct LocalHeap {
    pub data_segment_addr: u64,
    pub data_segment_size: u64,
}

pub fn parse(data: &[u8], addr: u64, offset_size: u8, length_size: u8) -> Result<LocalHeap> {
    let start = addr as usize;
    let mut c = Cursor::at(data, start);
    let sig = c.read_bytes(4)?;
    if sig != HEAP_SIGNATURE {
        return Err(Hdf5Error::Malformed {
            offset: addr,
            message: "bad local heap signature".into(),
        });
    }
    let _version = c.read_u8()?;
    c.skip(3)?; // reserved
    let data_segment_size = c.read_uint(length_size)?;
    let _free_list_offset = c.read_uint(length_size)?;
    let data_segment_addr = c.read_uint(offset_size)?;

    Ok(LocalHeap {
        data_segment_addr,
        data_segment_size,
    })
}

/// Reads the NUL-terminated name at `offset` within the heap's data segment.
pub fn read_name(data: &[u8], heap: &LocalHeap, offset: u64) -> Result<String> {
    let abs = (heap.data_segment_addr + offset) as usize;
    if abs as u64 >= heap.data_segment_addr + heap.data_segment_size {
        return Err(Hdf5Error::Malformed {
            offset: abs as u64,
            message: "heap name offset out of range".into(),
        });
    }
    Cursor::at(data, abs).read_cstr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_signature() {
        let data = vec![0u8; 64];
        assert!(parse(&data, 0, 8, 8).is_err());
    }
}
