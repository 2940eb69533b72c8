//! Global heap ("GCOL") parsing.
//!
//! Variable-length data (vlen strings, vlen byte sequences) is stored
//! out-of-line: the inline field is just a `{length, collection address,
//! object index}` descriptor pointing into one of these collections.

use super::Cursor;
use crate::error::{Hdf5Error, Result};

const GCOL_SIGNATURE: &[u8; 4] = b"GCOL";

/// The inline descriptor HDF5 embeds wherever a vlen value lives.
#[derive(Debug, Clone, Copy)]
pub struct VlenDescriptor {
    pub length: u64,
    pub collection_addr: u64,
    pub object_index: u32,
}

pub fn parse_descriptor(data: &[u8], length_size: u8, offset_size: u8) -> Result<VlenDescriptor> {
    let mut c = Cursor::new(data);
    let length = c.read_uint(length_size)?;
    let collection_addr = c.read_uint(offset_size)?;
    let object_index = c.read_u32()?;
    Ok(VlenDescriptor {
        length,
        collection_addr,
        object_index,
    })
}

/// Resolves a vlen descriptor to its raw bytes by walking the target
/// global heap collection for the matching object index.
pub fn resolve(file_data: &[u8], desc: &VlenDescriptor, length_size: u8) -> Result<Vec<u8>> {
    let mut c = Cursor::at(file_data, desc.collection_addr as usize);
    let sig = c.read_bytes(4)?;
    if sig != GCOL_SIGNATURE {
        return Err(Hdf5Error::Malformed {
            offset: desc.collection_addr,
            message: "bad global heap collection signature".into(),
        });
    }
    let _version = c.read_u8()?;
    c.skip(3)?;
    let collection_size = c.read_uint(length_size)? as usize;
    let collection_end = desc.collection_addr as usize + collection_size;

    loop {
        if c.position() + 8 > collection_end || c.position() + 8 > file_data.len() {
            break;
        }
        let index = c.read_u16()?;
        if index == 0 {
            break; // free-space terminator
        }
        let _ref_count = c.read_u16()?;
        c.skip(4)?; // reserved
        let object_size = c.read_uint(length_size)? as usize;
        let object_start = c.position();
        if index as u32 == desc.object_index {
            let end = (object_start + object_size).min(file_data.len());
            return Ok(file_data[object_start..end].to_vec());
        }
        c.seek(object_start + super::align8(object_size));
    }

    Err(Hdf5Error::NotFound(format!(
        "global heap object {} not found in collection at {:#x}",
        desc.object_index, desc.collection_addr
    )))
}
