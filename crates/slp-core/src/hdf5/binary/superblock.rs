//! Superblock parsing (HDF5 File Format spec §3)

use super::{Cursor, HDF5_SIGNATURE};
use crate::error::{Hdf5Error, Result};

/// Where the root group's listing lives, however the superblock version
/// chose to say so.
#[derive(Debug, Clone)]
pub enum RootGroupPointer {
    /// v0/v1 superblock: a symbol table entry whose scratch-pad cache
    /// directly names the root group's B-tree and local heap.
    SymbolTable { btree_addr: u64, heap_addr: u64 },
    /// v2/v3 superblock: the root group's own object header address,
    /// which must be parsed for its Symbol Table / Link Info message.
    ObjectHeader { addr: u64 },
}

#[derive(Debug, Clone)]
pub struct Superblock {
    pub version: u8,
    pub offset_size: u8,
    pub length_size: u8,
    pub root: RootGroupPointer,
}

/// Parses the superblock starting at the beginning of `data`.
pub fn parse(data: &[u8]) -> Result<Superblock> {
    if data.len() < 8 || data[0..8] != HDF5_SIGNATURE {
        return Err(Hdf5Error::Malformed {
            offset: 0,
            message: "missing HDF5 signature".into(),
        });
    }

    let mut c = Cursor::at(data, 8);
    let version = c.read_u8()?;

    match version {
        0 | 1 => parse_v0(&mut c, version),
        2 | 3 => parse_v2(&mut c, version),
        other => Err(Hdf5Error::Malformed {
            offset: 8,
            message: format!("unsupported superblock version {other}"),
        }),
    }
}

fn parse_v0(c: &mut Cursor<'_>, version: u8) -> Result<Superblock> {
    let _free_space_version = c.read_u8()?;
    let _root_group_version = c.read_u8()?;
    c.skip(1)?; // reserved
    let _shared_header_version = c.read_u8()?;
    let offset_size = c.read_u8()?;
    let length_size = c.read_u8()?;
    c.skip(1)?; // reserved
    let _leaf_k = c.read_u16()?;
    let _internal_k = c.read_u16()?;
    let _flags = c.read_u32()?;
    if version == 1 {
        let _indexed_storage_k = c.read_u16()?;
        c.skip(2)?;
    }

    let _base_address = c.read_uint(offset_size)?;
    let _free_space_addr = c.read_uint(offset_size)?;
    let _eof_addr = c.read_uint(offset_size)?;
    let _driver_info_addr = c.read_uint(offset_size)?;

    // Root group symbol table entry
    let _link_name_offset = c.read_uint(offset_size)?;
    let _object_header_addr = c.read_uint(offset_size)?;
    let cache_type = c.read_u32()?;
    c.skip(4)?; // reserved

    let root = if cache_type == 1 {
        let btree_addr = c.read_uint(offset_size)?;
        let heap_addr = c.read_uint(offset_size)?;
        RootGroupPointer::SymbolTable { btree_addr, heap_addr }
    } else {
        RootGroupPointer::ObjectHeader { addr: _object_header_addr }
    };

    Ok(Superblock {
        version,
        offset_size,
        length_size,
        root,
    })
}

fn parse_v2(c: &mut Cursor<'_>, version: u8) -> Result<Superblock> {
    let offset_size = c.read_u8()?;
    let length_size = c.read_u8()?;
    let _flags = c.read_u8()?;
    let _base_address = c.read_uint(offset_size)?;
    let _superblock_ext_addr = c.read_uint(offset_size)?;
    let _eof_addr = c.read_uint(offset_size)?;
    let root_group_header_addr = c.read_uint(offset_size)?;

    Ok(Superblock {
        version,
        offset_size,
        length_size,
        root: RootGroupPointer::ObjectHeader { addr: root_group_header_addr },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_signature() {
        let data = vec![0u8; 16];
        assert!(parse(&data).is_err());
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut data = HDF5_SIGNATURE.to_vec();
        data.push(9);
        assert!(parse(&data).is_err());
    }
}
