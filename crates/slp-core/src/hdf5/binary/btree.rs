//! Version-1 B-tree walking for old-style ("symbol table") groups.
//!
//! Only node type 0 (group nodes) is implemented — SLP files never use
//! node type 1 (chunked raw data indexing) since none of the datasets in
//! the schema are chunked/filtered in practice.

use super::heap::{self, LocalHeap};
use super::Cursor;
use crate::error::{Hdf5Error, Result};

const BTREE_SIGNATURE: &[u8; 4] = b"TREE";
const SNOD_SIGNATURE: &[u8; 4] = b"SNOD";

/// One child entry of a group: its name and the address of its object
/// header.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub object_header_addr: u64,
}

/// Walks the B-tree rooted at `btree_addr`, resolving names via `heap`,
/// and returns every symbol table entry reachable from it.
pub fn collect_entries(
    data: &[u8],
    btree_addr: u64,
    heap_data: &[u8],
    heap: &LocalHeap,
    offset_size: u8,
    length_size: u8,
) -> Result<Vec<SymbolEntry>> {
    let mut out = Vec::new();
    walk_node(data, btree_addr, heap_data, heap, offset_size, length_size, &mut out)?;
    Ok(out)
}

fn walk_node(
    data: &[u8],
    addr: u64,
    heap_data: &[u8],
    heap: &LocalHeap,
    offset_size: u8,
    length_size: u8,
    out: &mut Vec<SymbolEntry>,
) -> Result<()> {
    let mut c = Cursor::at(data, addr as usize);
    let sig = c.read_bytes(4)?;
    if sig != BTREE_SIGNATURE {
        return Err(Hdf5Error::Malformed {
            offset: addr,
            message: "bad B-tree signature".into(),
        });
    }
    let node_type = c.read_u8()?;
    if node_type != 0 {
        return Err(Hdf5Error::UnsupportedDataset(
            "only group (type 0) B-trees are supported".into(),
        ));
    }
    let level = c.read_u8()?;
    let entries_used = c.read_u16()?;
    let _left_sibling = c.read_uint(offset_size)?;
    let _right_sibling = c.read_uint(offset_size)?;

    // key0, child0, key1, child1, ..., key_n
    let _key0 = c.read_uint(length_size)?;
    for _ in 0..entries_used {
        let child_addr = c.read_uint(offset_size)?;
        let _key = c.read_uint(length_size)?;
        if level == 0 {
            collect_snod(data, child_addr, heap_data, heap, offset_size, out)?;
        } else {
            walk_node(data, child_addr, heap_data, heap, offset_size, length_size, out)?;
        }
    }
    Ok(())
}

fn collect_snod(
    data: &[u8],
    addr: u64,
    heap_data: &[u8],
    heap: &LocalHeap,
    offset_size: u8,
    out: &mut Vec<SymbolEntry>,
) -> Result<()> {
    let mut c = Cursor::at(data, addr as usize);
    let sig = c.read_bytes(4)?;
    if sig != SNOD_SIGNATURE {
        return Err(Hdf5Error::Malformed {
            offset: addr,
            message: "bad symbol table node signature".into(),
        });
    }
    let _version = c.read_u8()?;
    c.skip(1)?;
    let num_symbols = c.read_u16()?;

    for _ in 0..num_symbols {
        let link_name_offset = c.read_uint(offset_size)?;
        let object_header_addr = c.read_uint(offset_size)?;
        let _cache_type = c.read_u32()?;
        c.skip(4)?;
        c.skip(16)?; // scratch pad

        let name = heap::read_name(heap_data, heap, link_name_offset)?;
        out.push(SymbolEntry {
            name,
            object_header_addr,
        });
    }
    Ok(())
}
