//! Eager whole-file index: walks every group reachable from the root and
//! records each node's messages in a flat `path -> NodeInfo` map.
//!
//! SLP files are small enough (a handful of groups, four tabular datasets,
//! a handful of JSON blobs) that indexing the whole tree up front is
//! simpler and faster than resolving paths lazily segment by segment, and
//! it lets `LocalSource::keys()` answer without re-walking anything.

use super::{attribute, btree, datatype::Datatype, dataspace, heap, layout::Layout, object_header, superblock};
use crate::error::Result;
use crate::hdf5::{AttrValue, Shape};
use std::collections::HashMap;

pub struct NodeInfo {
    pub is_group: bool,
    pub children: Vec<String>,
    pub attrs: HashMap<String, AttrValue>,
    pub shape: Option<Shape>,
    pub datatype: Option<Datatype>,
    pub layout: Option<Layout>,
}

pub struct FileIndex {
    pub nodes: HashMap<String, NodeInfo>,
    pub offset_size: u8,
    pub length_size: u8,
}

pub fn build(data: &[u8]) -> Result<FileIndex> {
    let sb = superblock::parse(data)?;
    let mut nodes = HashMap::new();

    let (root_btree, root_heap) = match &sb.root {
        superblock::RootGroupPointer::SymbolTable { btree_addr, heap_addr } => {
            (*btree_addr, *heap_addr)
        }
        superblock::RootGroupPointer::ObjectHeader { addr } => {
            let oh = object_header::parse(data, *addr, sb.offset_size, sb.length_size)?;
            symbol_table_pointer(&oh, data, sb.offset_size, sb.length_size)?
        }
    };

    walk_group(
        data,
        "",
        root_btree,
        root_heap,
        sb.offset_size,
        sb.length_size,
        &mut nodes,
    )?;

    Ok(FileIndex {
        nodes,
        offset_size: sb.offset_size,
        length_size: sb.length_size,
    })
}

fn symbol_table_pointer(
    oh: &object_header::ObjectHeader,
    data: &[u8],
    offset_size: u8,
    length_size: u8,
) -> Result<(u64, u64)> {
    let msg = oh.find(object_header::MSG_SYMBOL_TABLE).ok_or_else(|| {
        crate::error::Hdf5Error::Malformed {
            offset: 0,
            message: "group object header missing Symbol Table message".into(),
        }
    })?;
    let mut c = super::Cursor::new(&msg.data);
    let btree_addr = c.read_uint(offset_size)?;
    let heap_addr = c.read_uint(offset_size)?;
    let _ = (data, length_size);
    Ok((btree_addr, heap_addr))
}

fn walk_group(
    data: &[u8],
    path: &str,
    btree_addr: u64,
    heap_addr: u64,
    offset_size: u8,
    length_size: u8,
    nodes: &mut HashMap<String, NodeInfo>,
) -> Result<()> {
    let heap = heap::parse(data, heap_addr, offset_size, length_size)?;
    let entries = btree::collect_entries(data, btree_addr, data, &heap, offset_size, length_size)?;

    let mut children = Vec::with_capacity(entries.len());
    for entry in &entries {
        let child_path = format!("{path}/{}", entry.name);
        children.push(child_path.clone());
        let oh = object_header::parse(data, entry.object_header_addr, offset_size, length_size)?;
        index_node(data, &child_path, &oh, offset_size, length_size, nodes)?;
    }

    nodes.insert(
        path.to_string(),
        NodeInfo {
            is_group: true,
            children,
            attrs: HashMap::new(),
            shape: None,
            datatype: None,
            layout: None,
        },
    );
    Ok(())
}

fn index_node(
    data: &[u8],
    path: &str,
    oh: &object_header::ObjectHeader,
    offset_size: u8,
    length_size: u8,
    nodes: &mut HashMap<String, NodeInfo>,
) -> Result<()> {
    let attrs = collect_attrs(data, oh, offset_size, length_size)?;

    if let Some(st_msg) = oh.find(object_header::MSG_SYMBOL_TABLE) {
        let mut c = super::Cursor::new(&st_msg.data);
        let child_btree = c.read_uint(offset_size)?;
        let child_heap = c.read_uint(offset_size)?;
        walk_group(data, path, child_btree, child_heap, offset_size, length_size, nodes)?;
        // walk_group inserts the node; merge in the attrs we already parsed.
        if let Some(node) = nodes.get_mut(path) {
            node.attrs = attrs;
        }
        return Ok(());
    }

    let shape = oh
        .find(object_header::MSG_DATASPACE)
        .map(|m| dataspace::parse(&m.data, length_size))
        .transpose()?;
    let dtype = oh
        .find(object_header::MSG_DATATYPE)
        .map(|m| super::datatype::parse(&m.data))
        .transpose()?;
    let layout = oh
        .find(object_header::MSG_DATA_LAYOUT)
        .map(|m| super::layout::parse(&m.data, offset_size, length_size))
        .transpose()?;

    nodes.insert(
        path.to_string(),
        NodeInfo {
            is_group: false,
            children: Vec::new(),
            attrs,
            shape,
            datatype: dtype,
            layout,
        },
    );
    Ok(())
}

fn collect_attrs(
    data: &[u8],
    oh: &object_header::ObjectHeader,
    offset_size: u8,
    length_size: u8,
) -> Result<HashMap<String, AttrValue>> {
    let mut attrs = HashMap::new();
    for msg in oh.find_all(object_header::MSG_ATTRIBUTE) {
        let (name, value) = attribute::parse(&msg.data, data, offset_size, length_size)?;
        attrs.insert(name, value);
    }
    Ok(attrs)
}
