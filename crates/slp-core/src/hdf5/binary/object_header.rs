//! Version-1 object header parsing: the list of typed messages attached
//! to a group or dataset (dataspace, datatype, data layout, attributes,
//! the legacy symbol-table pointer, ...).

use super::{align8, Cursor};
use crate::error::{Hdf5Error, Result};

pub const MSG_DATASPACE: u16 = 0x0001;
pub const MSG_DATATYPE: u16 = 0x0003;
pub const MSG_DATA_LAYOUT: u16 = 0x0008;
pub const MSG_SYMBOL_TABLE: u16 = 0x0011;
pub const MSG_ATTRIBUTE: u16 = 0x000C;
pub const MSG_CONTINUATION: u16 = 0x0010;

/// A single raw message: its type code and the (already-sliced) payload.
#[derive(Debug, Clone)]
pub struct Message {
    pub msg_type: u16,
    pub data: Vec<u8>,
}

pub struct ObjectHeader {
    pub messages: Vec<Message>,
}

impl ObjectHeader {
    pub fn find(&self, msg_type: u16) -> Option<&Message> {
        self.messages.iter().find(|m| m.msg_type == msg_type)
    }

    pub fn find_all(&self, msg_type: u16) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.msg_type == msg_type)
    }
}

/// Parses the object header at `addr`. Follows continuation messages so
/// the returned list is the object's complete message set.
pub fn parse(data: &[u8], addr: u64, offset_size: u8, length_size: u8) -> Result<ObjectHeader> {
    let mut messages = Vec::new();
    let mut c = Cursor::at(data, addr as usize);

    let version = c.read_u8()?;
    if version != 1 {
        return Err(Hdf5Error::UnsupportedDataset(format!(
            "object header version {version} not supported (expected v1)"
        )));
    }
    c.skip(1)?; // reserved
    let mut num_messages = c.read_u16()? as u32;
    let _ref_count = c.read_u32()?;
    let header_size = c.read_u32()? as usize;
    c.skip(4)?; // padding to 8-byte alignment

    let mut block_start = c.position();
    let mut block_end = block_start + header_size;

    loop {
        let mut pos = block_start;
        while pos + 8 <= block_end && num_messages > 0 {
            let mut mc = Cursor::at(data, pos);
            let msg_type = mc.read_u16()?;
            let size = mc.read_u16()? as usize;
            let _flags = mc.read_u8()?;
            mc.skip(3)?; // reserved
            let payload_start = mc.position();
            if payload_start + size > data.len() {
                return Err(Hdf5Error::UnexpectedEof(payload_start as u64));
            }
            let payload = data[payload_start..payload_start + size].to_vec();
            pos = payload_start + align8(size);
            num_messages = num_messages.saturating_sub(1);

            if msg_type == MSG_CONTINUATION {
                let mut cc = Cursor::new(&payload);
                let cont_addr = cc.read_uint(offset_size)?;
                let cont_len = cc.read_uint(length_size)?;
                block_start = cont_addr as usize;
                block_end = block_start + cont_len as usize;
                // Restart scanning at the continuation block.
                pos = usize::MAX;
                messages.push(Message { msg_type, data: payload });
                break;
            }

            messages.push(Message { msg_type, data: payload });
        }

        if pos == usize::MAX {
            continue;
        }
        break;
    }

    Ok(ObjectHeader { messages })
}
