//! Attribute message parsing (v1 encoding).

use super::datatype::{self, Datatype};
use super::{align8, global_heap, Cursor};
use crate::error::Result;
use crate::hdf5::AttrValue;

pub fn parse(data: &[u8], file_data: &[u8], offset_size: u8, length_size: u8) -> Result<(String, AttrValue)> {
    let mut c = Cursor::new(data);
    let _version = c.read_u8()?;
    c.skip(1)?; // reserved
    let name_size = c.read_u16()? as usize;
    let datatype_size = c.read_u16()? as usize;
    let dataspace_size = c.read_u16()? as usize;

    let name_start = c.position();
    let name = Cursor::at(data, name_start).read_cstr()?;
    c.seek(name_start + align8(name_size));

    let datatype_start = c.position();
    let dtype = datatype::parse(&data[datatype_start..datatype_start + datatype_size])?;
    c.seek(datatype_start + align8(datatype_size));

    // Dataspace isn't needed for scalar attribute decoding (our callers
    // only ever read whole-attribute string/JSON blobs or single numbers),
    // so we skip past it without parsing dimensions.
    c.skip(align8(dataspace_size))?;

    let raw = c.rest();
    let value = decode_value(&dtype, raw, file_data, offset_size, length_size)?;
    Ok((name, value))
}

fn decode_value(
    dtype: &Datatype,
    raw: &[u8],
    file_data: &[u8],
    offset_size: u8,
    length_size: u8,
) -> Result<AttrValue> {
    match dtype {
        Datatype::Scalar(s) => {
            let mut c = Cursor::new(raw);
            Ok(match s {
                crate::hdf5::ScalarType::F32 => AttrValue::Float(c.read_f32()? as f64),
                crate::hdf5::ScalarType::F64 => AttrValue::Float(c.read_f64()?),
                crate::hdf5::ScalarType::I8 => AttrValue::Int(c.read_u8()? as i8 as i64),
                crate::hdf5::ScalarType::U8 => AttrValue::Int(c.read_u8()? as i64),
                crate::hdf5::ScalarType::I32 => AttrValue::Int(c.read_u32()? as i32 as i64),
                crate::hdf5::ScalarType::U32 => AttrValue::Int(c.read_u32()? as i64),
                crate::hdf5::ScalarType::I64 => AttrValue::Int(c.read_u64()? as i64),
                crate::hdf5::ScalarType::U64 => AttrValue::Int(c.read_u64()? as i64),
            })
        }
        Datatype::FixedString { size } => {
            let end = (*size).min(raw.len());
            Ok(AttrValue::Str(
                String::from_utf8_lossy(&raw[..end]).to_string(),
            ))
        }
        Datatype::VlenString => {
            let desc = global_heap::parse_descriptor(raw, length_size, offset_size)?;
            let bytes = global_heap::resolve(file_data, &desc, length_size)?;
            Ok(AttrValue::Str(String::from_utf8_lossy(&bytes).to_string()))
        }
        Datatype::VlenSequence { .. } => {
            let desc = global_heap::parse_descriptor(raw, length_size, offset_size)?;
            let bytes = global_heap::resolve(file_data, &desc, length_size)?;
            Ok(AttrValue::Bytes(bytes))
        }
        Datatype::Compound(_) => Ok(AttrValue::Bytes(raw.to_vec())),
    }
}
