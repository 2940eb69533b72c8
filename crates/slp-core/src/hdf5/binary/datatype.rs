//! Datatype message parsing.
//!
//! Supports exactly the classes the SLP schema uses: fixed-point and
//! floating-point scalars, fixed and variable-length strings, compound
//! records, and variable-length sequences (the vlen-encoded embedded
//! video frame blobs).

use super::Cursor;
use crate::error::{Hdf5Error, Result};
use crate::hdf5::{CompoundField, CompoundLayout, ScalarType};

const CLASS_FIXED_POINT: u8 = 0;
const CLASS_FLOATING_POINT: u8 = 1;
const CLASS_STRING: u8 = 3;
const CLASS_COMPOUND: u8 = 6;
const CLASS_VLEN: u8 = 9;

#[derive(Debug, Clone)]
pub enum Datatype {
    Scalar(ScalarType),
    FixedString { size: usize },
    VlenString,
    VlenSequence { element_size: usize },
    Compound(CompoundLayout),
}

pub fn parse(data: &[u8]) -> Result<Datatype> {
    let mut c = Cursor::new(data);
    let class_and_version = c.read_u8()?;
    let class = class_and_version & 0x0F;
    let bitfield = c.read_bytes(3)?;
    let size = c.read_u32()? as usize;

    match class {
        CLASS_FIXED_POINT => {
            let signed = bitfield[0] & 0x08 != 0;
            Ok(Datatype::Scalar(scalar_for_int(size, signed)?))
        }
        CLASS_FLOATING_POINT => Ok(Datatype::Scalar(scalar_for_float(size)?)),
        CLASS_STRING => Ok(Datatype::FixedString { size }),
        CLASS_VLEN => {
            let vlen_type = bitfield[0] & 0x0F;
            if vlen_type == 1 {
                Ok(Datatype::VlenString)
            } else {
                // Nested base-type message describes the element; we only
                // need its byte width for vlen byte-blob datasets.
                let base = parse(&data[c.position()..])?;
                let element_size = match base {
                    Datatype::Scalar(s) => s.size(),
                    _ => 1,
                };
                Ok(Datatype::VlenSequence { element_size })
            }
        }
        CLASS_COMPOUND => parse_compound(&mut c, size),
        other => Err(Hdf5Error::UnsupportedDataset(format!(
            "unsupported HDF5 datatype class {other}"
        ))),
    }
}

fn scalar_for_int(size: usize, signed: bool) -> Result<ScalarType> {
    match (size, signed) {
        (1, true) => Ok(ScalarType::I8),
        (1, false) => Ok(ScalarType::U8),
        (4, true) => Ok(ScalarType::I32),
        (4, false) => Ok(ScalarType::U32),
        (8, true) => Ok(ScalarType::I64),
        (8, false) => Ok(ScalarType::U64),
        _ => Err(Hdf5Error::UnsupportedDataset(format!(
            "unsupported integer width {size}"
        ))),
    }
}

fn scalar_for_float(size: usize) -> Result<ScalarType> {
    match size {
        4 => Ok(ScalarType::F32),
        8 => Ok(ScalarType::F64),
        _ => Err(Hdf5Error::UnsupportedDataset(format!(
            "unsupported float width {size}"
        ))),
    }
}

/// Parses a v3-style compound datatype: a compact member list with
/// NUL-terminated names and minimal-width byte offsets.
fn parse_compound(c: &mut Cursor<'_>, total_size: usize) -> Result<Datatype> {
    // bit 0-15 of the datatype's own bit field (already consumed) hold the
    // member count for v1/v2; v3 instead infers it by scanning until the
    // accumulated member sizes exhaust `total_size`. We take the v3 route
    // since it matches the writer used for the rest of this format.
    let mut fields = Vec::new();
    let mut consumed = 0usize;
    let offset_width = int_width_for(total_size);

    while consumed < total_size {
        let name = c.read_cstr()?;
        let offset = c.read_uint(offset_width as u8)? as usize;
        let member_type_start = c.position();
        let member = parse(&c_remaining(c))?;
        let member_size = member_byte_size(&member);
        // Advance the cursor past the nested datatype message. We don't
        // track its exact encoded length bit-for-bit; instead we re-derive
        // it from the member's own `size` field, which is exactly what a
        // well-formed writer emits for scalar/string members (the only
        // member kinds the SLP schema uses).
        c.seek(member_type_start + 8);

        let dtype = match member {
            Datatype::Scalar(s) => s,
            _ => {
                return Err(Hdf5Error::UnsupportedDataset(
                    "nested non-scalar compound members are not supported".into(),
                ))
            }
        };

        fields.push(CompoundField {
            name,
            offset,
            dtype,
        });
        consumed = offset + member_size;
    }

    Ok(Datatype::Compound(CompoundLayout {
        fields,
        row_size: total_size,
    }))
}

fn c_remaining<'a>(c: &Cursor<'a>) -> &'a [u8] {
    // SAFETY-free helper: Cursor doesn't expose its backing slice publicly
    // beyond `take`, so datatype parsing re-derives member size from the
    // 4-byte size field it just read rather than needing full remaining
    // access; this wrapper exists only to keep `parse` callable uniformly.
    c.rest()
}

fn member_byte_size(dt: &Datatype) -> usize {
    match dt {
        Datatype::Scalar(s) => s.size(),
        Datatype::FixedString { size } => *size,
        Datatype::VlenString | Datatype::VlenSequence { .. } => 16, // vlen descriptor width
        Datatype::Compound(layout) => layout.row_size,
    }
}

fn int_width_for(total_size: usize) -> usize {
    if total_size <= 0xFF {
        1
    } else if total_size <= 0xFFFF {
        2
    } else if total_size <= 0xFFFF_FFFF {
        4
    } else {
        8
    }
}
