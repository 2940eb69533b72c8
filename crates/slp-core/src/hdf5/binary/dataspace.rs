//! Dataspace message parsing — the dimension sizes of a dataset.

use super::Cursor;
use crate::error::Result;
use crate::hdf5::Shape;

const FLAG_MAX_DIMS: u8 = 0x1;

pub fn parse(data: &[u8], length_size: u8) -> Result<Shape> {
    let mut c = Cursor::new(data);
    let version = c.read_u8()?;
    let rank = c.read_u8()? as usize;
    let flags = c.read_u8()?;
    if version == 1 {
        c.skip(5)?; // reserved
    } else {
        c.skip(1)?; // dataspace type, version >= 2
    }

    let mut dims = Vec::with_capacity(rank);
    for _ in 0..rank {
        dims.push(c.read_uint(length_size)?);
    }
    if flags & FLAG_MAX_DIMS != 0 {
        for _ in 0..rank {
            let _max = c.read_uint(length_size)?;
        }
    }

    Ok(Shape(dims))
}
