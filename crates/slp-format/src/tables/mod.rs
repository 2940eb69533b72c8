//! Record-table decoders (spec §4.3): `frames`, `instances`, `points`,
//! `pred_points`. Legacy-layout tolerant — a field absent from the
//! compound datatype degrades to its documented default (spec §9) rather
//! than erroring, so older producer versions stay readable.

pub mod frames;
pub mod instances;
pub mod points;

pub use frames::FrameRow;
pub use instances::InstanceRow;
pub use points::{PointRow, PredPointRow};

use slp_core::{CompoundLayout, ScalarType};

/// Reads one row's `name` field as `f64`, widening ints and applying `default`
/// when the field is absent from this file's compound layout (legacy files).
fn field_f64(layout: &CompoundLayout, row: &[u8], name: &str, default: f64) -> f64 {
    match layout.field(name) {
        Some(f) => read_scalar(row, f.offset, f.dtype).unwrap_or(default),
        None => default,
    }
}

fn field_i64(layout: &CompoundLayout, row: &[u8], name: &str, default: i64) -> i64 {
    match layout.field(name) {
        Some(f) => read_scalar(row, f.offset, f.dtype).map(|v| v as i64).unwrap_or(default),
        None => default,
    }
}

fn field_bool(layout: &CompoundLayout, row: &[u8], name: &str, default: bool) -> bool {
    field_i64(layout, row, name, default as i64) != 0
}

fn read_scalar(row: &[u8], offset: usize, dtype: ScalarType) -> Option<f64> {
    let size = dtype.size();
    let bytes = row.get(offset..offset + size)?;
    Some(match dtype {
        ScalarType::I8 => bytes[0] as i8 as f64,
        ScalarType::U8 => bytes[0] as f64,
        ScalarType::I32 => i32::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::U32 => u32::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::I64 => i64::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::U64 => u64::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::F32 => f32::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::F64 => f64::from_le_bytes(bytes.try_into().ok()?),
    })
}

/// Splits a compound dataset's packed row buffer into per-row slices.
fn rows<'a>(layout: &CompoundLayout, data: &'a [u8]) -> impl Iterator<Item = &'a [u8]> {
    data.chunks_exact(layout.row_size)
}
