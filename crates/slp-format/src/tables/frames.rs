//! `frames` compound table: `(frame_id, video, frame_idx, instance_id_start, instance_id_end)`.

use super::{field_i64, rows};
use slp_core::CompoundLayout;

#[derive(Debug, Clone, Copy)]
pub struct FrameRow {
    pub frame_id: i64,
    pub video: i64,
    pub frame_idx: i64,
    pub instance_id_start: i64,
    pub instance_id_end: i64,
}

pub fn decode_frames(layout: &CompoundLayout, data: &[u8]) -> Vec<FrameRow> {
    rows(layout, data)
        .map(|row| FrameRow {
            frame_id: field_i64(layout, row, "frame_id", 0),
            video: field_i64(layout, row, "video", 0),
            frame_idx: field_i64(layout, row, "frame_idx", 0),
            instance_id_start: field_i64(layout, row, "instance_id_start", 0),
            instance_id_end: field_i64(layout, row, "instance_id_end", 0),
        })
        .collect()
}

impl FrameRow {
    pub fn instance_range(&self) -> std::ops::Range<usize> {
        self.instance_id_start.max(0) as usize..self.instance_id_end.max(0) as usize
    }
}
