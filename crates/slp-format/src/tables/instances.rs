//! `instances` compound table:
//! `(instance_id, instance_type, frame_id, skeleton, track, from_predicted,
//! instance_score, point_id_start, point_id_end, tracking_score)`.
//!
//! `instance_type ∈ {0: user, 1: predicted}`. Legacy files may lack
//! `tracking_score`, `from_predicted`, or `instance_score`; spec §9 pins
//! their defaults to `0`, `-1` ("not set"), and `NaN` respectively.

use super::{field_bool, field_f64, field_i64, rows};
use slp_core::CompoundLayout;

#[derive(Debug, Clone, Copy)]
pub struct InstanceRow {
    pub instance_id: i64,
    pub is_predicted: bool,
    pub frame_id: i64,
    pub skeleton: i64,
    pub track: i64,
    /// `-1` means "not set", matching the on-disk sentinel.
    pub from_predicted: i64,
    pub instance_score: f64,
    pub point_id_start: i64,
    pub point_id_end: i64,
    pub tracking_score: f64,
}

impl InstanceRow {
    pub fn track_id(&self) -> Option<i64> {
        if self.track < 0 {
            None
        } else {
            Some(self.track)
        }
    }

    pub fn from_predicted_id(&self) -> Option<i64> {
        if self.from_predicted < 0 {
            None
        } else {
            Some(self.from_predicted)
        }
    }

    pub fn point_range(&self) -> std::ops::Range<usize> {
        self.point_id_start.max(0) as usize..self.point_id_end.max(0) as usize
    }
}

pub fn decode_instances(layout: &CompoundLayout, data: &[u8]) -> Vec<InstanceRow> {
    rows(layout, data)
        .map(|row| InstanceRow {
            instance_id: field_i64(layout, row, "instance_id", 0),
            is_predicted: field_bool(layout, row, "instance_type", false),
            frame_id: field_i64(layout, row, "frame_id", 0),
            skeleton: field_i64(layout, row, "skeleton", 0),
            track: field_i64(layout, row, "track", -1),
            from_predicted: field_i64(layout, row, "from_predicted", -1),
            instance_score: field_f64(layout, row, "instance_score", f64::NAN),
            point_id_start: field_i64(layout, row, "point_id_start", 0),
            point_id_end: field_i64(layout, row, "point_id_end", 0),
            tracking_score: field_f64(layout, row, "tracking_score", 0.0),
        })
        .collect()
}
