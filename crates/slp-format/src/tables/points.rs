//! `points` and `pred_points` compound tables.

use super::{field_bool, field_f64, rows};
use crate::model::point::{Point, PredictedPoint};
use slp_core::CompoundLayout;

#[derive(Debug, Clone, Copy)]
pub struct PointRow {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
    pub complete: bool,
}

impl From<PointRow> for Point {
    fn from(r: PointRow) -> Self {
        Point {
            x: r.x,
            y: r.y,
            visible: r.visible,
            complete: r.complete,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PredPointRow {
    pub point: PointRow,
    pub score: f64,
}

impl From<PredPointRow> for PredictedPoint {
    fn from(r: PredPointRow) -> Self {
        PredictedPoint {
            point: r.point.into(),
            score: r.score,
        }
    }
}

pub fn decode_points(layout: &CompoundLayout, data: &[u8]) -> Vec<PointRow> {
    rows(layout, data)
        .map(|row| PointRow {
            x: field_f64(layout, row, "x", f64::NAN),
            y: field_f64(layout, row, "y", f64::NAN),
            visible: field_bool(layout, row, "visible", false),
            complete: field_bool(layout, row, "complete", false),
        })
        .collect()
}

pub fn decode_pred_points(layout: &CompoundLayout, data: &[u8]) -> Vec<PredPointRow> {
    rows(layout, data)
        .map(|row| PredPointRow {
            point: PointRow {
                x: field_f64(layout, row, "x", f64::NAN),
                y: field_f64(layout, row, "y", f64::NAN),
                visible: field_bool(layout, row, "visible", false),
                complete: field_bool(layout, row, "complete", false),
            },
            score: field_f64(layout, row, "score", f64::NAN),
        })
        .collect()
}
