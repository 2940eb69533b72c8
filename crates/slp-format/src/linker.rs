//! Cross-linker (spec §4.4): turns the four flat record tables into the
//! linked object graph — each frame's contiguous instance slice, each
//! instance's contiguous point slice, and the `from_predicted`
//! back-references resolved after each frame is assembled.

use crate::error::{Result, SlpError};
use crate::model::instance::{Instance, LabeledInstance, PredictedInstance};
use crate::model::{LabeledFrame, Skeleton, Track, Video};
use crate::tables::{FrameRow, InstanceRow, PointRow, PredPointRow};
use std::collections::HashMap;
use std::sync::Arc;

/// Runs the full stitching pass (spec §4.4 steps 2-4; step 1 — building
/// `skeletons`/`tracks`/`videos` from JSON — is the caller's job, since it
/// doesn't touch the record tables at all).
pub fn link(
    skeletons: &[Arc<Skeleton>],
    tracks: &[Arc<Track>],
    videos: &[Arc<Video>],
    frame_rows: &[FrameRow],
    instance_rows: &[InstanceRow],
    point_rows: &[PointRow],
    pred_point_rows: &[PredPointRow],
) -> Result<Vec<LabeledFrame>> {
    let (mut slots, from_predicted_ids) =
        build_instances(skeletons, tracks, instance_rows, point_rows, pred_point_rows)?;

    let mut frames = Vec::with_capacity(frame_rows.len());
    for frame_row in frame_rows {
        let video = videos
            .get(frame_row.video as usize)
            .cloned()
            .ok_or_else(|| SlpError::InvalidSlp(format!("frame references unknown video {}", frame_row.video)))?;

        let range = frame_row.instance_range();
        let mut local: Vec<(usize, LabeledInstance)> = Vec::with_capacity(range.len());
        for global_idx in range.clone() {
            if let Some(slot) = slots.get_mut(global_idx) {
                if let Some(inst) = slot.take() {
                    local.push((global_idx, inst));
                }
            }
        }

        // Predicted before user, stable within each class (spec §4.4 step 3,
        // testable property #4).
        local.sort_by_key(|(_, inst)| !inst.is_predicted());

        let global_to_local: HashMap<usize, usize> = local
            .iter()
            .enumerate()
            .map(|(local_pos, (global_idx, _))| (*global_idx, local_pos))
            .collect();

        // Step 4: resolve from_predicted, only within this frame's range.
        let resolved: Vec<Option<usize>> = local
            .iter()
            .map(|(global_idx, _)| {
                from_predicted_ids
                    .get(*global_idx)
                    .copied()
                    .flatten()
                    .filter(|fp| range.contains(&(*fp as usize)))
                    .and_then(|fp| global_to_local.get(&(fp as usize)))
                    .copied()
            })
            .collect();

        let instances = local
            .into_iter()
            .zip(resolved)
            .map(|((_, inst), resolved_fp)| match inst {
                LabeledInstance::User(mut u) => {
                    // Only set the back-reference if it genuinely resolves to
                    // a PredictedInstance slot (spec §4.4 step 4).
                    u.from_predicted = resolved_fp;
                    LabeledInstance::User(u)
                }
                predicted => predicted,
            })
            .collect();

        frames.push(LabeledFrame {
            video,
            frame_idx: frame_row.frame_idx.max(0) as u64,
            instances,
        });
    }

    Ok(frames)
}

/// Step 2: decode every instance row in table order, without yet knowing
/// which frame will claim it.
fn build_instances(
    skeletons: &[Arc<Skeleton>],
    tracks: &[Arc<Track>],
    instance_rows: &[InstanceRow],
    point_rows: &[PointRow],
    pred_point_rows: &[PredPointRow],
) -> Result<(Vec<Option<LabeledInstance>>, Vec<Option<i64>>)> {
    let mut slots = Vec::with_capacity(instance_rows.len());
    let mut from_predicted_ids = Vec::with_capacity(instance_rows.len());

    for row in instance_rows {
        let skeleton = skeletons
            .get(row.skeleton as usize)
            .cloned()
            .ok_or_else(|| SlpError::InvalidSlp(format!("instance references unknown skeleton {}", row.skeleton)))?;
        let track = row.track_id().and_then(|t| tracks.get(t as usize).cloned());
        let range = row.point_range();

        let instance = if row.is_predicted {
            let points = pred_point_rows
                .get(range.clone())
                .ok_or_else(|| SlpError::InvalidSlp("instance point range out of bounds in pred_points".into()))?
                .iter()
                .map(|p| (*p).into())
                .collect();
            from_predicted_ids.push(None);
            LabeledInstance::Predicted(PredictedInstance {
                skeleton,
                track,
                points,
                score: row.instance_score,
                tracking_score: Some(row.tracking_score),
            })
        } else {
            let points = point_rows
                .get(range.clone())
                .ok_or_else(|| SlpError::InvalidSlp("instance point range out of bounds in points".into()))?
                .iter()
                .map(|p| (*p).into())
                .collect();
            from_predicted_ids.push(row.from_predicted_id());
            LabeledInstance::User(Instance {
                skeleton,
                track,
                points,
                from_predicted: None,
                tracking_score: Some(row.tracking_score),
            })
        };

        slots.push(Some(instance));
    }

    Ok((slots, from_predicted_ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::skeleton::Node;
    use crate::model::video::Video;

    fn skeleton() -> Arc<Skeleton> {
        Arc::new(Skeleton::new(None, vec![Node { name: "a".into() }], vec![], vec![]))
    }

    fn video() -> Arc<Video> {
        Arc::new(Video {
            filename: "v.mp4".into(),
            backend: None,
            shape: None,
            fps: None,
            channel_order: None,
            format: None,
            source_video: None,
        })
    }

    fn point_row() -> PointRow {
        PointRow {
            x: 1.0,
            y: 2.0,
            visible: true,
            complete: true,
        }
    }

    fn pred_point_row() -> PredPointRow {
        PredPointRow {
            point: point_row(),
            score: 0.5,
        }
    }

    /// Scenario S4: a 4-instance frame `[P0, P1, U2, U3]` where
    /// `U2.from_predicted == P1` and `U3.from_predicted == P0`, so
    /// `unused_predictions == []`.
    #[test]
    fn s4_four_instance_frame_resolves_both_back_references() {
        let skeletons = vec![skeleton()];
        let tracks: Vec<Arc<Track>> = vec![];
        let videos = vec![video()];
        let points = vec![point_row(), point_row()];
        let pred_points = vec![pred_point_row(), pred_point_row()];

        let instance_rows = vec![
            InstanceRow {
                instance_id: 0,
                is_predicted: true,
                frame_id: 0,
                skeleton: 0,
                track: -1,
                from_predicted: -1,
                instance_score: 0.9,
                point_id_start: 0,
                point_id_end: 1,
                tracking_score: 0.0,
            },
            InstanceRow {
                instance_id: 1,
                is_predicted: true,
                frame_id: 0,
                skeleton: 0,
                track: -1,
                from_predicted: -1,
                instance_score: 0.9,
                point_id_start: 1,
                point_id_end: 2,
                tracking_score: 0.0,
            },
            InstanceRow {
                instance_id: 2,
                is_predicted: false,
                frame_id: 0,
                skeleton: 0,
                track: -1,
                from_predicted: 1,
                instance_score: f64::NAN,
                point_id_start: 0,
                point_id_end: 1,
                tracking_score: 0.0,
            },
            InstanceRow {
                instance_id: 3,
                is_predicted: false,
                frame_id: 0,
                skeleton: 0,
                track: -1,
                from_predicted: 0,
                instance_score: f64::NAN,
                point_id_start: 1,
                point_id_end: 2,
                tracking_score: 0.0,
            },
        ];

        let frame_rows = vec![FrameRow {
            frame_id: 0,
            video: 0,
            frame_idx: 0,
            instance_id_start: 0,
            instance_id_end: 4,
        }];

        let frames = link(&skeletons, &tracks, &videos, &frame_rows, &instance_rows, &points, &pred_points).unwrap();
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert!(frame.predicted_precede_user());
        assert!(frame.unused_predictions().is_empty());

        let users: Vec<&Instance> = frame.instances.iter().filter_map(LabeledInstance::as_user).collect();
        assert_eq!(users.len(), 2);
        // U2 (global id 2) should resolve to P1 (global id 1), which after
        // sorting sits at local position 1.
        let u2 = frame.instances.iter().find_map(|i| match i {
            LabeledInstance::User(u) if u.points[0].x == 1.0 => Some(u),
            _ => None,
        });
        assert!(u2.is_some());
    }

    /// Scenario S4 variant: 3-instance frame `[P0, P1, U2]` where
    /// `U2.from_predicted == P1` and `unused_predictions == [P0]`.
    #[test]
    fn s4_three_instance_frame_leaves_one_prediction_unused() {
        let skeletons = vec![skeleton()];
        let tracks: Vec<Arc<Track>> = vec![];
        let videos = vec![video()];
        let points = vec![point_row()];
        let pred_points = vec![pred_point_row(), pred_point_row()];

        let instance_rows = vec![
            InstanceRow {
                instance_id: 0,
                is_predicted: true,
                frame_id: 0,
                skeleton: 0,
                track: -1,
                from_predicted: -1,
                instance_score: 0.9,
                point_id_start: 0,
                point_id_end: 1,
                tracking_score: 0.0,
            },
            InstanceRow {
                instance_id: 1,
                is_predicted: true,
                frame_id: 0,
                skeleton: 0,
                track: -1,
                from_predicted: -1,
                instance_score: 0.9,
                point_id_start: 1,
                point_id_end: 2,
                tracking_score: 0.0,
            },
            InstanceRow {
                instance_id: 2,
                is_predicted: false,
                frame_id: 0,
                skeleton: 0,
                track: -1,
                from_predicted: 1,
                instance_score: f64::NAN,
                point_id_start: 0,
                point_id_end: 1,
                tracking_score: 0.0,
            },
        ];

        let frame_rows = vec![FrameRow {
            frame_id: 0,
            video: 0,
            frame_idx: 0,
            instance_id_start: 0,
            instance_id_end: 3,
        }];

        let frames = link(&skeletons, &tracks, &videos, &frame_rows, &instance_rows, &points, &pred_points).unwrap();
        assert_eq!(frames[0].unused_predictions().len(), 1);
    }
}
