//! LabeledFrame (spec §3 / §4.4).

use super::instance::{LabeledInstance, PredictedInstance};
use super::video::Video;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LabeledFrame {
    pub video: Arc<Video>,
    pub frame_idx: u64,
    pub instances: Vec<LabeledInstance>,
}

impl LabeledFrame {
    /// Predicted instances in this frame not referenced by any user
    /// instance's `from_predicted` (spec §4.4 step 5).
    pub fn unused_predictions(&self) -> Vec<&PredictedInstance> {
        let mut referenced = vec![false; self.instances.len()];
        for inst in &self.instances {
            if let LabeledInstance::User(u) = inst {
                if let Some(idx) = u.from_predicted {
                    if let Some(flag) = referenced.get_mut(idx) {
                        *flag = true;
                    }
                }
            }
        }
        self.instances
            .iter()
            .enumerate()
            .filter_map(|(i, inst)| match inst {
                LabeledInstance::Predicted(p) if !referenced[i] => Some(p),
                _ => None,
            })
            .collect()
    }

    /// True iff all `Predicted` entries precede all `User` entries
    /// (spec §4.4 ordering invariant, testable property #4).
    pub fn predicted_precede_user(&self) -> bool {
        let mut seen_user = false;
        for inst in &self.instances {
            match inst {
                LabeledInstance::User(_) => seen_user = true,
                LabeledInstance::Predicted(_) if seen_user => return false,
                LabeledInstance::Predicted(_) => {}
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::instance::Instance;
    use crate::model::point::{Point, PredictedPoint};
    use crate::model::skeleton::{Node, Skeleton};
    use crate::model::video::Video;

    fn skel() -> Arc<Skeleton> {
        Arc::new(Skeleton::new(None, vec![Node { name: "a".into() }], vec![], vec![]))
    }

    fn vid() -> Arc<Video> {
        Arc::new(Video {
            filename: "x.mp4".into(),
            backend: None,
            shape: None,
            fps: None,
            channel_order: None,
            format: None,
            source_video: None,
        })
    }

    fn pred(skeleton: &Arc<Skeleton>) -> PredictedInstance {
        PredictedInstance {
            skeleton: skeleton.clone(),
            track: None,
            points: vec![PredictedPoint {
                point: Point {
                    x: 0.0,
                    y: 0.0,
                    visible: true,
                    complete: true,
                },
                score: 0.9,
            }],
            score: 0.9,
            tracking_score: None,
        }
    }

    #[test]
    fn unused_predictions_excludes_referenced() {
        let skeleton = skel();
        let frame = LabeledFrame {
            video: vid(),
            frame_idx: 0,
            instances: vec![
                LabeledInstance::Predicted(pred(&skeleton)),
                LabeledInstance::Predicted(pred(&skeleton)),
                LabeledInstance::User(Instance {
                    skeleton: skeleton.clone(),
                    track: None,
                    points: vec![Point {
                        x: 0.0,
                        y: 0.0,
                        visible: true,
                        complete: true,
                    }],
                    from_predicted: Some(1),
                    tracking_score: None,
                }),
            ],
        };
        let unused = frame.unused_predictions();
        assert_eq!(unused.len(), 1);
        assert!(frame.predicted_precede_user());
    }
}
