//! Labels: the document root (spec §3).

use super::frame::LabeledFrame;
use super::provenance::Provenance;
use super::session::RecordingSession;
use super::skeleton::Skeleton;
use super::suggestion::Suggestion;
use super::track::Track;
use super::video::Video;
use std::sync::Arc;

/// The root in-memory document produced by a load. Owns every skeleton,
/// video, track, labeled frame, session, and suggestion; everything else
/// (instances, points, cameras, ...) is owned transitively by one of
/// these. Immutable once loading completes (spec §3) — mutation is a
/// downstream editor's concern, not this crate's.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    pub skeletons: Vec<Arc<Skeleton>>,
    pub videos: Vec<Arc<Video>>,
    pub tracks: Vec<Arc<Track>>,
    pub labeled_frames: Vec<LabeledFrame>,
    pub suggestions: Vec<Suggestion>,
    pub sessions: Vec<RecordingSession>,
    pub provenance: Provenance,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the cross-reference invariants spec §3/§8 require after a
    /// load. Used by integration tests; not called on the hot load path.
    pub fn check_invariants(&self) -> Result<(), String> {
        for frame in &self.labeled_frames {
            if !self.videos.iter().any(|v| Arc::ptr_eq(v, &frame.video)) {
                return Err("LabeledFrame.video not in Labels.videos".into());
            }
            if !frame.predicted_precede_user() {
                return Err("predicted instances must precede user instances".into());
            }
            for inst in &frame.instances {
                if !self.skeletons.iter().any(|s| Arc::ptr_eq(s, inst.skeleton())) {
                    return Err("Instance.skeleton not in Labels.skeletons".into());
                }
                if let Some(track) = inst.track() {
                    if !self.tracks.iter().any(|t| Arc::ptr_eq(t, track)) {
                        return Err("Instance.track not in Labels.tracks".into());
                    }
                }
                if let super::instance::LabeledInstance::User(u) = inst {
                    if let Some(idx) = u.from_predicted {
                        match frame.instances.get(idx) {
                            Some(super::instance::LabeledInstance::Predicted(_)) => {}
                            _ => return Err("from_predicted does not point at a PredictedInstance in the same frame".into()),
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
