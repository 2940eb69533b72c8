//! Instance and PredictedInstance (spec §3), plus the `LabeledInstance`
//! enum a `LabeledFrame` actually stores its instances as.

use super::point::{Point, PredictedPoint};
use super::skeleton::Skeleton;
use super::track::Track;
use std::sync::Arc;

/// A full point vector aligned to `skeleton`'s nodes (`points[i]`
/// corresponds to `skeleton.nodes()[i]`), attributed to an animal in one
/// frame by a human annotator.
#[derive(Debug, Clone)]
pub struct Instance {
    pub skeleton: Arc<Skeleton>,
    pub track: Option<Arc<Track>>,
    pub points: Vec<Point>,
    /// Index into the owning `LabeledFrame::instances` of the
    /// `PredictedInstance` this instance was promoted from, if any.
    /// A non-owning back-reference, resolved after frame assembly — never
    /// a cycle, since it can only point at a `LabeledInstance::Predicted`
    /// entry in the very frame that owns this `Instance`.
    pub from_predicted: Option<usize>,
    pub tracking_score: Option<f64>,
}

/// An [`Instance`] produced by a model: points carry per-point confidence
/// and the whole instance carries an overall `score`.
#[derive(Debug, Clone)]
pub struct PredictedInstance {
    pub skeleton: Arc<Skeleton>,
    pub track: Option<Arc<Track>>,
    pub points: Vec<PredictedPoint>,
    pub score: f64,
    pub tracking_score: Option<f64>,
}

/// One entry in a `LabeledFrame`'s instance list. Frames hold a mix of
/// both kinds in one ordered sequence (spec §4.4: predicted before user).
#[derive(Debug, Clone)]
pub enum LabeledInstance {
    Predicted(PredictedInstance),
    User(Instance),
}

impl LabeledInstance {
    pub fn skeleton(&self) -> &Arc<Skeleton> {
        match self {
            LabeledInstance::Predicted(p) => &p.skeleton,
            LabeledInstance::User(u) => &u.skeleton,
        }
    }

    pub fn track(&self) -> Option<&Arc<Track>> {
        match self {
            LabeledInstance::Predicted(p) => p.track.as_ref(),
            LabeledInstance::User(u) => u.track.as_ref(),
        }
    }

    pub fn as_predicted(&self) -> Option<&PredictedInstance> {
        match self {
            LabeledInstance::Predicted(p) => Some(p),
            LabeledInstance::User(_) => None,
        }
    }

    pub fn as_user(&self) -> Option<&Instance> {
        match self {
            LabeledInstance::User(u) => Some(u),
            LabeledInstance::Predicted(_) => None,
        }
    }

    pub fn is_predicted(&self) -> bool {
        matches!(self, LabeledInstance::Predicted(_))
    }
}
