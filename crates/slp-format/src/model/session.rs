//! Multi-view linking structures (spec §3 / §4.2): `Camera`, `CameraGroup`,
//! `InstanceGroup`, `FrameGroup`, `RecordingSession`.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Camera {
    pub name: String,
    pub rotation: [f64; 3],
    pub translation: [f64; 3],
    pub matrix: Option<[[f64; 3]; 3]>,
    pub distortions: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct CameraGroup {
    pub cameras: Vec<Camera>,
}

impl CameraGroup {
    pub fn by_name(&self, name: &str) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.name == name)
    }
}

/// Maps each camera (by name) to the position of one `Instance` within
/// that camera's `LabeledFrame` at this `FrameGroup`'s `frame_idx`.
#[derive(Debug, Clone, Default)]
pub struct InstanceGroup {
    pub camera_instances: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct FrameGroup {
    pub frame_idx: u64,
    pub instance_groups: Vec<InstanceGroup>,
}

#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub camera_group: CameraGroup,
    /// Camera name -> index into `Labels::videos`.
    pub camera_to_video: HashMap<String, usize>,
    /// Indexed by frame index, per spec §4.2.
    pub frame_groups: HashMap<u64, FrameGroup>,
    pub metadata: serde_json::Value,
}

impl RecordingSession {
    pub fn video_for_camera(&self, camera: &str) -> Option<usize> {
        self.camera_to_video.get(camera).copied()
    }

    pub fn frame_group(&self, frame_idx: u64) -> Option<&FrameGroup> {
        self.frame_groups.get(&frame_idx)
    }
}
