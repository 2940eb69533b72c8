//! Suggestion (spec §3 / §4.2).

#[derive(Debug, Clone)]
pub struct Suggestion {
    pub video_idx: usize,
    pub frame_idx: u64,
    pub metadata: serde_json::Value,
}
