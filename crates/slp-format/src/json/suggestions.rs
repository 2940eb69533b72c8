//! Suggestions decoder (spec §4.2).

use crate::error::{Result, SlpError};
use crate::model::Suggestion;
use serde_json::Value;

pub fn decode_suggestion(entry: &Value) -> Result<Suggestion> {
    let video_idx = entry
        .get("video")
        .and_then(Value::as_u64)
        .ok_or_else(|| SlpError::InvalidSlp("suggestion missing 'video' index".into()))? as usize;
    let frame_idx = entry
        .get("frame_idx")
        .and_then(Value::as_u64)
        .ok_or_else(|| SlpError::InvalidSlp("suggestion missing 'frame_idx'".into()))?;

    Ok(Suggestion {
        video_idx,
        frame_idx,
        metadata: entry.clone(),
    })
}

pub fn decode_suggestions(entries: &[Value]) -> Result<Vec<Suggestion>> {
    entries.iter().map(decode_suggestion).collect()
}
