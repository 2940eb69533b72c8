//! Sessions decoder (spec §4.2): multi-view calibration.

use crate::error::{Result, SlpError};
use crate::model::session::{Camera, CameraGroup, RecordingSession};
use serde_json::Value;
use std::collections::HashMap;

fn vec3(v: &Value) -> Option<[f64; 3]> {
    let arr = v.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    let mut out = [0.0; 3];
    for (i, el) in arr.iter().enumerate() {
        out[i] = el.as_f64()?;
    }
    Some(out)
}

fn matrix3x3(v: &Value) -> Option<[[f64; 3]; 3]> {
    let rows = v.as_array()?;
    if rows.len() != 3 {
        return None;
    }
    let mut out = [[0.0; 3]; 3];
    for (i, row) in rows.iter().enumerate() {
        out[i] = vec3(row)?;
    }
    Some(out)
}

fn decode_camera(name: &str, entry: &Value) -> Result<Camera> {
    let rotation = entry
        .get("rvec")
        .and_then(vec3)
        .ok_or_else(|| SlpError::InvalidSlp(format!("camera {name} missing 'rvec'")))?;
    let translation = entry
        .get("tvec")
        .and_then(vec3)
        .ok_or_else(|| SlpError::InvalidSlp(format!("camera {name} missing 'tvec'")))?;
    let matrix = entry.get("matrix").and_then(matrix3x3);
    let distortions = entry
        .get("distortions")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_f64).collect());

    Ok(Camera {
        name: name.to_string(),
        rotation,
        translation,
        matrix,
        distortions,
    })
}

pub fn decode_session(entry: &Value) -> Result<RecordingSession> {
    let calibration = entry
        .get("calibration")
        .and_then(Value::as_object)
        .ok_or_else(|| SlpError::InvalidSlp("session missing 'calibration'".into()))?;

    let mut cameras = Vec::new();
    for (key, value) in calibration {
        if key == "metadata" {
            continue;
        }
        cameras.push(decode_camera(key, value)?);
    }

    let camera_to_video: HashMap<String, usize> = entry
        .get("camcorder_to_video_idx_map")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_u64().map(|idx| (k.clone(), idx as usize)))
                .collect()
        })
        .unwrap_or_default();

    let metadata = calibration.get("metadata").cloned().unwrap_or(Value::Null);

    Ok(RecordingSession {
        camera_group: CameraGroup { cameras },
        camera_to_video,
        frame_groups: HashMap::new(),
        metadata,
    })
}

pub fn decode_sessions(entries: &[Value]) -> Result<Vec<RecordingSession>> {
    entries.iter().map(decode_session).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_two_camera_calibration() {
        let entry = json!({
            "calibration": {
                "metadata": {"note": "test rig"},
                "cam0": {"rvec": [0.0, 0.0, 0.0], "tvec": [1.0, 2.0, 3.0]},
                "cam1": {"rvec": [0.1, 0.2, 0.3], "tvec": [4.0, 5.0, 6.0], "distortions": [0.1, 0.2]},
            },
            "camcorder_to_video_idx_map": {"cam0": 0, "cam1": 1},
        });

        let session = decode_session(&entry).unwrap();
        assert_eq!(session.camera_group.cameras.len(), 2);
        assert_eq!(session.video_for_camera("cam1"), Some(1));
        assert!(session.camera_group.by_name("cam1").unwrap().distortions.is_some());
    }
}
