//! Videos decoder (spec §4.2).

use crate::model::video::{ChannelOrder, Video, VideoBackend};
use serde_json::Value;

/// Decodes one `videos_json` entry. `host_path` replaces an embedded `"."`
/// filename (spec §4.2), resolved from either the loader's real file path
/// or `LoaderConfig::filename_hint` when loading from a buffer.
pub fn decode_video(entry: &Value, host_path: &str) -> Video {
    let backend_json = entry.get("backend");

    let raw_filename = backend_json
        .and_then(|b| b.get("filename"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let dataset = backend_json
        .and_then(|b| b.get("dataset"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let format = backend_json
        .and_then(|b| b.get("format"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let shape = backend_json
        .and_then(|b| b.get("shape"))
        .and_then(Value::as_array)
        .and_then(|arr| {
            if arr.len() == 4 {
                let mut out = [0u64; 4];
                for (i, v) in arr.iter().enumerate() {
                    out[i] = v.as_u64()?;
                }
                Some(out)
            } else {
                None
            }
        });

    let fps = backend_json.and_then(|b| b.get("fps")).and_then(Value::as_f64);

    let channel_order = backend_json
        .and_then(|b| b.get("channel_order"))
        .and_then(Value::as_str)
        .map(|s| {
            if s.eq_ignore_ascii_case("bgr") {
                ChannelOrder::Bgr
            } else {
                ChannelOrder::Rgb
            }
        });

    let embedded = raw_filename == ".";
    let filename = if embedded { host_path.to_string() } else { raw_filename };

    let backend = if embedded {
        dataset.map(|d| VideoBackend::Embedded { dataset: d }).or(Some(VideoBackend::Embedded {
            dataset: String::new(),
        }))
    } else if backend_json.is_some() {
        Some(VideoBackend::External)
    } else {
        None
    };

    let source_video = entry
        .get("source_video")
        .map(|sv| Box::new(decode_video(sv, host_path)));

    Video {
        filename,
        backend,
        shape,
        fps,
        channel_order,
        format,
        source_video,
    }
}

pub fn decode_videos(entries: &[Value], host_path: &str) -> Vec<Video> {
    entries.iter().map(|e| decode_video(e, host_path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_dot_filename_resolves_to_host_path() {
        let entry = json!({"backend": {"filename": ".", "dataset": "/video0/video", "format": "png"}});
        let video = decode_video(&entry, "session.slp");
        assert_eq!(video.filename, "session.slp");
        assert!(video.is_embedded());
    }

    #[test]
    fn external_filename_is_kept_verbatim() {
        let entry = json!({"backend": {"filename": "clip.mp4"}});
        let video = decode_video(&entry, "session.slp");
        assert_eq!(video.filename, "clip.mp4");
        assert!(!video.is_embedded());
    }
}
