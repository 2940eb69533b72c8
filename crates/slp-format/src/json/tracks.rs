//! Tracks decoder (spec §4.2).

use crate::model::Track;
use serde_json::Value;

/// Decodes one `tracks_json` row into a `Track`. Each entry is a JSON
/// array `[_, name]`, an object with `name`, or a bare string.
pub fn decode_track(entry: &Value) -> Track {
    let name = match entry {
        Value::Array(arr) => arr
            .get(1)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| entry.to_string()),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| entry.to_string()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Track::new(name)
}

pub fn decode_tracks(entries: &[Value]) -> Vec<Track> {
    entries.iter().map(decode_track).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_array_shape() {
        let t = decode_track(&json!([123, "fly_1"]));
        assert_eq!(t.name, "fly_1");
    }

    #[test]
    fn decodes_object_shape() {
        let t = decode_track(&json!({"name": "fly_2"}));
        assert_eq!(t.name, "fly_2");
    }

    #[test]
    fn decodes_string_shape() {
        let t = decode_track(&json!("fly_3"));
        assert_eq!(t.name, "fly_3");
    }
}
