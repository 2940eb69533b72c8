//! Metadata-only ("lite") loader (spec §4.6): JSON decoders plus dataset
//! shapes only, skipping compound-record decoding entirely so it works
//! over backends that cannot read compound types (e.g. a streaming
//! backend mid-fallback, or a deliberately shape-only transport).

use crate::config::LoaderConfig;
use crate::error::{Result, SlpError};
use crate::json;
use crate::model::{Provenance, RecordingSession, Skeleton, Suggestion, Track};
use serde_json::Value;
use slp_core::{AttrValue, Hdf5Source};

/// HDF5 magic: the first 8 bytes of every valid HDF5 file (spec §4.6,
/// §8 testable property #6).
pub const HDF5_MAGIC: [u8; 8] = [0x89, 0x48, 0x44, 0x46, 0x0D, 0x0A, 0x1A, 0x0A];

/// Required root keys for any loadable SLP file (spec §6).
const REQUIRED_ROOT_KEYS: &[&str] = &["metadata", "frames", "instances", "points"];

/// Row counts the lite loader can answer without reading compound record
/// values, from dataset shapes alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteCounts {
    pub frames: u64,
    pub instances: u64,
    pub points: u64,
    pub pred_points: u64,
}

/// The lite loader's result: everything `load_slp` would produce except
/// the linked `LabeledFrame`/`Instance` object graph.
#[derive(Debug, Clone)]
pub struct LiteLabels {
    pub format_id: f64,
    pub provenance: Provenance,
    pub skeletons: Vec<Skeleton>,
    pub tracks: Vec<Track>,
    pub videos: Vec<crate::model::Video>,
    pub suggestions: Vec<Suggestion>,
    pub sessions: Vec<RecordingSession>,
    pub counts: LiteCounts,
    pub has_embedded_images: bool,
}

/// `isHdf5Buffer` (spec §4.6 / §8 property #6): checks the first 8 bytes
/// against the HDF5 magic. Never panics on a short buffer.
pub fn is_hdf5_buffer(bytes: &[u8]) -> bool {
    bytes.len() >= HDF5_MAGIC.len() && bytes[..HDF5_MAGIC.len()] == HDF5_MAGIC
}

/// `validateSlpBuffer` (spec §4.6): the required-root-key check plus
/// presence of `metadata.attrs.json`, without raising on anything —
/// spec §8 property #7 requires `validate == true ⇒ loadSlpMetadata`
/// doesn't raise `InvalidSlp`, so this intentionally mirrors
/// `load_slp_lite`'s own required-key check.
pub async fn validate_slp_buffer(source: &dyn Hdf5Source) -> Result<bool> {
    for key in REQUIRED_ROOT_KEYS {
        if source.get(key).await?.is_none() {
            return Ok(false);
        }
    }
    let Some(metadata) = source.get("metadata").await? else {
        return Ok(false);
    };
    let attrs = source.attrs(&metadata).await?;
    Ok(attrs.contains_key("json"))
}

/// Loads only the JSON descriptors and dataset shapes. Throws
/// `InvalidSlp` if any of `{metadata, frames, instances, points}` is
/// absent (spec §4.6).
pub async fn load_slp_lite(source: &dyn Hdf5Source, config: &LoaderConfig) -> Result<LiteLabels> {
    for key in REQUIRED_ROOT_KEYS {
        if source.get(key).await?.is_none() {
            return Err(SlpError::InvalidSlp(format!("required root key {key:?} is absent")));
        }
    }

    let metadata_item = source
        .get("metadata")
        .await?
        .ok_or_else(|| SlpError::InvalidSlp("required root key \"metadata\" is absent".into()))?;
    let attrs = source.attrs(&metadata_item).await?;

    let format_id = attrs.get("format_id").and_then(AttrValue::as_f64).unwrap_or(0.0);

    let json_attr = attrs
        .get("json")
        .ok_or_else(|| SlpError::InvalidSlp("metadata.attrs.json is absent".into()))?;
    let metadata_json = json::decode_json_attribute(json_attr)?;

    let provenance = metadata_json
        .get("provenance")
        .and_then(Value::as_object)
        .map(|m| Provenance(m.clone().into_iter().collect()))
        .unwrap_or_default();

    let skeletons = json::skeleton::decode_skeletons(&metadata_json)?;

    let host_path = config.filename_hint.clone().unwrap_or_default();
    let tracks = read_json_rows(source, "tracks_json")
        .await?
        .map(|rows| json::tracks::decode_tracks(&rows))
        .unwrap_or_default();
    let videos = read_json_rows(source, "videos_json")
        .await?
        .map(|rows| json::videos::decode_videos(&rows, &host_path))
        .unwrap_or_default();
    let suggestions = match read_json_rows(source, "suggestions_json").await? {
        Some(rows) => json::suggestions::decode_suggestions(&rows)?,
        None => Vec::new(),
    };
    let sessions = match read_json_rows(source, "sessions_json").await? {
        Some(rows) => json::sessions::decode_sessions(&rows)?,
        None => Vec::new(),
    };

    let has_embedded_images = videos.iter().any(|v| v.is_embedded());

    let counts = LiteCounts {
        frames: dataset_row_count(source, "frames").await?,
        instances: dataset_row_count(source, "instances").await?,
        points: dataset_row_count(source, "points").await?,
        pred_points: dataset_row_count(source, "pred_points").await?,
    };

    Ok(LiteLabels {
        format_id,
        provenance,
        skeletons,
        tracks,
        videos,
        suggestions,
        sessions,
        counts,
        has_embedded_images,
    })
}

async fn dataset_row_count(source: &dyn Hdf5Source, path: &str) -> Result<u64> {
    let Some(item) = source.get(path).await? else {
        return Ok(0);
    };
    Ok(source.shape(&item).await?.map(|s| s.rows()).unwrap_or(0))
}

/// Reads a root dataset whose rows are each an independent JSON blob
/// (`tracks_json`, `videos_json`, `suggestions_json`, `sessions_json`),
/// returning `None` if the dataset is absent (these are all optional per
/// spec §6).
async fn read_json_rows(source: &dyn Hdf5Source, path: &str) -> Result<Option<Vec<Value>>> {
    let Some(item) = source.get(path).await? else {
        return Ok(None);
    };
    match source.value(&item).await? {
        slp_core::DatasetValue::VlenBytes(rows) => {
            rows.iter().map(|b| json::decode_json_bytes(b)).collect::<Result<Vec<_>>>().map(Some)
        }
        slp_core::DatasetValue::Raw(bytes) => {
            let value = json::decode_json_bytes(&bytes)?;
            match value {
                Value::Array(arr) => Ok(Some(arr)),
                other => Ok(Some(vec![other])),
            }
        }
        slp_core::DatasetValue::Compound { .. } => Err(SlpError::UnsupportedDataset(format!(
            "{path} is a compound dataset, expected JSON rows"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hdf5_magic_detection() {
        let good = [0x89u8, 0x48, 0x44, 0x46, 0x0D, 0x0A, 0x1A, 0x0A, 0xFF];
        assert!(is_hdf5_buffer(&good));

        let bad = [0u8; 16];
        assert!(!is_hdf5_buffer(&bad));

        let short = [0x89u8, 0x48, 0x44];
        assert!(!is_hdf5_buffer(&short));
    }
}
