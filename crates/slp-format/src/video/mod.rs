//! Embedded video backend (spec §4.5): serves frames stored inside the
//! host SLP file's own HDF5 container, in one of two on-disk layouts.
//!
//! Grounded in the teacher's `ThumbnailService` (bitvue): a populate-once
//! cache in front of a decode step, with FIFO eviction once a capacity is
//! configured, generalized here from a file-path keyed thumbnail cache to
//! a frame-position keyed decoded-bitmap cache.

pub mod magic;

use self::magic::ImageMagic;
use crate::error::{Result, SlpError};
use crate::model::video::{ChannelOrder, Video};
use bytes::Bytes;
use image::{DynamicImage, RgbaImage};
use slp_core::{DatasetValue, Hdf5Source};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

/// How encoded frame payloads are laid out inside the dataset value.
enum FrameLayout {
    /// One independent byte blob per frame (spec §4.5 "vlen-array").
    Vlen(Vec<Bytes>),
    /// All frames concatenated in one buffer, located by magic-byte scan
    /// (spec §4.5 "contiguous buffer").
    Contiguous {
        buffer: Bytes,
        offsets: Vec<usize>,
        magic: ImageMagic,
    },
    /// Raw (unencoded) pixel buffer, one frame's worth of `H*W*C` bytes
    /// back to back.
    RawPixels { buffer: Bytes, frame_bytes: usize },
}

impl FrameLayout {
    fn frame_count(&self) -> usize {
        match self {
            FrameLayout::Vlen(frames) => frames.len(),
            FrameLayout::Contiguous { offsets, .. } => offsets.len(),
            FrameLayout::RawPixels { buffer, frame_bytes } => {
                if *frame_bytes == 0 {
                    0
                } else {
                    buffer.len() / frame_bytes
                }
            }
        }
    }

    fn encoded_frame_bytes(&self, position: usize) -> Option<&[u8]> {
        match self {
            FrameLayout::Vlen(frames) => frames.get(position).map(|b| b.as_ref()),
            FrameLayout::Contiguous { buffer, offsets, .. } => {
                let start = *offsets.get(position)?;
                let end = offsets.get(position + 1).copied().unwrap_or(buffer.len());
                buffer.get(start..end)
            }
            FrameLayout::RawPixels { .. } => None,
        }
    }
}

struct DecodedCache {
    entries: HashMap<usize, Arc<RgbaImage>>,
    order: VecDeque<usize>,
    capacity: Option<usize>,
}

impl DecodedCache {
    fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, position: usize) -> Option<Arc<RgbaImage>> {
        self.entries.get(&position).cloned()
    }

    /// First-request-wins: if another caller raced us and already inserted
    /// this position, keep theirs rather than displacing it.
    fn insert(&mut self, position: usize, image: Arc<RgbaImage>) -> Arc<RgbaImage> {
        if let Some(existing) = self.entries.get(&position) {
            return existing.clone();
        }
        if let Some(cap) = self.capacity {
            while self.entries.len() >= cap {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                } else {
                    break;
                }
            }
        }
        self.order.push_back(position);
        self.entries.insert(position, image.clone());
        image
    }
}

/// Serves frames for one [`Video`] whose backend is `Embedded`.
///
/// The dataset value is fetched once (idempotent populate-once, first
/// request wins) and retained until `close()` drops this backend.
pub struct EmbeddedVideoBackend {
    source: Arc<dyn Hdf5Source>,
    dataset: String,
    format: Option<String>,
    declared_frames: Option<u64>,
    shape: Option<[u64; 4]>,
    channel_order: Option<ChannelOrder>,
    frame_numbers: OnceCell<Option<Vec<i64>>>,
    layout: OnceCell<FrameLayout>,
    cache: Mutex<DecodedCache>,
}

impl EmbeddedVideoBackend {
    pub fn new(source: Arc<dyn Hdf5Source>, video: &Video, dataset: String) -> Self {
        Self::with_cache_capacity(source, video, dataset, None)
    }

    pub fn with_cache_capacity(
        source: Arc<dyn Hdf5Source>,
        video: &Video,
        dataset: String,
        cache_capacity: Option<usize>,
    ) -> Self {
        Self {
            source,
            dataset,
            format: video.format.clone(),
            declared_frames: video.shape.map(|s| s[0]),
            shape: video.shape,
            channel_order: video.channel_order,
            frame_numbers: OnceCell::new(),
            layout: OnceCell::new(),
            cache: Mutex::new(DecodedCache::new(cache_capacity)),
        }
    }

    pub fn frame_count(&self) -> Option<u64> {
        self.declared_frames
    }

    async fn frame_numbers(&self) -> Result<&Option<Vec<i64>>> {
        self.frame_numbers
            .get_or_try_init(|| self.load_frame_numbers())
            .await
    }

    async fn load_frame_numbers(&self) -> Result<Option<Vec<i64>>> {
        let parent = self.dataset.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
        let path = format!("{parent}/frame_numbers");
        let Some(item) = self.source.get(&path).await? else {
            return Ok(None);
        };
        match self.source.value(&item).await? {
            DatasetValue::Raw(bytes) => Ok(Some(decode_i64_array(&bytes))),
            _ => Ok(None),
        }
    }

    /// Maps an external (user-facing) frame index to its position within
    /// the dataset's storage order. Identity when `frameNumbers` is absent
    /// (spec §4.5).
    async fn resolve_position(&self, external_idx: u64) -> Result<Option<usize>> {
        match self.frame_numbers().await? {
            Some(numbers) => Ok(numbers
                .iter()
                .position(|&n| n == external_idx as i64)),
            None => Ok(Some(external_idx as usize)),
        }
    }

    async fn layout(&self) -> Result<&FrameLayout> {
        self.layout.get_or_try_init(|| self.load_layout()).await
    }

    async fn load_layout(&self) -> Result<FrameLayout> {
        let item = self
            .source
            .get(&self.dataset)
            .await?
            .ok_or_else(|| SlpError::InvalidSlp(format!("embedded video dataset {} not found", self.dataset)))?;
        let value = self.source.value(&item).await?;

        match value {
            DatasetValue::VlenBytes(frames) => {
                debug!(dataset = %self.dataset, count = frames.len(), "embedded video: vlen-array layout");
                Ok(FrameLayout::Vlen(frames))
            }
            DatasetValue::Raw(buffer) => {
                if let Some(magic) =
                    magic::looks_contiguous(&buffer, self.format.as_deref(), self.declared_frames)
                {
                    let expected = self.declared_frames.unwrap_or(u64::MAX) as usize;
                    let offsets = magic::scan_frame_offsets(&buffer, magic, expected.max(1));
                    debug!(
                        dataset = %self.dataset,
                        count = offsets.len(),
                        "embedded video: contiguous-buffer layout"
                    );
                    Ok(FrameLayout::Contiguous { buffer, offsets, magic })
                } else if self.format.is_none() || self.format.as_deref() == Some("") {
                    let shape = self
                        .shape
                        .ok_or_else(|| SlpError::InvalidSlp("raw embedded video missing shape".into()))?;
                    let frame_bytes = (shape[1] * shape[2] * shape[3]) as usize;
                    debug!(dataset = %self.dataset, frame_bytes, "embedded video: raw pixel layout");
                    Ok(FrameLayout::RawPixels { buffer, frame_bytes })
                } else {
                    Err(SlpError::UnsupportedDataset(format!(
                        "embedded video dataset {} is neither vlen nor a recognizable contiguous buffer",
                        self.dataset
                    )))
                }
            }
            DatasetValue::Compound { .. } => Err(SlpError::UnsupportedDataset(format!(
                "embedded video dataset {} is a compound type",
                self.dataset
            ))),
        }
    }

    /// Decodes one frame by external index. Non-fatal on a single bad
    /// frame (spec §7): returns `Ok(None)` rather than propagating, except
    /// when the whole dataset/layout itself is unreadable.
    pub async fn get_frame(&self, external_idx: u64) -> Result<Option<Arc<RgbaImage>>> {
        let Some(position) = self.resolve_position(external_idx).await? else {
            return Ok(None);
        };

        if let Some(cached) = self.cache.lock().await.get(position) {
            return Ok(Some(cached));
        }

        let layout = self.layout().await?;
        if position >= layout.frame_count() {
            return Ok(None);
        }

        let image = match layout {
            FrameLayout::RawPixels { buffer, frame_bytes } => {
                let shape = self
                    .shape
                    .ok_or_else(|| SlpError::InvalidSlp("raw embedded video missing shape".into()))?;
                let start = position * frame_bytes;
                let Some(frame_bytes_slice) = buffer.get(start..start + frame_bytes) else {
                    return Ok(None);
                };
                match decode_raw_pixels(frame_bytes_slice, shape, self.channel_order, external_idx) {
                    Ok(img) => img,
                    Err(e) => {
                        warn!(dataset = %self.dataset, frame = external_idx, error = %e, "raw pixel reshape failed");
                        return Ok(None);
                    }
                }
            }
            _ => {
                let Some(bytes) = layout.encoded_frame_bytes(position) else {
                    return Ok(None);
                };
                match decode_encoded_frame(bytes, external_idx) {
                    Ok(img) => img,
                    Err(e) => {
                        warn!(
                            dataset = %self.dataset,
                            frame = external_idx,
                            error = %e,
                            "embedded frame failed to decode; skipping (non-fatal)"
                        );
                        return Ok(None);
                    }
                }
            }
        };

        let image = Arc::new(image);
        let image = self.cache.lock().await.insert(position, image);
        Ok(Some(image))
    }
}

fn decode_encoded_frame(bytes: &[u8], frame: u64) -> Result<RgbaImage> {
    let dynamic = image::load_from_memory(bytes).map_err(|e| SlpError::DecodeError {
        frame,
        format: ImageMagic::sniff(bytes)
            .map(|m| format!("{m:?}"))
            .unwrap_or_else(|| "unknown".into()),
        message: e.to_string(),
    })?;
    Ok(dynamic.to_rgba8())
}

fn decode_raw_pixels(
    bytes: &[u8],
    shape: [u64; 4],
    channel_order: Option<ChannelOrder>,
    frame: u64,
) -> Result<RgbaImage> {
    let (h, w, c) = (shape[1] as u32, shape[2] as u32, shape[3] as usize);
    if c != 1 && c != 3 && c != 4 {
        return Err(SlpError::DecodeError {
            frame,
            format: "raw".into(),
            message: format!("unsupported channel count {c}"),
        });
    }

    let mut rgba = Vec::with_capacity((h * w * 4) as usize);
    for px in bytes.chunks_exact(c) {
        let (mut r, mut g, mut b, a) = match c {
            1 => (px[0], px[0], px[0], 255),
            3 => (px[0], px[1], px[2], 255),
            4 => (px[0], px[1], px[2], px[3]),
            _ => unreachable!(),
        };
        if channel_order == Some(ChannelOrder::Bgr) && c >= 3 {
            std::mem::swap(&mut r, &mut b);
        }
        rgba.extend_from_slice(&[r, g, b, a]);
    }

    RgbaImage::from_raw(w, h, rgba).ok_or_else(|| SlpError::DecodeError {
        frame,
        format: "raw".into(),
        message: "pixel buffer does not match declared shape".into(),
    })
}

fn decode_i64_array(bytes: &[u8]) -> Vec<i64> {
    bytes
        .chunks_exact(8)
        .map(|c| i64::from_le_bytes(c.try_into().expect("chunks_exact(8)")))
        .collect()
}

/// Widens a decoded [`DynamicImage`] to RGBA8 regardless of the source
/// format's native color type, for callers that only want bitmaps.
pub fn to_rgba(image: DynamicImage) -> RgbaImage {
    image.to_rgba8()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_cache_evicts_fifo_at_capacity() {
        let mut cache = DecodedCache::new(Some(2));
        let make = |v: u8| Arc::new(RgbaImage::from_pixel(1, 1, image::Rgba([v, v, v, v])));

        cache.insert(0, make(1));
        cache.insert(1, make(2));
        cache.insert(2, make(3));

        assert!(cache.get(0).is_none());
        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_some());
    }

    #[test]
    fn decoded_cache_first_request_wins_on_double_insert() {
        let mut cache = DecodedCache::new(None);
        let first = Arc::new(RgbaImage::from_pixel(1, 1, image::Rgba([1, 1, 1, 1])));
        let second = Arc::new(RgbaImage::from_pixel(1, 1, image::Rgba([2, 2, 2, 2])));

        let winner = cache.insert(0, first.clone());
        let after = cache.insert(0, second);
        assert!(Arc::ptr_eq(&winner, &first));
        assert!(Arc::ptr_eq(&after, &first));
    }

    #[test]
    fn decode_raw_pixels_swaps_bgr_to_rgb() {
        let pixel = [10u8, 20, 30];
        let img = decode_raw_pixels(&pixel, [1, 1, 1, 3], Some(ChannelOrder::Bgr), 0).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [30, 20, 10, 255]);
    }
}
