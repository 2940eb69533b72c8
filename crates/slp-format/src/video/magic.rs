//! Magic-byte scanning for the contiguous embedded-video buffer layout
//! (spec §4.5).

pub const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
pub const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Single-frame size below which a buffer that starts with a frame magic
/// is assumed to hold exactly one frame rather than many concatenated
/// ones, when the declared shape doesn't already say so.
pub const SINGLE_FRAME_THRESHOLD: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMagic {
    Png,
    Jpeg,
}

impl ImageMagic {
    pub fn bytes(self) -> &'static [u8] {
        match self {
            ImageMagic::Png => &PNG_MAGIC,
            ImageMagic::Jpeg => &JPEG_MAGIC,
        }
    }

    pub fn len(self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(self) -> bool {
        false
    }

    pub fn from_format(format: &str) -> Option<Self> {
        match format.to_ascii_lowercase().as_str() {
            "png" => Some(ImageMagic::Png),
            "jpg" | "jpeg" => Some(ImageMagic::Jpeg),
            _ => None,
        }
    }

    /// Sniffs the magic a buffer starts with, trying PNG before JPEG (PNG's
    /// signature is longer and strictly more specific).
    pub fn sniff(buffer: &[u8]) -> Option<Self> {
        if buffer.starts_with(&PNG_MAGIC) {
            Some(ImageMagic::Png)
        } else if buffer.starts_with(&JPEG_MAGIC) {
            Some(ImageMagic::Jpeg)
        } else {
            None
        }
    }
}

/// Scans `buffer` for occurrences of `magic`, recording each match
/// position as a frame start. Stops early once `expected_frame_count`
/// offsets have been found (spec §4.5). Skips ahead by `magic.len() - 1`
/// after each match — a heuristic that avoids trivial re-matches inside
/// the magic sequence itself, not a real frame-boundary parse.
pub fn scan_frame_offsets(buffer: &[u8], magic: ImageMagic, expected_frame_count: usize) -> Vec<usize> {
    let needle = magic.bytes();
    let mut offsets = Vec::new();
    if expected_frame_count == 0 || needle.is_empty() || buffer.len() < needle.len() {
        return offsets;
    }

    let mut i = 0usize;
    let last_start = buffer.len() - needle.len();
    while i <= last_start {
        if &buffer[i..i + needle.len()] == needle {
            offsets.push(i);
            if offsets.len() >= expected_frame_count {
                break;
            }
            i += needle.len() - 1;
        } else {
            i += 1;
        }
    }
    offsets
}

/// Detection heuristic for "this dataset is a contiguous multi-frame
/// buffer, not a single already-whole image" (spec §4.5): the buffer
/// starts with a known magic, the declared format is an encoded one, and
/// either the declared shape says more than one frame or the buffer is
/// bigger than a plausible single frame.
pub fn looks_contiguous(buffer: &[u8], format: Option<&str>, declared_frames: Option<u64>) -> Option<ImageMagic> {
    let format = format?;
    let magic = ImageMagic::from_format(format)?;
    if !buffer.starts_with(magic.bytes()) {
        return None;
    }
    let many_frames = declared_frames.map(|n| n > 1).unwrap_or(false);
    let oversized = buffer.len() > SINGLE_FRAME_THRESHOLD;
    if many_frames || oversized {
        Some(magic)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_two_png_frames() {
        let mut buffer = PNG_MAGIC.to_vec();
        buffer.extend_from_slice(b"frame one payload bytes");
        let second_start = buffer.len();
        buffer.extend_from_slice(&PNG_MAGIC);
        buffer.extend_from_slice(b"frame two payload bytes");

        let offsets = scan_frame_offsets(&buffer, ImageMagic::Png, 2);
        assert_eq!(offsets, vec![0, second_start]);
    }

    #[test]
    fn stops_at_expected_frame_count_even_with_more_matches() {
        let mut buffer = Vec::new();
        for _ in 0..5 {
            buffer.extend_from_slice(&JPEG_MAGIC);
            buffer.extend_from_slice(b"payload");
        }
        let offsets = scan_frame_offsets(&buffer, ImageMagic::Jpeg, 2);
        assert_eq!(offsets.len(), 2);
    }

    #[test]
    fn false_positive_magic_inside_jpeg_payload_is_bounded_by_expected_count() {
        // A JPEG payload that happens to embed `FF D8 FF` mid-stream (legal
        // JPEG markers can produce this) must not inflate the frame count
        // past what the dataset's shape already told us to expect.
        let mut buffer = JPEG_MAGIC.to_vec();
        buffer.extend_from_slice(b"...");
        buffer.extend_from_slice(&JPEG_MAGIC); // embedded false positive
        buffer.extend_from_slice(b"...rest of frame one");
        buffer.extend_from_slice(&JPEG_MAGIC);
        buffer.extend_from_slice(b"frame two");

        let offsets = scan_frame_offsets(&buffer, ImageMagic::Jpeg, 1);
        assert_eq!(offsets.len(), 1);
        assert_eq!(offsets[0], 0);
    }

    #[test]
    fn looks_contiguous_requires_magic_format_and_size_or_count() {
        let mut small_single = PNG_MAGIC.to_vec();
        small_single.extend_from_slice(b"tiny");
        assert!(looks_contiguous(&small_single, Some("png"), Some(1)).is_none());
        assert!(looks_contiguous(&small_single, Some("png"), Some(2)).is_some());
    }
}
