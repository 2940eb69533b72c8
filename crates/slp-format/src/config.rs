//! Loader configuration (spec §6). No environment variables or hidden
//! globals are consulted anywhere in this crate; every knob flows through
//! this struct.

pub use slp_core::StreamMode;

/// Options accepted by [`crate::load_slp`] / [`crate::load_slp_lite`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Eagerly instantiate `Video` backends while loading. Default `true`.
    pub open_videos: bool,
    /// Transport mode for the streaming backend. Ignored when loading from
    /// a local buffer/file. Default `Auto`.
    pub stream: StreamMode,
    /// Logical filename used to resolve embedded `"."` video references
    /// when loading from an in-memory buffer rather than a path.
    pub filename_hint: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            open_videos: true,
            stream: StreamMode::Auto,
            filename_hint: None,
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_videos(mut self, open_videos: bool) -> Self {
        self.open_videos = open_videos;
        self
    }

    pub fn stream(mut self, stream: StreamMode) -> Self {
        self.stream = stream;
        self
    }

    pub fn filename_hint(mut self, filename_hint: impl Into<String>) -> Self {
        self.filename_hint = Some(filename_hint.into());
        self
    }
}
