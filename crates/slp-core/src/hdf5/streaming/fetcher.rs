//! The transport used to pull byte ranges for the streaming backend.
//!
//! Kept as a trait, not a concrete `reqwest::Client`, so tests exercise the
//! `VirtualFile`/index-building logic against a fixed in-memory buffer
//! instead of a real socket.

use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};
use std::ops::Range;
use url::Url;

/// Transport-level error, independent of `Hdf5Error` so this module stays
/// usable without pulling in the HDF5-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {0} for a range request")]
    UnexpectedStatus(StatusCode),

    #[error("server does not support range requests (no 206/Content-Range on response)")]
    RangeUnsupported,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_range(&self, range: Range<u64>) -> Result<Vec<u8>, FetchError>;

    /// Fetches the entire resource in one plain (non-ranged) request. Used
    /// by the `download`/`auto`-fallback path.
    async fn fetch_full(&self) -> Result<Vec<u8>, FetchError>;

    /// Total content length, when the transport can report it up front
    /// (e.g. via a HEAD request). `None` if unknown.
    async fn content_length(&self) -> Result<Option<u64>, FetchError>;
}

/// HTTP(S) range-fetcher over `reqwest`.
pub struct HttpFetcher {
    client: Client,
    url: Url,
}

impl HttpFetcher {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_range(&self, range: Range<u64>) -> Result<Vec<u8>, FetchError> {
        // HTTP ranges are inclusive on both ends.
        let header = format!("bytes={}-{}", range.start, range.end.saturating_sub(1));
        let resp = self
            .client
            .get(self.url.clone())
            .header(RANGE, header)
            .send()
            .await?;

        match resp.status() {
            StatusCode::PARTIAL_CONTENT => Ok(resp.bytes().await?.to_vec()),
            StatusCode::OK => {
                // Some servers ignore Range and return the whole body; treat
                // that as unsupported so the caller can fall back to `auto`
                // full-download mode rather than silently misreading offsets.
                if resp.headers().contains_key(CONTENT_RANGE) {
                    Ok(resp.bytes().await?.to_vec())
                } else {
                    Err(FetchError::RangeUnsupported)
                }
            }
            other => Err(FetchError::UnexpectedStatus(other)),
        }
    }

    async fn fetch_full(&self) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(self.url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::UnexpectedStatus(resp.status()));
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn content_length(&self) -> Result<Option<u64>, FetchError> {
        let resp = self.client.head(self.url.clone()).send().await?;
        Ok(resp.content_length())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Serves ranges out of a fixed in-memory buffer; stands in for the
    /// network in worker/virtual-file unit tests.
    pub struct StaticFetcher {
        data: Vec<u8>,
    }

    impl StaticFetcher {
        pub fn new(data: Vec<u8>) -> Self {
            Self { data }
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch_range(&self, range: Range<u64>) -> Result<Vec<u8>, FetchError> {
            let start = range.start as usize;
            let end = (range.end as usize).min(self.data.len());
            if start >= self.data.len() {
                return Ok(Vec::new());
            }
            Ok(self.data[start..end].to_vec())
        }

        async fn fetch_full(&self) -> Result<Vec<u8>, FetchError> {
            Ok(self.data.clone())
        }

        async fn content_length(&self) -> Result<Option<u64>, FetchError> {
            Ok(Some(self.data.len() as u64))
        }
    }

    /// A fetcher standing in for a server that ignores the `Range` header,
    /// for exercising the `auto` fallback path.
    pub struct RangeUnsupportedFetcher {
        data: Vec<u8>,
    }

    impl RangeUnsupportedFetcher {
        pub fn new(data: Vec<u8>) -> Self {
            Self { data }
        }
    }

    #[async_trait]
    impl Fetcher for RangeUnsupportedFetcher {
        async fn fetch_range(&self, _range: Range<u64>) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::RangeUnsupported)
        }

        async fn fetch_full(&self) -> Result<Vec<u8>, FetchError> {
            Ok(self.data.clone())
        }

        async fn content_length(&self) -> Result<Option<u64>, FetchError> {
            Ok(Some(self.data.len() as u64))
        }
    }
}
