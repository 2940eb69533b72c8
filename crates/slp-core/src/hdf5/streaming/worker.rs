//! Request/response protocol for the streaming backend's worker boundary.
//!
//! Structural analogue of the `Job`/`request_id` worker protocol used
//! elsewhere in this codebase for off-thread work: every request carries a
//! monotonic id, and the worker loop replies by id rather than by call
//! order, so any isolation primitive (a spawned task here; a thread,
//! process, or remote worker elsewhere) could serve it.

use super::fetcher::{FetchError, Fetcher};
use crate::error::{Hdf5Error, Result};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

enum Job {
    Range {
        #[allow(dead_code)]
        id: u64,
        generation: u64,
        range: Range<u64>,
        reply: oneshot::Sender<Result<Vec<u8>>>,
    },
    Full {
        #[allow(dead_code)]
        id: u64,
        generation: u64,
        reply: oneshot::Sender<Result<Vec<u8>>>,
    },
}

fn map_fetch_err(e: FetchError, range: Option<Range<u64>>) -> Hdf5Error {
    match e {
        FetchError::RangeUnsupported => Hdf5Error::RangeUnsupported,
        other => Hdf5Error::NetworkError {
            range: range.unwrap_or(0..0),
            message: other.to_string(),
        },
    }
}

/// Handle to the background worker. Cloning shares the same queue; the
/// worker task itself exits once every handle and the task's own sender
/// are dropped.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<Job>,
    next_id: Arc<AtomicU64>,
    generation: Arc<AtomicU64>,
}

impl WorkerHandle {
    pub fn spawn(fetcher: Arc<dyn Fetcher>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let generation = Arc::new(AtomicU64::new(0));
        let gen_for_task = generation.clone();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match job {
                    Job::Range {
                        generation: job_gen,
                        range,
                        reply,
                        ..
                    } => {
                        if job_gen != gen_for_task.load(Ordering::SeqCst) {
                            continue;
                        }
                        let result = fetcher
                            .fetch_range(range.clone())
                            .await
                            .map_err(|e| map_fetch_err(e, Some(range)));
                        let _ = reply.send(result);
                    }
                    Job::Full {
                        generation: job_gen,
                        reply,
                        ..
                    } => {
                        if job_gen != gen_for_task.load(Ordering::SeqCst) {
                            continue;
                        }
                        let result = fetcher.fetch_full().await.map_err(|e| map_fetch_err(e, None));
                        let _ = reply.send(result);
                    }
                }
            }
        });

        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
            generation,
        }
    }

    /// Issues one range request, tagged with a fresh monotonic id, and
    /// awaits its response.
    pub async fn fetch(&self, range: Range<u64>) -> Result<Vec<u8>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let generation = self.generation.load(Ordering::SeqCst);
        let (reply, rx) = oneshot::channel();

        self.tx
            .send(Job::Range {
                id,
                generation,
                range,
                reply,
            })
            .map_err(|_| Hdf5Error::WorkerClosed)?;

        rx.await.map_err(|_| Hdf5Error::WorkerClosed)?
    }

    /// Requests the whole resource body, used by the `auto`/`download`
    /// fallback path when range requests are unsupported or not wanted.
    pub async fn fetch_full(&self) -> Result<Vec<u8>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let generation = self.generation.load(Ordering::SeqCst);
        let (reply, rx) = oneshot::channel();

        self.tx
            .send(Job::Full {
                id,
                generation,
                reply,
            })
            .map_err(|_| Hdf5Error::WorkerClosed)?;

        rx.await.map_err(|_| Hdf5Error::WorkerClosed)?
    }

    /// Marks every currently-outstanding request obsolete; late responses
    /// for the prior generation are discarded by the worker loop rather
    /// than delivered. Used when a load is abandoned mid-flight.
    pub fn cancel_outstanding(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
