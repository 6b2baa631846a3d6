//! Thumbnail worker queue.
//!
//! - Bounded worker pool of OS threads for resize jobs
//! - Jobs are independent; completion order is arbitrary
//! - Each destination is written once; the first request for it wins
//! - Uses flume for communication between workers and the submitter

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use super::generator::ThumbnailGenerator;

/// Maximum number of worker threads.
const MAX_WORKERS: usize = 8;

/// Maximum number of requests waiting for a worker.
const MAX_QUEUE_SIZE: usize = 256;

/// How often idle workers re-check the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A request to write one resized image.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeRequest {
    /// Path to the source image.
    pub src: PathBuf,
    /// Where the resized copy goes.
    pub dst: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Result of one resize job.
#[derive(Debug, Clone)]
pub struct ResizeOutcome {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Error message if generation failed.
    pub error: Option<String>,
}

impl ResizeOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Number of workers to use when the caller has no preference.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_WORKERS)
}

/// Worker queue for thumbnail generation.
pub struct ThumbnailQueue {
    /// Sender for new requests; dropped to let workers drain and exit.
    request_tx: Option<Sender<ResizeRequest>>,
    /// Receiver for completed results.
    result_rx: Receiver<ResizeOutcome>,
    /// Worker thread handles.
    workers: Vec<JoinHandle<()>>,
    /// Flag to make workers discard remaining requests.
    shutdown: Arc<AtomicBool>,
    /// Every destination accepted so far. Never shrinks, so the first
    /// request for a destination wins regardless of worker timing.
    submitted: Mutex<HashSet<PathBuf>>,
}

impl ThumbnailQueue {
    /// Resize every request on a fresh queue and wait for all of them.
    ///
    /// Requests are accepted in order; a later request for a destination
    /// that was already accepted is skipped. One outcome is returned per
    /// accepted request, in completion order.
    pub fn run(workers: usize, requests: Vec<ResizeRequest>) -> Result<Vec<ResizeOutcome>> {
        let queue = Self::new(workers)?;
        let total = requests.len();
        let submitted = queue.request_batch(requests);
        debug!(submitted, skipped = total - submitted, "Submitted resize jobs");
        Ok(queue.finish())
    }

    /// Create a new thumbnail queue with the specified number of workers.
    fn new(workers: usize) -> Result<Self> {
        let num_workers = workers.clamp(1, MAX_WORKERS);

        let (request_tx, request_rx) = flume::bounded(MAX_QUEUE_SIZE);
        let (result_tx, result_rx) = flume::unbounded();

        let shutdown = Arc::new(AtomicBool::new(false));

        let mut worker_handles = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let rx = request_rx.clone();
            let tx = result_tx.clone();
            let shutdown = Arc::clone(&shutdown);

            let handle = thread::Builder::new()
                .name(format!("thumb-worker-{}", worker_id))
                .spawn(move || {
                    worker_loop(worker_id, rx, tx, shutdown);
                })
                .context("Failed to spawn thumbnail worker")?;

            worker_handles.push(handle);
        }

        debug!(num_workers, "Started thumbnail worker queue");

        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            workers: worker_handles,
            shutdown,
            submitted: Mutex::new(HashSet::new()),
        })
    }

    /// Submit a request. Blocks while the queue is full.
    ///
    /// Returns false if the destination was already accepted or the queue is closed.
    fn request(&self, req: ResizeRequest) -> bool {
        let Some(request_tx) = &self.request_tx else {
            return false;
        };

        if !self.submitted.lock().insert(req.dst.clone()) {
            trace!(dst = ?req.dst, "Destination already submitted");
            return false;
        }

        match request_tx.send(req) {
            Ok(()) => true,
            Err(flume::SendError(req)) => {
                error!("Thumbnail queue disconnected");
                self.submitted.lock().remove(&req.dst);
                false
            }
        }
    }

    /// Submit multiple requests, returning how many were accepted.
    fn request_batch(&self, requests: Vec<ResizeRequest>) -> usize {
        let mut submitted = 0;
        for req in requests {
            if self.request(req) {
                submitted += 1;
            }
        }
        submitted
    }

    /// Close the queue, wait for every accepted request and return their
    /// outcomes in completion order.
    fn finish(mut self) -> Vec<ResizeOutcome> {
        self.join_workers();
        self.result_rx.try_iter().collect()
    }

    fn join_workers(&mut self) {
        // Dropping the sender lets workers exit once the channel is drained.
        self.request_tx = None;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("Thumbnail worker panicked");
            }
        }
        debug!("Thumbnail queue shutdown complete");
    }
}

impl Drop for ThumbnailQueue {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            // Discard requests no worker has started yet.
            self.shutdown.store(true, Ordering::SeqCst);
            self.join_workers();
        }
    }
}

/// Worker thread loop.
fn worker_loop(
    worker_id: usize,
    rx: Receiver<ResizeRequest>,
    tx: Sender<ResizeOutcome>,
    shutdown: Arc<AtomicBool>,
) {
    debug!(worker_id, "Thumbnail worker started");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(req) => {
                let result = process_request(&req);
                if let Err(e) = tx.send(result) {
                    warn!(worker_id, error = ?e, "Failed to send thumbnail result");
                }
            }
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(worker_id, "Thumbnail worker stopped");
}

/// Process a single resize request.
fn process_request(req: &ResizeRequest) -> ResizeOutcome {
    trace!(src = ?req.src, dst = ?req.dst, "Processing resize request");

    let error = match ThumbnailGenerator::generate(&req.src, &req.dst, req.width, req.height) {
        Ok(()) => None,
        Err(e) => {
            warn!(src = ?req.src, error = ?e, "Failed to generate thumbnail");
            Some(format!("{e:#}"))
        }
    };

    ResizeOutcome {
        src: req.src.clone(),
        dst: req.dst.clone(),
        width: req.width,
        height: req.height,
        error,
    }
}
