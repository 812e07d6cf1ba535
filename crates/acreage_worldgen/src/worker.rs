//! # Background Chunk Generation
//!
//! A fixed pool of worker threads that generate chunks off the caller's
//! thread.
//!
//! ## Architecture
//!
//! ```text
//!   WorldManager ──[job channel]──> Worker 1 ──┐
//!                                   Worker 2 ──┼──[result channel]──> WorldManager
//!                                   Worker N ──┘
//! ```
//!
//! Workers share one immutable [`ChunkGenerator`]. A job always runs to
//! completion; the pool never hands back a partially generated chunk.
//! Deciding whether a finished chunk is still wanted is the caller's job.
//!
//! A panicking job is reported as [`WorldError::GenerationPanicked`] and the
//! worker keeps serving, so every accepted job yields exactly one result.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::chunk::{Chunk, ChunkCoord, ChunkGenerator};
use crate::error::{WorldError, WorldResult};

/// Outcome of one background generation.
#[derive(Debug)]
pub struct GenerationResult {
    /// Requested coordinate.
    pub coord: ChunkCoord,
    /// The chunk, or the generation error.
    pub chunk: WorldResult<Chunk>,
}

/// Pool counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs accepted.
    pub submitted: u64,
    /// Jobs that produced a chunk.
    pub completed: u64,
    /// Jobs that failed.
    pub failed: u64,
}

type GenerateFn = dyn Fn(ChunkCoord) -> WorldResult<Chunk> + Send + Sync;

enum Job {
    Generate(ChunkCoord),
    Shutdown,
}

/// Worker thread pool for chunk generation.
pub struct ChunkWorkerPool {
    jobs: Sender<Job>,
    results: Receiver<GenerationResult>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<Mutex<PoolStats>>,
}

impl std::fmt::Debug for ChunkWorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkWorkerPool")
            .field("workers", &self.workers.len())
            .field("stats", &*self.stats.lock())
            .finish_non_exhaustive()
    }
}

impl ChunkWorkerPool {
    /// Starts `threads` workers (at least one) sharing `generator`.
    #[must_use]
    pub fn new(generator: Arc<ChunkGenerator>, threads: usize) -> Self {
        Self::from_fn(threads, move |coord| generator.generate(coord))
    }

    /// Starts `threads` workers (at least one) running `generate` per job.
    #[must_use]
    pub fn from_fn<F>(threads: usize, generate: F) -> Self
    where
        F: Fn(ChunkCoord) -> WorldResult<Chunk> + Send + Sync + 'static,
    {
        let threads = threads.max(1);
        let generate: Arc<GenerateFn> = Arc::new(generate);
        let (job_tx, job_rx) = unbounded::<Job>();
        let (result_tx, result_rx) = unbounded();
        let stats = Arc::new(Mutex::new(PoolStats::default()));

        let workers = (0..threads)
            .map(|_| {
                let generate = Arc::clone(&generate);
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                let stats = Arc::clone(&stats);
                thread::spawn(move || Self::worker_loop(&*generate, &jobs, &results, &stats))
            })
            .collect();

        tracing::info!("chunk worker pool started with {threads} threads");

        Self {
            jobs: job_tx,
            results: result_rx,
            workers,
            stats,
        }
    }

    fn worker_loop(
        generate: &GenerateFn,
        jobs: &Receiver<Job>,
        results: &Sender<GenerationResult>,
        stats: &Mutex<PoolStats>,
    ) {
        while let Ok(Job::Generate(coord)) = jobs.recv() {
            let chunk =
                panic::catch_unwind(AssertUnwindSafe(|| generate(coord))).unwrap_or_else(|_| {
                    tracing::warn!("chunk ({}, {}) panicked during generation", coord.x, coord.y);
                    Err(WorldError::GenerationPanicked {
                        x: coord.x,
                        y: coord.y,
                    })
                });
            {
                let mut stats = stats.lock();
                if chunk.is_ok() {
                    stats.completed += 1;
                } else {
                    stats.failed += 1;
                }
            }
            if results.send(GenerationResult { coord, chunk }).is_err() {
                break;
            }
        }
    }

    /// Queues generation of `coord`.
    ///
    /// Returns false if the workers have gone away.
    pub fn submit(&self, coord: ChunkCoord) -> bool {
        let accepted = self.jobs.send(Job::Generate(coord)).is_ok();
        if accepted {
            self.stats.lock().submitted += 1;
        }
        accepted
    }

    /// A finished result, if one is ready.
    #[must_use]
    pub fn try_recv(&self) -> Option<GenerationResult> {
        self.results.try_recv().ok()
    }

    /// Waits up to `timeout` for a finished result.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<GenerationResult> {
        self.results.recv_timeout(timeout).ok()
    }

    /// Waits for a finished result.
    ///
    /// Returns `None` once every worker has exited.
    #[must_use]
    pub fn recv(&self) -> Option<GenerationResult> {
        self.results.recv().ok()
    }

    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        *self.stats.lock()
    }

    /// Stops and joins every worker.
    ///
    /// Queued jobs ahead of the shutdown still run. Later calls to
    /// [`ChunkWorkerPool::submit`] return false.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        for _ in &self.workers {
            let _ = self.jobs.send(Job::Shutdown);
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("chunk worker exited by panic");
            }
        }
        tracing::info!("chunk worker pool stopped");
    }
}

impl Drop for ChunkWorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
