//! # Analysis Worker Module
//!
//! Runs analyses off the caller's thread and keeps recent reports cached.
//!
//! ## Architecture
//! - **AnalysisPool**: Owns the worker threads, the job queue and the cache
//! - **Worker threads**: Pull jobs from a shared crossbeam queue; each job is
//!   an independent pure computation, so workers never coordinate
//! - **Report cache**: LRU cache keyed by evaluation id, shared by all workers
//! - **analyze_async**: Single analysis on Tokio's blocking pool for async hosts
//!
//! ## Cancellation
//! An analysis has no partial effects. Dropping a `PendingReport` (or the
//! future returned by `analyze_async`) simply discards the result.

use crate::analysis::{analyze, AnalysisReport, AnalysisRequest, AnalysisSettings};
use crate::error::WorkerError;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::thread;

/// One evaluation to analyze
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub evaluation_id: String,
    pub request: AnalysisRequest,
}

type JobResult = Result<AnalysisReport, WorkerError>;
type ReportCache = Arc<Mutex<LruCache<String, AnalysisReport>>>;

/// Command sent from the pool to worker threads
enum WorkerCommand {
    /// Analyze a job and reply on the given channel
    Analyze {
        job: AnalysisJob,
        reply: Sender<JobResult>,
    },
    /// Stop one worker
    Stop,
}

/// Handle to a submitted job's eventual report
pub struct PendingReport {
    pub evaluation_id: String,
    receiver: Receiver<JobResult>,
}

impl PendingReport {
    /// Block until the report is ready
    pub fn wait(self) -> JobResult {
        self.receiver
            .recv()
            .map_err(|_| WorkerError::Disconnected)?
    }
}

/// Pool of analysis worker threads
///
/// Thread-safe and non-blocking for the submitter. Dropping the pool stops
/// every worker after the jobs already queued have been processed.
pub struct AnalysisPool {
    /// Command sender shared by all workers
    command_tx: Sender<WorkerCommand>,
    /// Worker thread handles
    workers: Vec<thread::JoinHandle<()>>,
    /// Recently completed reports
    cache: ReportCache,
}

impl AnalysisPool {
    /// Create a new pool
    ///
    /// # Arguments
    /// * `threads` - Number of worker threads (at least one is started)
    /// * `cache_capacity` - Reports retained in the LRU cache (at least one)
    /// * `settings` - Thresholds and transport settings applied to every job
    pub fn new(threads: usize, cache_capacity: usize, settings: AnalysisSettings) -> Self {
        let (command_tx, command_rx) = unbounded();
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        let cache: ReportCache = Arc::new(Mutex::new(LruCache::new(capacity)));

        let workers = (0..threads.max(1))
            .map(|index| {
                let rx = command_rx.clone();
                let cache = cache.clone();
                thread::spawn(move || Self::worker_loop(index, rx, cache, settings))
            })
            .collect::<Vec<_>>();

        log::info!(
            "Started analysis pool with {} workers, cache capacity {}",
            workers.len(),
            capacity
        );

        AnalysisPool {
            command_tx,
            workers,
            cache,
        }
    }

    /// Queue a job for analysis
    ///
    /// A report already cached for the same evaluation id is returned
    /// without recomputing.
    pub fn submit(&self, job: AnalysisJob) -> Result<PendingReport, WorkerError> {
        let (reply, receiver) = bounded(1);
        let evaluation_id = job.evaluation_id.clone();

        if let Some(report) = self.cached(&evaluation_id)? {
            log::debug!("Cache hit for evaluation {}", evaluation_id);
            let _ = reply.send(Ok(report));
            return Ok(PendingReport {
                evaluation_id,
                receiver,
            });
        }

        self.command_tx
            .send(WorkerCommand::Analyze { job, reply })
            .map_err(|_| WorkerError::Disconnected)?;

        Ok(PendingReport {
            evaluation_id,
            receiver,
        })
    }

    /// Look up a cached report
    pub fn cached(&self, evaluation_id: &str) -> Result<Option<AnalysisReport>, WorkerError> {
        let mut cache = self.cache.lock().map_err(|_| WorkerError::StatePoisoned)?;
        Ok(cache.get(evaluation_id).cloned())
    }

    /// Number of reports currently cached
    pub fn cached_count(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Worker thread loop
    ///
    /// Runs jobs until told to stop or until the pool's sender is gone.
    fn worker_loop(index: usize, command_rx: Receiver<WorkerCommand>, cache: ReportCache, settings: AnalysisSettings) {
        loop {
            match command_rx.recv() {
                Ok(WorkerCommand::Analyze { job, reply }) => {
                    log::debug!("Worker {}: analyzing evaluation {}", index, job.evaluation_id);
                    let result = analyze(job.request, settings).map_err(WorkerError::from);

                    match &result {
                        Ok(report) => match cache.lock() {
                            Ok(mut cache) => {
                                cache.put(job.evaluation_id.clone(), report.clone());
                            }
                            Err(_) => log::error!("Worker {}: report cache poisoned", index),
                        },
                        Err(e) => log::warn!("Worker {}: evaluation {} failed: {}", index, job.evaluation_id, e),
                    }

                    // Submitter may have dropped its handle
                    let _ = reply.send(result);
                }
                Ok(WorkerCommand::Stop) => {
                    log::debug!("Worker {} stopped", index);
                    break;
                }
                Err(_) => {
                    log::debug!("Worker {}: command channel closed", index);
                    break;
                }
            }
        }
    }
}

impl Drop for AnalysisPool {
    fn drop(&mut self) {
        // One stop per worker; queued jobs ahead of them still run
        for _ in 0..self.workers.len() {
            let _ = self.command_tx.send(WorkerCommand::Stop);
        }

        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        log::info!("Analysis pool stopped");
    }
}

/// Run one analysis on Tokio's blocking thread pool
pub async fn analyze_async(request: AnalysisRequest, settings: AnalysisSettings) -> JobResult {
    tokio::task::spawn_blocking(move || analyze(request, settings))
        .await
        .map_err(|_| WorkerError::Disconnected)?
        .map_err(WorkerError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::sample::test_support::*;
    use chrono::Duration;

    fn job(id: &str, samples: Vec<crate::sample::SensorSample>) -> AnalysisJob {
        AnalysisJob {
            evaluation_id: id.to_string(),
            request: AnalysisRequest {
                samples,
                time_init: t0(),
                time_end: t0() + Duration::seconds(14),
                age: 75,
            },
        }
    }

    #[test]
    fn test_pool_creation() {
        let pool = AnalysisPool::new(0, 0, AnalysisSettings::default());
        assert_eq!(pool.worker_count(), 1);
        assert_eq!(pool.cached_count(), 0);
    }

    #[test]
    fn test_submit_and_wait() {
        let pool = AnalysisPool::new(2, 8, AnalysisSettings::default());

        let report = pool
            .submit(job("eval-1", idealized_cycles(5)))
            .unwrap()
            .wait()
            .expect("Analysis failed");

        assert_eq!(report.cycle.valid_count(), 5);
        assert!(pool.cached("eval-1").unwrap().is_some());
    }

    #[test]
    fn test_parallel_jobs() {
        let pool = AnalysisPool::new(3, 8, AnalysisSettings::default());

        let pending: Vec<PendingReport> = (1..=5)
            .map(|n| pool.submit(job(&format!("eval-{}", n), idealized_cycles(n))).unwrap())
            .collect();

        for (n, p) in (1..=5).zip(pending) {
            assert_eq!(p.evaluation_id, format!("eval-{}", n));
            let report = p.wait().unwrap();
            assert_eq!(report.cycle.valid_count(), n);
        }
        assert_eq!(pool.cached_count(), 5);
    }

    #[test]
    fn test_no_data_is_reported_not_cached() {
        let pool = AnalysisPool::new(1, 4, AnalysisSettings::default());

        let result = pool.submit(job("empty", Vec::new())).unwrap().wait();

        assert_eq!(result.unwrap_err(), WorkerError::Analysis(AnalysisError::NoData));
        assert!(pool.cached("empty").unwrap().is_none());
    }

    #[test]
    fn test_cache_hit_skips_recompute() {
        let pool = AnalysisPool::new(1, 4, AnalysisSettings::default());
        let first = pool.submit(job("eval-7", idealized_cycles(2))).unwrap().wait().unwrap();

        // Same id, different samples: the cached report wins
        let second = pool.submit(job("eval-7", stationary(10))).unwrap().wait().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_evicts_least_recent() {
        let pool = AnalysisPool::new(1, 2, AnalysisSettings::default());
        for id in ["a", "b", "c"] {
            pool.submit(job(id, stationary(5))).unwrap().wait().unwrap();
        }

        assert_eq!(pool.cached_count(), 2);
        assert!(pool.cached("a").unwrap().is_none());
        assert!(pool.cached("c").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_analyze_async() {
        let report = analyze_async(job("async", idealized_cycles(3)).request, AnalysisSettings::default())
            .await
            .unwrap();
        assert_eq!(report.cycle.valid_count(), 3);

        let empty = analyze_async(job("none", Vec::new()).request, AnalysisSettings::default()).await;
        assert_eq!(empty.unwrap_err(), WorkerError::Analysis(AnalysisError::NoData));
    }
}
