use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::blurring::domain::blur_config::BlurConfig;
use crate::blurring::domain::blur_error::BlurError;
use crate::blurring::domain::partition_worker::PartitionWorker;
use crate::blurring::domain::partitioner::Partitioner;
use crate::blurring::domain::work_unit::{ImageGeometry, WorkUnit};
use crate::blurring::infrastructure::gaussian_partition_worker::GaussianPartitionWorker;
use crate::pipeline::elapsed_ticker::{ElapsedObserver, ElapsedTicker};
use crate::pipeline::run_logger::{NullRunLogger, RunLogger};
use crate::shared::constants::DEFAULT_PROGRESS_INTERVAL;
use crate::shared::pixel_buffer::PixelBuffer;

/// Outcome of one [`BlurEngine::run`]. The blurred pixels are in the buffer
/// that was passed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputationResult {
    pub elapsed: Duration,
    pub iterations_completed: usize,
    /// Partitions per iteration after clamping the worker count to the height.
    pub partition_count: usize,
    /// True if the run stopped at an iteration boundary because the
    /// cancellation token was set.
    pub cancelled: bool,
}

/// Runs blur iterations over a pixel buffer, one thread per row partition.
///
/// Each iteration copies the current buffer into a read-only snapshot, lets
/// every worker write its own rows of the buffer from that snapshot, and joins
/// all workers before the next iteration starts.
pub struct BlurEngine {
    worker: Box<dyn PartitionWorker>,
    logger: Box<dyn RunLogger>,
    observer: Option<Arc<dyn ElapsedObserver>>,
    progress_interval: Duration,
    cancelled: Arc<AtomicBool>,
}

impl BlurEngine {
    pub fn new() -> Self {
        Self::with_worker(Box::new(GaussianPartitionWorker::new()))
    }

    pub fn with_worker(worker: Box<dyn PartitionWorker>) -> Self {
        Self {
            worker,
            logger: Box::new(NullRunLogger),
            observer: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn RunLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Receive elapsed-time samples every `progress_interval` while a run is
    /// active, followed by the exact total when it ends.
    pub fn with_elapsed_observer(mut self, observer: Arc<dyn ElapsedObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Share an existing cancellation flag instead of the engine's own.
    pub fn with_cancellation(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Flag checked before every iteration. Setting it ends the current run
    /// after the iteration in flight; it is cleared when the run returns.
    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Blurs `buffer` in place.
    ///
    /// On error the buffer holds the output of the last completed iteration
    /// (the original samples if the first iteration failed).
    pub fn run(
        &mut self,
        buffer: &mut PixelBuffer,
        config: &BlurConfig,
    ) -> Result<ComputationResult, BlurError> {
        if let Err(e) = config.validate() {
            self.cancelled.store(false, Ordering::Relaxed);
            return Err(e);
        }

        let geometry = ImageGeometry::of(buffer);
        let partition_count =
            Partitioner::new(config.worker_count).effective_worker_count(geometry.height);
        if partition_count < config.worker_count {
            log::warn!(
                "Requested {} workers for {} rows, using {partition_count}",
                config.worker_count,
                geometry.height
            );
        }
        log::info!(
            "Blurring {}x{} image: mask {}, level {}, {} iteration(s), {partition_count} worker(s)",
            geometry.width,
            geometry.height,
            config.mask_size,
            config.blur_level,
            config.iteration_count
        );

        let started = Instant::now();
        let ticker = self
            .observer
            .clone()
            .map(|observer| ElapsedTicker::start(started, self.progress_interval, observer));

        let outcome = self.run_iterations(buffer, config, geometry);

        if let Some(ticker) = ticker {
            ticker.stop();
        }
        let elapsed = started.elapsed();
        if let Some(observer) = &self.observer {
            observer.on_elapsed(elapsed);
        }
        self.cancelled.store(false, Ordering::Relaxed);

        let (iterations_completed, cancelled) = outcome?;
        self.logger.summary();
        log::info!(
            "Blur finished in {:.1}ms ({iterations_completed}/{} iterations{})",
            elapsed.as_secs_f64() * 1000.0,
            config.iteration_count,
            if cancelled { ", cancelled" } else { "" }
        );

        Ok(ComputationResult {
            elapsed,
            iterations_completed,
            partition_count,
            cancelled,
        })
    }

    /// Returns `(iterations completed, cancelled)`.
    fn run_iterations(
        &mut self,
        buffer: &mut PixelBuffer,
        config: &BlurConfig,
        geometry: ImageGeometry,
    ) -> Result<(usize, bool), BlurError> {
        let total = config.iteration_count;
        let mut snapshot = Vec::with_capacity(geometry.len());

        for iteration in 1..=total {
            if self.cancelled.load(Ordering::Relaxed) {
                self.logger
                    .info(&format!("Cancelled after {} of {total} iterations", iteration - 1));
                return Ok((iteration - 1, true));
            }

            snapshot.clear();
            snapshot.extend_from_slice(buffer.samples());

            let iteration_start = Instant::now();
            let outcome = run_iteration(
                &*self.worker,
                geometry,
                config,
                &snapshot,
                buffer.samples_mut(),
            );
            match outcome {
                Ok(partition_times) => {
                    for t in partition_times {
                        self.logger.timing("partition", t.as_secs_f64() * 1000.0);
                    }
                    let ms = iteration_start.elapsed().as_secs_f64() * 1000.0;
                    self.logger.timing("iteration", ms);
                    self.logger.iteration(iteration, total);
                    log::debug!("Iteration {iteration}/{total} took {ms:.2}ms");
                }
                Err(e) => {
                    buffer.samples_mut().copy_from_slice(&snapshot);
                    log::error!("Iteration {iteration}/{total} failed: {e}");
                    return Err(e);
                }
            }
        }

        Ok((total, false))
    }
}

impl Default for BlurEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatches one worker per partition and waits for all of them.
///
/// Returns each partition's wall time, or the first real failure in
/// partition order. Siblings of a failed worker are told to abort.
fn run_iteration(
    worker: &dyn PartitionWorker,
    geometry: ImageGeometry,
    config: &BlurConfig,
    snapshot: &[u8],
    target: &mut [u8],
) -> Result<Vec<Duration>, BlurError> {
    let mut units =
        Partitioner::new(config.worker_count).work_units(geometry, config, snapshot, target)?;
    let abort = AtomicBool::new(false);

    let outcomes: Vec<(usize, Result<Duration, BlurError>)> = if units.len() == 1 {
        units
            .pop()
            .map(|unit| (unit.partition_id, run_unit(worker, unit, &abort)))
            .into_iter()
            .collect()
    } else {
        std::thread::scope(|s| {
            let handles: Vec<_> = units
                .into_iter()
                .map(|unit| {
                    let partition = unit.partition_id;
                    let abort = &abort;
                    (partition, s.spawn(move || run_unit(worker, unit, abort)))
                })
                .collect();

            handles
                .into_iter()
                .map(|(partition, handle)| {
                    let outcome = handle.join().unwrap_or_else(|payload| {
                        Err(BlurError::WorkerFailure {
                            partition,
                            message: panic_message(payload.as_ref()),
                        })
                    });
                    (partition, outcome)
                })
                .collect()
        })
    };

    let mut times = Vec::with_capacity(outcomes.len());
    let mut first_aborted = None;
    for (partition, outcome) in outcomes {
        match outcome {
            Ok(t) => times.push(t),
            Err(BlurError::Aborted) => {
                first_aborted.get_or_insert(partition);
            }
            Err(e) => return Err(e),
        }
    }
    // Aborts without a root cause still fail the iteration.
    if let Some(partition) = first_aborted {
        return Err(BlurError::WorkerFailure {
            partition,
            message: "worker aborted without a reported cause".to_string(),
        });
    }
    Ok(times)
}

/// Runs one unit, converting a panic into [`BlurError::WorkerFailure`].
///
/// Panics are only caught in unwinding builds.
fn run_unit(
    worker: &dyn PartitionWorker,
    unit: WorkUnit<'_>,
    abort: &AtomicBool,
) -> Result<Duration, BlurError> {
    let partition = unit.partition_id;
    log::debug!("Dispatching {unit}");
    let started = Instant::now();

    let result = panic::catch_unwind(AssertUnwindSafe(|| worker.process(unit, abort)))
        .unwrap_or_else(|payload| {
            Err(BlurError::WorkerFailure {
                partition,
                message: panic_message(payload.as_ref()),
            })
        });

    if result.is_err() {
        abort.store(true, Ordering::Relaxed);
    }
    result.map(|()| started.elapsed())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {s}")
    } else {
        "worker panicked".to_string()
    }
}
