use std::time::Duration;

pub const DEFAULT_MASK_SIZE: usize = 3;
pub const DEFAULT_BLUR_LEVEL: f64 = 1.0;
pub const DEFAULT_ITERATIONS: usize = 1;
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Minimum spacing between elapsed-time events while a run is active.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(10);
