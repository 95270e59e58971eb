use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for blur run events.
///
/// Decouples the engine from specific output mechanisms (stdout, GUI signals,
/// log crate) so each caller can observe a run without changing the
/// orchestration code.
pub trait RunLogger: Send {
    /// Report that `current` of `total` iterations have completed.
    fn iteration(&mut self, current: usize, total: usize);

    /// Record how long a named stage took, e.g. one iteration or one partition.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullRunLogger;

impl RunLogger for NullRunLogger {
    fn iteration(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that tracks per-stage timing and reports a summary
/// when the run completes.
pub struct StdoutRunLogger {
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    iterations_done: usize,
}

impl StdoutRunLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            start_time: Instant::now(),
            iterations_done: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Blur summary ({} iterations, {:.1}ms total):",
            self.iterations_done, elapsed_ms
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len() as f64;
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:7.2}ms  max {max_ms:7.2}ms  total {total_ms:8.1}ms  (n={})",
                durations.len()
            ));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }
}

impl Default for StdoutRunLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLogger for StdoutRunLogger {
    fn iteration(&mut self, current: usize, total: usize) {
        self.iterations_done = current;
        if total > 0 {
            log::info!("Iteration {current}/{total} complete");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
