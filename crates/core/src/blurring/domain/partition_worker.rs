use std::sync::atomic::AtomicBool;

use super::blur_error::BlurError;
use super::work_unit::WorkUnit;

/// Domain interface for convolving one partition of an iteration.
///
/// Implementations read anywhere in `unit.snapshot` and write only into
/// `unit.target`. They should poll `abort` and return
/// [`BlurError::Aborted`] promptly once it is set.
pub trait PartitionWorker: Send + Sync {
    fn process(&self, unit: WorkUnit<'_>, abort: &AtomicBool) -> Result<(), BlurError>;
}
