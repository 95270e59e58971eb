use std::sync::atomic::{AtomicBool, Ordering};

use crate::blurring::domain::blur_config::validate_mask;
use crate::blurring::domain::blur_error::BlurError;
use crate::blurring::domain::partition_worker::PartitionWorker;
use crate::blurring::domain::work_unit::WorkUnit;

use super::gaussian;

/// Separable Gaussian convolution of one row band.
///
/// The horizontal pass runs over the band plus a halo of `mask_size / 2` rows
/// on each side, read from the pre-iteration snapshot. The vertical pass then
/// writes only the band's own rows. Samples past the image edge clamp to the
/// nearest edge sample, so each output pixel depends on the snapshot alone and
/// not on how the image was partitioned.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaussianPartitionWorker;

impl GaussianPartitionWorker {
    pub fn new() -> Self {
        Self
    }
}

impl PartitionWorker for GaussianPartitionWorker {
    fn process(&self, unit: WorkUnit<'_>, abort: &AtomicBool) -> Result<(), BlurError> {
        validate_mask(unit.mask_size, unit.blur_level)?;
        let kernel = gaussian::mask_1d(unit.profile, unit.mask_size, unit.blur_level);
        convolve_band(unit, &kernel, abort)
    }
}

fn convolve_band(unit: WorkUnit<'_>, kernel: &[f32], abort: &AtomicBool) -> Result<(), BlurError> {
    let WorkUnit {
        partition_id,
        rows,
        geometry,
        snapshot,
        target,
        ..
    } = unit;
    let width = geometry.width;
    let height = geometry.height;
    let channels = geometry.channels;
    let row_len = geometry.row_len();

    if rows.end_row() > height {
        return Err(BlurError::OutOfRange(format!(
            "partition {partition_id} rows {}..{} exceed image height {height}",
            rows.start_row,
            rows.end_row()
        )));
    }
    if target.len() != rows.row_count * row_len {
        return Err(BlurError::OutOfRange(format!(
            "partition {partition_id} target holds {} bytes, rows need {}",
            target.len(),
            rows.row_count * row_len
        )));
    }
    if rows.row_count == 0 || row_len == 0 {
        return Ok(());
    }

    let half = kernel.len() / 2;
    let halo_start = rows.start_row.saturating_sub(half);
    let halo_end = (rows.end_row() + half).min(height);
    let mut band = vec![0.0f32; (halo_end - halo_start) * row_len];

    // Horizontal pass: snapshot → band
    for (band_row, y) in band.chunks_exact_mut(row_len).zip(halo_start..halo_end) {
        if abort.load(Ordering::Relaxed) {
            return Err(BlurError::Aborted);
        }
        let src = snapshot_row(snapshot, y, row_len)?;
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = (x + k).saturating_sub(half).min(width - 1);
                    sum += src[sx * channels + c] as f32 * w;
                }
                band_row[x * channels + c] = sum;
            }
        }
    }

    // Vertical pass: band → target
    let mut taps: Vec<&[f32]> = Vec::with_capacity(kernel.len());
    for (dst, y) in target
        .chunks_exact_mut(row_len)
        .zip(rows.start_row..rows.end_row())
    {
        if abort.load(Ordering::Relaxed) {
            return Err(BlurError::Aborted);
        }
        taps.clear();
        for k in 0..kernel.len() {
            let sy = (y + k).saturating_sub(half).min(height - 1);
            let tap = sy
                .checked_sub(halo_start)
                .and_then(|band_y| band.get(band_y * row_len..(band_y + 1) * row_len))
                .ok_or_else(|| {
                    BlurError::OutOfRange(format!(
                        "partition {partition_id} halo misses row {sy} (band {halo_start}..{halo_end})"
                    ))
                })?;
            taps.push(tap);
        }
        for (i, out) in dst.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for (tap, &w) in taps.iter().zip(kernel) {
                sum += tap[i] * w;
            }
            *out = sum.round().clamp(0.0, 255.0) as u8;
        }
    }

    Ok(())
}

fn snapshot_row(snapshot: &[u8], y: usize, row_len: usize) -> Result<&[u8], BlurError> {
    snapshot.get(y * row_len..(y + 1) * row_len).ok_or_else(|| {
        BlurError::OutOfRange(format!(
            "row {y} lies outside the {}-byte snapshot",
            snapshot.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blurring::domain::blur_config::{BlurConfig, MaskProfile};
    use crate::blurring::domain::partitioner::Partitioner;
    use crate::blurring::domain::work_unit::{ImageGeometry, RowRange};

    fn geometry(width: usize, height: usize, channels: usize) -> ImageGeometry {
        ImageGeometry {
            width,
            height,
            channels,
        }
    }

    fn config(mask_size: usize, workers: usize) -> BlurConfig {
        BlurConfig {
            mask_size,
            blur_level: 1.0,
            iteration_count: 1,
            worker_count: workers,
            profile: MaskProfile::Gaussian,
        }
    }

    /// Runs every partition sequentially and returns the assembled output.
    fn blur_once(snapshot: &[u8], geometry: ImageGeometry, config: &BlurConfig) -> Vec<u8> {
        let mut target = vec![0u8; snapshot.len()];
        let abort = AtomicBool::new(false);
        let units = Partitioner::new(config.worker_count)
            .work_units(geometry, config, snapshot, &mut target)
            .unwrap();
        for unit in units {
            GaussianPartitionWorker::new().process(unit, &abort).unwrap();
        }
        target
    }

    fn gradient(geometry: ImageGeometry) -> Vec<u8> {
        (0..geometry.len()).map(|i| ((i * 37) % 251) as u8).collect()
    }

    #[test]
    fn test_uniform_image_unchanged() {
        let g = geometry(10, 10, 3);
        let snapshot = vec![128u8; g.len()];
        assert_eq!(blur_once(&snapshot, g, &config(5, 3)), snapshot);
    }

    #[test]
    fn test_bright_pixel_spreads() {
        let g = geometry(10, 10, 1);
        let mut snapshot = vec![0u8; g.len()];
        snapshot[5 * 10 + 5] = 255;
        let out = blur_once(&snapshot, g, &config(5, 1));
        assert!(out[5 * 10 + 5] < 255);
        assert!(out[5 * 10 + 6] > 0);
        assert!(out[4 * 10 + 5] > 0);
    }

    #[test]
    fn test_mask_size_one_is_identity() {
        let g = geometry(6, 5, 3);
        let snapshot = gradient(g);
        assert_eq!(blur_once(&snapshot, g, &config(1, 2)), snapshot);
    }

    #[test]
    fn test_partitioning_does_not_change_output() {
        let g = geometry(13, 17, 3);
        let snapshot = gradient(g);
        let whole = blur_once(&snapshot, g, &config(7, 1));
        for workers in [2, 3, 5, 17] {
            assert_eq!(blur_once(&snapshot, g, &config(7, workers)), whole, "workers={workers}");
        }
    }

    #[test]
    fn test_halo_reads_neighbour_partition() {
        // Bright row at the bottom of partition 0 must bleed into partition 1.
        let g = geometry(4, 4, 1);
        let mut snapshot = vec![0u8; g.len()];
        snapshot[4..8].fill(255);
        let out = blur_once(&snapshot, g, &config(3, 2));
        assert!(out[8..12].iter().all(|&v| v > 0));
    }

    #[test]
    fn test_mask_larger_than_image_clamps_to_edges() {
        let g = geometry(3, 2, 1);
        let snapshot = vec![10, 20, 30, 40, 50, 60];
        let out = blur_once(&snapshot, g, &config(9, 2));
        assert_eq!(out.len(), snapshot.len());
        assert!(out.iter().all(|&v| (10..=60).contains(&v)));
    }

    #[test]
    fn test_even_mask_rejected_without_writing() {
        let g = geometry(4, 4, 1);
        let snapshot = vec![9u8; g.len()];
        let mut target = vec![0u8; g.len()];
        let abort = AtomicBool::new(false);
        let units = Partitioner::new(1)
            .work_units(g, &config(4, 1), &snapshot, &mut target)
            .unwrap();
        let unit = units.into_iter().next().unwrap();
        let result = GaussianPartitionWorker::new().process(unit, &abort);
        assert!(matches!(result, Err(BlurError::InvalidConfiguration(_))));
        assert!(target.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_abort_flag_stops_worker() {
        let g = geometry(4, 4, 1);
        let snapshot = vec![9u8; g.len()];
        let mut target = vec![0u8; g.len()];
        let abort = AtomicBool::new(true);
        let mut units = Partitioner::new(1)
            .work_units(g, &config(3, 1), &snapshot, &mut target)
            .unwrap();
        let result = GaussianPartitionWorker::new().process(units.remove(0), &abort);
        assert_eq!(result, Err(BlurError::Aborted));
    }

    #[test]
    fn test_rows_past_image_are_out_of_range() {
        let g = geometry(2, 2, 1);
        let snapshot = vec![0u8; 4];
        let mut target = vec![0u8; 4];
        let unit = WorkUnit {
            partition_id: 0,
            partition_count: 1,
            rows: RowRange {
                start_row: 1,
                row_count: 2,
            },
            buffer_offset: 2,
            geometry: g,
            mask_size: 3,
            blur_level: 1.0,
            profile: MaskProfile::Gaussian,
            snapshot: &snapshot,
            target: &mut target,
        };
        let result = GaussianPartitionWorker::new().process(unit, &AtomicBool::new(false));
        assert!(matches!(result, Err(BlurError::OutOfRange(_))));
    }

    #[test]
    fn test_short_snapshot_is_out_of_range() {
        let g = geometry(2, 3, 1);
        let snapshot = vec![0u8; 2];
        let mut target = vec![0u8; 6];
        let unit = WorkUnit {
            partition_id: 0,
            partition_count: 1,
            rows: RowRange {
                start_row: 0,
                row_count: 3,
            },
            buffer_offset: 0,
            geometry: g,
            mask_size: 3,
            blur_level: 1.0,
            profile: MaskProfile::Binomial,
            snapshot: &snapshot,
            target: &mut target,
        };
        let result = GaussianPartitionWorker::new().process(unit, &AtomicBool::new(false));
        assert!(matches!(result, Err(BlurError::OutOfRange(_))));
    }
}
