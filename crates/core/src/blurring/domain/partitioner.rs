use super::blur_config::BlurConfig;
use super::blur_error::BlurError;
use super::work_unit::{ImageGeometry, RowRange, WorkUnit};

/// Splits an image into contiguous, gap-free row bands, one per worker.
#[derive(Clone, Copy, Debug)]
pub struct Partitioner {
    worker_count: usize,
}

impl Partitioner {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
        }
    }

    /// Number of partitions actually produced for an image of `height` rows.
    ///
    /// Never exceeds the row count, so every partition owns at least one row.
    pub fn effective_worker_count(&self, height: usize) -> usize {
        self.worker_count.min(height)
    }

    /// Row bands covering `[0, height)`. The first `height % n` bands get one
    /// extra row.
    pub fn rows(&self, height: usize) -> Vec<RowRange> {
        let count = self.effective_worker_count(height);
        if count == 0 {
            return Vec::new();
        }
        let base = height / count;
        let remainder = height % count;

        let mut ranges = Vec::with_capacity(count);
        let mut start_row = 0;
        for i in 0..count {
            let row_count = base + usize::from(i < remainder);
            ranges.push(RowRange {
                start_row,
                row_count,
            });
            start_row += row_count;
        }
        ranges
    }

    /// Builds one [`WorkUnit`] per row band, handing each a disjoint slice of
    /// `target` and a shared view of `snapshot`.
    pub fn work_units<'a>(
        &self,
        geometry: ImageGeometry,
        config: &BlurConfig,
        snapshot: &'a [u8],
        target: &'a mut [u8],
    ) -> Result<Vec<WorkUnit<'a>>, BlurError> {
        let expected = geometry.len();
        if snapshot.len() != expected {
            return Err(BlurError::InvalidBuffer {
                expected,
                actual: snapshot.len(),
            });
        }
        if target.len() != expected {
            return Err(BlurError::InvalidBuffer {
                expected,
                actual: target.len(),
            });
        }

        let row_len = geometry.row_len();
        let ranges = self.rows(geometry.height);
        let partition_count = ranges.len();
        let mut units = Vec::with_capacity(partition_count);
        let mut rest = target;
        let mut buffer_offset = 0;

        for (partition_id, rows) in ranges.into_iter().enumerate() {
            let len = rows.row_count * row_len;
            if len > rest.len() {
                return Err(BlurError::OutOfRange(format!(
                    "partition {partition_id} needs {len} bytes at offset {buffer_offset}, {} left",
                    rest.len()
                )));
            }
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(len);
            rest = tail;
            units.push(WorkUnit {
                partition_id,
                partition_count,
                rows,
                buffer_offset,
                geometry,
                mask_size: config.mask_size,
                blur_level: config.blur_level,
                profile: config.profile,
                snapshot,
                target: chunk,
            });
            buffer_offset += len;
        }

        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_exact_cover(ranges: &[RowRange], height: usize) {
        let mut next = 0;
        for r in ranges {
            assert_eq!(r.start_row, next, "gap or overlap at row {next}");
            assert!(r.row_count >= 1);
            next = r.end_row();
        }
        assert_eq!(next, height);
    }

    #[test]
    fn test_cover_and_balance_for_many_shapes() {
        for height in 1..=64 {
            for workers in 1..=70 {
                let ranges = Partitioner::new(workers).rows(height);
                assert_eq!(ranges.len(), workers.min(height));
                assert_exact_cover(&ranges, height);
                let max = ranges.iter().map(|r| r.row_count).max().unwrap();
                let min = ranges.iter().map(|r| r.row_count).min().unwrap();
                assert!(max - min <= 1, "h={height} w={workers}");
            }
        }
    }

    #[rstest]
    #[case::even_split(8, 4, vec![2, 2, 2, 2])]
    #[case::remainder_goes_first(10, 4, vec![3, 3, 2, 2])]
    #[case::single_worker(7, 1, vec![7])]
    #[case::clamped_to_height(3, 8, vec![1, 1, 1])]
    fn test_row_counts(#[case] height: usize, #[case] workers: usize, #[case] expected: Vec<usize>) {
        let counts: Vec<usize> = Partitioner::new(workers)
            .rows(height)
            .iter()
            .map(|r| r.row_count)
            .collect();
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_zero_workers_treated_as_one() {
        assert_eq!(Partitioner::new(0).rows(5), vec![RowRange { start_row: 0, row_count: 5 }]);
    }

    #[test]
    fn test_empty_image_has_no_partitions() {
        assert!(Partitioner::new(4).rows(0).is_empty());
    }

    #[test]
    fn test_work_units_slice_target_disjointly() {
        let geometry = ImageGeometry {
            width: 2,
            height: 5,
            channels: 3,
        };
        let snapshot = vec![1u8; geometry.len()];
        let mut target = vec![0u8; geometry.len()];
        let config = BlurConfig {
            worker_count: 2,
            ..BlurConfig::default()
        };

        let units = Partitioner::new(2)
            .work_units(geometry, &config, &snapshot, &mut target)
            .unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].buffer_offset, 0);
        assert_eq!(units[0].target.len(), 3 * 6);
        assert_eq!(units[1].buffer_offset, 3 * 6);
        assert_eq!(units[1].target.len(), 2 * 6);
        assert!(units.iter().all(|u| u.snapshot.len() == geometry.len()));
        assert!(units.iter().all(|u| u.partition_count == 2));
        assert_eq!(units[1].mask_size, config.mask_size);
    }

    #[test]
    fn test_work_units_reject_mismatched_buffers() {
        let geometry = ImageGeometry {
            width: 2,
            height: 2,
            channels: 1,
        };
        let snapshot = vec![0u8; 3];
        let mut target = vec![0u8; 4];
        let result = Partitioner::new(1).work_units(
            geometry,
            &BlurConfig::default(),
            &snapshot,
            &mut target,
        );
        assert!(matches!(
            result,
            Err(BlurError::InvalidBuffer {
                expected: 4,
                actual: 3
            })
        ));
    }
}
