use std::fmt;

use crate::shared::pixel_buffer::PixelBuffer;

use super::blur_config::MaskProfile;

/// Width, height and bytes per pixel of the image being blurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageGeometry {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl ImageGeometry {
    pub fn of(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width() as usize,
            height: buffer.height() as usize,
            channels: buffer.channels() as usize,
        }
    }

    pub fn row_len(&self) -> usize {
        self.width * self.channels
    }

    pub fn len(&self) -> usize {
        self.row_len() * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Contiguous band of rows `[start_row, start_row + row_count)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub start_row: usize,
    pub row_count: usize,
}

impl RowRange {
    pub fn end_row(&self) -> usize {
        self.start_row + self.row_count
    }
}

/// One partition's share of an iteration.
///
/// `snapshot` is the whole image as it stood before the iteration and is
/// shared read-only by every unit. `target` covers exactly this unit's rows
/// and is lent to one worker only, so sibling units never alias.
pub struct WorkUnit<'a> {
    pub partition_id: usize,
    pub partition_count: usize,
    pub rows: RowRange,
    /// Byte index in the image where `target` begins.
    pub buffer_offset: usize,
    pub geometry: ImageGeometry,
    pub mask_size: usize,
    pub blur_level: f64,
    pub profile: MaskProfile,
    pub snapshot: &'a [u8],
    pub target: &'a mut [u8],
}

impl fmt::Display for WorkUnit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partition {}/{}: rows {}..{} of {}x{}, offset {}",
            self.partition_id,
            self.partition_count,
            self.rows.start_row,
            self.rows.end_row(),
            self.geometry.width,
            self.geometry.height,
            self.buffer_offset
        )
    }
}
