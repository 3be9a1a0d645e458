//! Placement of the metadata block inside the reserved pixel rows.
//!
//! The block is a flat little-endian byte stream starting at the first byte of
//! the image:
//!
//! | offset            | size     | content                          |
//! |-------------------|----------|----------------------------------|
//! | `0`               | 4        | record count `n`                 |
//! | `4`               | `2 * n`  | codepoints                       |
//! | `4 + 2 * n`       | `16 * n` | rectangles as `x, y, width, height` |
//!
//! The row count is computed as if the rectangle array started on the next
//! multiple of the channel count, while the rectangles are actually written
//! right after the codepoints, so the reservation may exceed the used bytes by
//! up to `channels - 1`.

use crate::Error;

/// Byte size of the record count field.
pub const RECORD_COUNT_SIZE: usize = 4;
/// Byte size of a single codepoint entry.
pub const CODEPOINT_SIZE: usize = 2;
/// Byte size of a single rectangle entry.
pub const RECT_SIZE: usize = 16;

/// Offset of the record count within the metadata block.
pub const RECORD_COUNT_OFFSET: usize = 0;
/// Offset of the codepoint array within the metadata block.
pub const CODEPOINT_ARRAY_OFFSET: usize = RECORD_COUNT_OFFSET + RECORD_COUNT_SIZE;

/// Where the metadata goes, for a given record count and image geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    record_count: u32,
    reserved_rows: u32,
    row_bytes: usize,
}

impl Layout {
    /// Computes how many pixel rows are needed to hold `record_count` records
    /// in an image `width` pixels wide with `channels` bytes per pixel.
    ///
    /// # Errors
    /// [`Error::InvalidLayout`] if `width` or `channels` is zero, or if any size
    /// involved does not fit the integer types of the output format.
    pub fn plan(record_count: usize, channels: u32, width: u32) -> Result<Self, Error> {
        if width == 0 {
            return Err(Error::InvalidLayout("image width is zero"));
        }
        if channels == 0 {
            return Err(Error::InvalidLayout("image has no channels"));
        }

        let too_many = || Error::InvalidLayout("too many glyph records");
        let record_count_field = u32::try_from(record_count).map_err(|_| too_many())?;

        let channels = usize::try_from(channels)
            .map_err(|_| Error::InvalidLayout("channel count exceeds address space"))?;
        let width = usize::try_from(width)
            .map_err(|_| Error::InvalidLayout("image width exceeds address space"))?;
        let row_bytes = width
            .checked_mul(channels)
            .ok_or(Error::InvalidLayout("row size overflows"))?;

        let codepoint_bytes = record_count.checked_mul(CODEPOINT_SIZE).ok_or_else(too_many)?;
        let rect_bytes = record_count.checked_mul(RECT_SIZE).ok_or_else(too_many)?;

        let total = RECORD_COUNT_SIZE
            .checked_add(codepoint_bytes)
            .and_then(|n| round_up(n, channels))
            .and_then(|n| n.checked_add(rect_bytes))
            .ok_or_else(too_many)?;

        let rows = total.div_ceil(row_bytes).max(1);
        if rows.checked_mul(row_bytes).is_none() {
            return Err(too_many());
        }
        let reserved_rows = u32::try_from(rows)
            .map_err(|_| Error::InvalidLayout("metadata needs more rows than an image can have"))?;

        tracing::debug!(
            record_count,
            channels,
            width,
            total,
            reserved_rows,
            "planned metadata layout"
        );

        Ok(Self {
            record_count: record_count_field,
            reserved_rows,
            row_bytes,
        })
    }

    /// Number of records the metadata block holds.
    #[must_use]
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// Number of pixel rows prepended to the image.
    #[must_use]
    pub fn reserved_rows(&self) -> u32 {
        self.reserved_rows
    }

    /// Byte size of a pixel row.
    #[must_use]
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Byte size of all reserved rows together.
    #[must_use]
    pub fn reserved_bytes(&self) -> usize {
        self.row_bytes * self.reserved_rows as usize
    }

    /// Offset of the record count field.
    #[must_use]
    pub fn record_count_offset(&self) -> usize {
        RECORD_COUNT_OFFSET
    }

    /// Offset of the first codepoint.
    #[must_use]
    pub fn codepoint_array_offset(&self) -> usize {
        CODEPOINT_ARRAY_OFFSET
    }

    /// Offset of the first rectangle, directly after the last codepoint.
    #[must_use]
    pub fn rect_array_offset(&self) -> usize {
        CODEPOINT_ARRAY_OFFSET + self.record_count as usize * CODEPOINT_SIZE
    }

    /// Number of bytes the fields actually occupy.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.rect_array_offset() + self.record_count as usize * RECT_SIZE
    }
}

/// Rounds `value` up to the next multiple of `multiple`.
fn round_up(value: usize, multiple: usize) -> Option<usize> {
    value.div_ceil(multiple).checked_mul(multiple)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_glyphs_in_a_wide_rgba_image_need_one_row() {
        let layout = Layout::plan(2, 4, 100).unwrap();
        assert_eq!(layout.reserved_rows(), 1);
        assert_eq!(layout.record_count(), 2);
        assert_eq!(layout.record_count_offset(), 0);
        assert_eq!(layout.codepoint_array_offset(), 4);
        assert_eq!(layout.rect_array_offset(), 8);
        assert_eq!(layout.used_bytes(), 40);
        assert_eq!(layout.reserved_bytes(), 400);
    }

    #[test]
    fn no_records_still_reserve_a_row() {
        for channels in [1, 2, 3, 4] {
            for width in [1, 2, 7, 512] {
                let layout = Layout::plan(0, channels, width).unwrap();
                assert!(layout.reserved_rows() >= 1);
                assert_eq!(layout.used_bytes(), 4);
                assert!(layout.reserved_bytes() >= 4);
            }
        }
    }

    #[test]
    fn reserved_rows_are_minimal_for_power_of_two_channels() {
        for channels in [1u32, 2, 4, 8] {
            for width in 1u32..=40 {
                for count in 0usize..=64 {
                    let layout = Layout::plan(count, channels, width).unwrap();
                    let row = (channels * width) as usize;
                    let needed = 4 + count * 2 + count * 16;
                    let rows = layout.reserved_rows() as usize;

                    assert!(rows * row >= needed, "c={channels} w={width} n={count}");
                    assert!(rows == 1 || (rows - 1) * row < needed, "c={channels} w={width} n={count}");
                }
            }
        }
    }

    #[test]
    fn reservation_covers_fields_for_any_channel_count() {
        for channels in 1u32..=7 {
            for width in 1u32..=17 {
                for count in 0usize..=50 {
                    let layout = Layout::plan(count, channels, width).unwrap();
                    assert!(layout.reserved_bytes() >= layout.used_bytes());
                }
            }
        }
    }

    #[test]
    fn rounding_only_affects_row_count() {
        // 4 + 2*1 = 6 rounds to 8 before adding the rectangle, so 24 bytes are
        // reserved for a 22 byte block. The rectangle is still written at 6.
        let layout = Layout::plan(1, 4, 1).unwrap();
        assert_eq!(layout.reserved_rows(), 6);
        assert_eq!(layout.rect_array_offset(), 6);

        let layout = Layout::plan(1, 8, 1).unwrap();
        assert_eq!(layout.reserved_rows(), 3);
    }

    #[test]
    fn narrow_images_spread_over_many_rows() {
        let layout = Layout::plan(100, 1, 3).unwrap();
        assert_eq!(layout.reserved_rows(), (4 + 1800usize).div_ceil(3) as u32);
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        assert!(matches!(Layout::plan(1, 4, 0), Err(Error::InvalidLayout(_))));
        assert!(matches!(Layout::plan(1, 0, 10), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn record_count_must_fit_the_count_field() {
        assert!(matches!(Layout::plan(usize::MAX, 4, 10), Err(Error::InvalidLayout(_))));
    }
}
