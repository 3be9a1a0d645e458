use crate::layout::{Layout, CODEPOINT_SIZE, RECORD_COUNT_SIZE, RECT_SIZE};
use crate::meta::{GlyphRecord, GlyphRect, GlyphSequence};
use crate::pack::PixelBuffer;
use crate::Error;

/// Glyph metadata recovered from a packed atlas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnpackedAtlas {
    /// Records in stored order. Rectangles address the packed image, so
    /// their `y` includes the reserved rows.
    pub glyphs: GlyphSequence,
    /// Layout the records were found at
    pub layout: Layout,
}

impl UnpackedAtlas {
    /// The pixels below the metadata rows, i.e. the original atlas image.
    #[must_use]
    pub fn glyph_region<'a>(&self, packed: &'a PixelBuffer) -> &'a [u8] {
        &packed.as_bytes()[self.layout.reserved_bytes()..]
    }
}

/// Reads the glyph table back out of `packed`.
///
/// # Errors
/// [`Error::TruncatedMetadata`] if the image is too small for the record
/// count it announces.
pub fn unpack_atlas(packed: &PixelBuffer) -> Result<UnpackedAtlas, Error> {
    let bytes = packed.as_bytes();
    if bytes.len() < RECORD_COUNT_SIZE {
        return Err(Error::TruncatedMetadata {
            needed: RECORD_COUNT_SIZE,
            available: bytes.len(),
        });
    }

    let count = read_u32(bytes, 0) as usize;
    // a non-empty buffer has a non-zero width and channel count, so planning
    // can only fail on a count too large to lay out
    let layout = Layout::plan(count, u32::from(packed.channels()), packed.width()).map_err(|_| {
        Error::TruncatedMetadata {
            needed: count
                .saturating_mul(CODEPOINT_SIZE + RECT_SIZE)
                .saturating_add(RECORD_COUNT_SIZE),
            available: bytes.len(),
        }
    })?;
    if layout.reserved_rows() > packed.height() {
        return Err(Error::TruncatedMetadata {
            needed: layout.reserved_bytes(),
            available: bytes.len(),
        });
    }

    let codepoints = layout.codepoint_array_offset();
    let rects = layout.rect_array_offset();
    let glyphs = (0..count)
        .map(|i| {
            let at = rects + i * RECT_SIZE;
            GlyphRecord {
                codepoint: read_u16(bytes, codepoints + i * CODEPOINT_SIZE),
                rect: GlyphRect {
                    x: read_u32(bytes, at),
                    y: read_u32(bytes, at + 4),
                    width: read_u32(bytes, at + 8),
                    height: read_u32(bytes, at + 12),
                },
            }
        })
        .collect();

    Ok(UnpackedAtlas { glyphs, layout })
}

/// Reads a little-endian `u16` at `offset`.
///
/// # Panics
/// If `buf` is shorter than `offset + 2`.
#[must_use]
pub fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

/// Reads a little-endian `u32` at `offset`.
///
/// # Panics
/// If `buf` is shorter than `offset + 4`.
#[must_use]
pub fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}
