use crate::layout::{Layout, CODEPOINT_SIZE, RECT_SIZE};
use crate::meta::GlyphRecord;
use crate::Error;

/// Raw image data: row-major, channel-interleaved, one byte per sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl PixelBuffer {
    /// Wraps `pixels`, checking that its length matches the dimensions.
    ///
    /// # Errors
    /// [`Error::BufferSize`] on a length mismatch, [`Error::InvalidLayout`] if
    /// the expected length does not fit in memory.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self, Error> {
        let expected = byte_len(width, height, channels)?;
        if pixels.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self { pixels, width, height, channels })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel.
    #[must_use]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// The raw samples.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Gives up the raw samples.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }
}

fn byte_len(width: u32, height: u32, channels: u8) -> Result<usize, Error> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(usize::from(channels)))
        .ok_or(Error::InvalidLayout("image does not fit in memory"))
}

/// An atlas image with its glyph metadata stored in the top rows.
#[derive(Clone, Debug)]
pub struct PackedAtlas {
    /// Metadata rows followed by the original pixels
    pub image: PixelBuffer,
    /// Where the metadata was placed
    pub layout: Layout,
}

/// Prepends `glyphs` as binary metadata rows to `source`.
///
/// `source` is consumed; its pixels are released once they have been copied
/// below the metadata rows. Every rectangle's `y` is moved down by the number
/// of reserved rows so it still addresses the same pixels.
///
/// # Errors
/// [`Error::InvalidLayout`] if the image is degenerate, there are too many
/// glyphs, or a shifted rectangle would leave the `u32` range.
pub fn pack_atlas(glyphs: &[GlyphRecord], source: PixelBuffer) -> Result<PackedAtlas, Error> {
    let layout = Layout::plan(glyphs.len(), u32::from(source.channels), source.width)?;
    let rows = layout.reserved_rows();

    let height = source
        .height
        .checked_add(rows)
        .ok_or(Error::InvalidLayout("packed image is too tall"))?;
    let total_len = byte_len(source.width, height, source.channels)?;

    let mut pixels = Vec::with_capacity(total_len);
    pixels.resize(layout.reserved_bytes(), 0);
    pixels.extend_from_slice(&source.pixels);
    let (width, channels) = (source.width, source.channels);
    drop(source);

    write_u32(&mut pixels, layout.record_count_offset(), layout.record_count());

    let codepoints = layout.codepoint_array_offset();
    let rects = layout.rect_array_offset();
    for (i, glyph) in glyphs.iter().enumerate() {
        let rect = glyph
            .rect
            .shifted_down(rows)
            .ok_or(Error::InvalidLayout("glyph rectangle moves past the last row"))?;

        tracing::trace!(index = i, codepoint = glyph.codepoint, ?rect, "writing glyph record");

        write_u16(&mut pixels, codepoints + i * CODEPOINT_SIZE, glyph.codepoint);

        let at = rects + i * RECT_SIZE;
        write_u32(&mut pixels, at, rect.x);
        write_u32(&mut pixels, at + 4, rect.y);
        write_u32(&mut pixels, at + 8, rect.width);
        write_u32(&mut pixels, at + 12, rect.height);
    }

    debug_assert!(layout.used_bytes() <= layout.reserved_bytes());
    debug_assert_eq!(pixels.len(), total_len);

    Ok(PackedAtlas {
        image: PixelBuffer { pixels, width, height, channels },
        layout,
    })
}

/// Writes `value` little-endian at `offset`.
///
/// # Panics
/// If `buf` is shorter than `offset + 2`.
pub fn write_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// Writes `value` little-endian at `offset`.
///
/// # Panics
/// If `buf` is shorter than `offset + 4`.
pub fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{parse_glyphs, GlyphRect};

    fn gradient(width: u32, height: u32, channels: u8) -> PixelBuffer {
        let len = (width * height) as usize * usize::from(channels);
        let pixels = (0..len).map(|i| (i % 251) as u8 + 1).collect();
        PixelBuffer::new(pixels, width, height, channels).unwrap()
    }

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(buf: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(buf[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn packs_two_glyphs_into_one_row() {
        let glyphs = parse_glyphs(b"A 0 0 10 12\nB 10 0 8 12").unwrap();
        let source = gradient(100, 50, 4);
        let original = source.as_bytes().to_vec();

        let packed = pack_atlas(&glyphs, source).unwrap();
        let image = &packed.image;
        let bytes = image.as_bytes();

        assert_eq!(packed.layout.reserved_rows(), 1);
        assert_eq!((image.width(), image.height(), image.channels()), (100, 51, 4));

        assert_eq!(u32_at(bytes, 0), 2);
        assert_eq!(u16_at(bytes, 4), 0x41);
        assert_eq!(u16_at(bytes, 6), 0x42);

        let b_rect: Vec<u32> = (0..4).map(|k| u32_at(bytes, 8 + 16 + k * 4)).collect();
        assert_eq!(b_rect, [10, 1, 8, 12]);

        assert_eq!(&bytes[400..], &original[..]);
    }

    #[test]
    fn fields_are_little_endian() {
        let glyphs = vec![GlyphRecord {
            codepoint: 0x0102,
            rect: GlyphRect { x: 0x0304_0506, y: 0, width: 1, height: 1 },
        }];
        let packed = pack_atlas(&glyphs, gradient(64, 1, 1)).unwrap();
        let bytes = packed.image.as_bytes();

        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..6], &[0x02, 0x01]);
        assert_eq!(&bytes[6..10], &[0x06, 0x05, 0x04, 0x03]);
    }

    #[test]
    fn padding_after_the_fields_is_zero() {
        let glyphs = parse_glyphs(b"a 1 2 3 4\nb 5 6 7 8\nc 9 10 11 12").unwrap();
        let packed = pack_atlas(&glyphs, gradient(7, 3, 3)).unwrap();
        let layout = packed.layout;
        let bytes = packed.image.as_bytes();

        assert!(layout.reserved_bytes() > layout.used_bytes());
        assert!(bytes[layout.used_bytes()..layout.reserved_bytes()].iter().all(|&b| b == 0));
        assert!(bytes[layout.reserved_bytes()..].iter().all(|&b| b != 0));
    }

    #[test]
    fn arrays_share_record_order() {
        let glyphs: Vec<GlyphRecord> = (0u16..40)
            .map(|i| GlyphRecord {
                codepoint: 0x20 + i,
                rect: GlyphRect { x: u32::from(i) * 3, y: 7, width: 3, height: 9 },
            })
            .collect();
        let packed = pack_atlas(&glyphs, gradient(16, 16, 2)).unwrap();
        let rows = packed.layout.reserved_rows();
        let rects = packed.layout.rect_array_offset();
        let bytes = packed.image.as_bytes();

        for (i, glyph) in glyphs.iter().enumerate() {
            assert_eq!(u16_at(bytes, 4 + i * 2), glyph.codepoint);
            assert_eq!(u32_at(bytes, rects + i * 16), glyph.rect.x);
            assert_eq!(u32_at(bytes, rects + i * 16 + 4), glyph.rect.y + rows);
        }
    }

    #[test]
    fn empty_metadata_writes_only_the_count() {
        let packed = pack_atlas(&[], gradient(2, 2, 4)).unwrap();
        let bytes = packed.image.as_bytes();

        assert_eq!(packed.layout.reserved_rows(), 1);
        assert_eq!(packed.image.height(), 3);
        assert_eq!(&bytes[..8], &[0; 8]);
        assert_eq!(bytes.len(), 2 * 3 * 4);
    }

    #[test]
    fn shifted_rectangle_overflow_is_rejected() {
        let glyphs = vec![GlyphRecord {
            codepoint: u16::from(b'x'),
            rect: GlyphRect { x: 0, y: u32::MAX, width: 1, height: 1 },
        }];
        let err = pack_atlas(&glyphs, gradient(8, 8, 4)).unwrap_err();
        assert!(matches!(err, Error::InvalidLayout(_)));
    }

    #[test]
    fn buffer_length_must_match_dimensions() {
        let err = PixelBuffer::new(vec![0; 10], 2, 2, 3).unwrap_err();
        assert!(matches!(err, Error::BufferSize { expected: 12, actual: 10 }));
    }
}
