use std::path::Path;

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};

use crate::{Error, PixelBuffer};

/// Decodes the image at `path` into 8-bit samples, keeping its channel count.
///
/// # Errors
/// [`Error::ImageDecode`] if the file cannot be read or decoded.
pub fn load_image(path: &Path) -> Result<PixelBuffer, Error> {
    let image = image::open(path).map_err(|source| Error::ImageDecode {
        path: path.to_owned(),
        source,
    })?;

    let buffer = to_pixel_buffer(image)?;
    tracing::debug!(
        path = %path.display(),
        width = buffer.width(),
        height = buffer.height(),
        channels = buffer.channels(),
        "decoded source image"
    );
    Ok(buffer)
}

/// Converts a decoded image to one byte per sample.
///
/// # Errors
/// Only if the decoded dimensions do not fit in memory.
pub fn to_pixel_buffer(image: DynamicImage) -> Result<PixelBuffer, Error> {
    let (width, height) = GenericImageView::dimensions(&image);

    let (channels, pixels) = match image {
        DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
        // wider samples are narrowed, keeping the channel layout
        other => match other.color().channel_count() {
            1 => (1, other.into_luma8().into_raw()),
            2 => (2, other.into_luma_alpha8().into_raw()),
            3 => (3, other.into_rgb8().into_raw()),
            _ => (4, other.into_rgba8().into_raw()),
        },
    };

    PixelBuffer::new(pixels, width, height, channels)
}

/// Writes `buffer` to `path` as a PNG.
///
/// # Errors
/// [`Error::UnsupportedChannels`] for channel counts PNG cannot express,
/// [`Error::ImageWrite`] if encoding or writing fails.
pub fn save_png(buffer: &PixelBuffer, path: &Path) -> Result<(), Error> {
    let color = match buffer.channels() {
        1 => ColorType::L8,
        2 => ColorType::La8,
        3 => ColorType::Rgb8,
        4 => ColorType::Rgba8,
        n => return Err(Error::UnsupportedChannels(n)),
    };

    let is_png = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if !is_png {
        tracing::warn!(path = %path.display(), "output is always PNG encoded, regardless of extension");
    }

    image::save_buffer_with_format(
        path,
        buffer.as_bytes(),
        buffer.width(),
        buffer.height(),
        color,
        ImageFormat::Png,
    )
    .map_err(|source| Error::ImageWrite {
        path: path.to_owned(),
        source,
    })
}
