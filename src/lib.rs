//! Packs bitmap font metadata into the atlas image it describes.
//!
//! The glyph table is written as raw little-endian integers into extra pixel
//! rows prepended to the atlas, so a loader only needs the decoded image to
//! recover every glyph:
//!
//! 1. a `u32` record count at byte 0,
//! 2. one `u16` codepoint per glyph starting at byte 4,
//! 3. one `x, y, width, height` rectangle of `u32`s per glyph directly after
//!    the codepoints. Each `y` already accounts for the prepended rows.
//!
//! See [`layout`] for how many rows are reserved.
//!
//! # Usage
//! ```
//! use glyph_atlas_pack::{pack_atlas, parse_glyphs, unpack_atlas, PixelBuffer};
//!
//! # fn test() -> Result<(), glyph_atlas_pack::Error> {
//! let glyphs = parse_glyphs(b"A 0 0 10 12\nB 10 0 8 12\n")?;
//! let atlas = PixelBuffer::new(vec![0xff; 100 * 50 * 4], 100, 50, 4)?;
//!
//! let packed = pack_atlas(&glyphs, atlas)?;
//! assert_eq!(packed.layout.reserved_rows(), 1);
//! assert_eq!(packed.image.height(), 51);
//!
//! // A loader reads the same table back from the pixels alone:
//! let table = unpack_atlas(&packed.image)?;
//! assert_eq!(table.glyphs[1].codepoint, u16::from(b'B'));
//! assert_eq!(table.glyphs[1].rect.y, 1);
//! # Ok(())
//! # }
//! # test().unwrap();
//! ```
//!
//! With the `bin` feature, the `glyphpack` executable runs the same pipeline on
//! files: `glyphpack <metadata-file> <source-image> <output-image>`.

#![cfg_attr(docs_rs, feature(doc_cfg))]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]

mod error;
pub mod layout;
mod meta;
mod pack;
mod unpack;

pub use error::Error;
pub use layout::Layout;
pub use meta::{load_glyphs, parse_glyphs, parse_line, read_metadata, GlyphRecord, GlyphRect, GlyphSequence};
pub use pack::{pack_atlas, write_u16, write_u32, PackedAtlas, PixelBuffer};
pub use unpack::{read_u16, read_u32, unpack_atlas, UnpackedAtlas};

#[cfg(feature = "bin")]
mod cli;
#[cfg(feature = "bin")]
mod image_io;

#[cfg(feature = "bin")]
pub use cli::{pack_files, write_dump, Args, DumpFormat};
#[cfg(feature = "bin")]
pub use image_io::{load_image, save_png, to_pixel_buffer};
