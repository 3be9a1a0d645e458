use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::image_io::{load_image, save_png};
use crate::meta::{parse_glyphs, read_metadata, GlyphRecord};
use crate::{pack_atlas, unpack_atlas, Error, Layout};

/// Command line arguments of the `glyphpack` tool.
#[derive(Parser, Debug)]
#[command(name = "glyphpack", author, version, about, long_about = None)]
pub struct Args {
    /// Path to the glyph metadata file, one `<char> <x> <y> <width> <height>` per line
    pub metadata_path: PathBuf,
    /// Path to the atlas image the metadata describes
    pub source_image: PathBuf,
    /// Path to where the packed PNG should be written
    pub output_image: PathBuf,
    /// Reload the packed image and write the recovered glyph table to this path (txt, ron, json or rkyv)
    #[arg(short, long)]
    pub dump: Option<PathBuf>,
}

/// Output format of a glyph table dump, deduced from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DumpFormat {
    /// The metadata line format the tool reads
    Text,
    /// Rusty Object Notation
    Ron,
    /// JSON
    Json,
    /// rkyv archive of a `Vec<GlyphRecord>`
    Rkyv,
}

impl DumpFormat {
    /// Picks the format matching the extension of `path`.
    ///
    /// # Errors
    /// [`Error::DumpFormat`] for missing or unknown extensions.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        match path.extension().map(|os_str| os_str.to_str()) {
            Some(Some("txt")) => Ok(Self::Text),
            Some(Some("ron")) => Ok(Self::Ron),
            Some(Some("json")) => Ok(Self::Json),
            Some(Some("rkyv")) => Ok(Self::Rkyv),
            _ => Err(Error::DumpFormat {
                path: path.to_owned(),
            }),
        }
    }
}

/// Runs the whole pipeline: load metadata and image, pack, write the PNG,
/// and optionally dump what a loader would read back from it.
///
/// # Errors
/// The first failure of any stage; nothing is written before packing succeeds.
pub fn pack_files(args: &Args) -> Result<Layout, Error> {
    let dump = args
        .dump
        .as_deref()
        .map(|path| DumpFormat::from_path(path).map(|format| (path, format)))
        .transpose()?;

    let metadata = read_metadata(&args.metadata_path)?;
    let source = load_image(&args.source_image)?;
    let glyphs = parse_glyphs(&metadata)?;

    let (width, height) = (source.width(), source.height());
    let packed = pack_atlas(&glyphs, source)?;
    save_png(&packed.image, &args.output_image)?;

    tracing::info!(
        glyphs = glyphs.len(),
        reserved_rows = packed.layout.reserved_rows(),
        "packed {}x{} atlas into {}x{} {}",
        width,
        height,
        packed.image.width(),
        packed.image.height(),
        args.output_image.display(),
    );

    if let Some((path, format)) = dump {
        let reloaded = load_image(&args.output_image)?;
        let unpacked = unpack_atlas(&reloaded)?;
        write_dump(&unpacked.glyphs, path, format)?;
        tracing::info!(path = %path.display(), ?format, "wrote glyph dump");
    }

    Ok(packed.layout)
}

/// Serializes `glyphs` to `path` in the given format.
///
/// # Errors
/// [`Error::DumpSerialize`] if the table cannot be encoded,
/// [`Error::DumpWrite`] if the file cannot be written.
pub fn write_dump(glyphs: &[GlyphRecord], path: &Path, format: DumpFormat) -> Result<(), Error> {
    let serialized = match format {
        DumpFormat::Text => to_metadata_text(glyphs)?,
        DumpFormat::Ron => {
            ron::ser::to_string_pretty(&glyphs, ron::ser::PrettyConfig::default())
                .map_err(|e| Error::DumpSerialize(e.to_string()))?
                .into_bytes()
        }
        DumpFormat::Json => serde_json::to_string_pretty(&glyphs)
            .map_err(|e| Error::DumpSerialize(e.to_string()))?
            .into_bytes(),
        DumpFormat::Rkyv => rkyv::to_bytes::<_, 4096>(&glyphs.to_vec())
            .map_err(|e| Error::DumpSerialize(format!("{e:?}")))?
            .to_vec(),
    };

    std::fs::write(path, serialized).map_err(|source| Error::DumpWrite {
        path: path.to_owned(),
        source,
    })
}

fn to_metadata_text(glyphs: &[GlyphRecord]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    for glyph in glyphs {
        let codepoint = u8::try_from(glyph.codepoint).map_err(|_| {
            Error::DumpSerialize(format!(
                "codepoint {:#x} does not fit the single-byte text format",
                glyph.codepoint
            ))
        })?;

        let rect = glyph.rect;
        out.push(codepoint);
        writeln!(out, " {} {} {} {}", rect.x, rect.y, rect.width, rect.height)
            .map_err(|e| Error::DumpSerialize(e.to_string()))?;
    }
    Ok(out)
}
