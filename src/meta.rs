use std::path::Path;

use crate::Error;

/// Location of a glyph's bitmap inside the atlas image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serde-deserialize", derive(serde::Deserialize))]
#[cfg_attr(any(feature = "rkyv-serialize", feature = "rkyv-deserialize"), derive(rkyv::Archive))]
#[cfg_attr(feature = "rkyv-serialize", derive(rkyv::Serialize))]
#[cfg_attr(feature = "rkyv-deserialize", derive(rkyv::Deserialize))]
pub struct GlyphRect {
    /// Left edge, in pixels
    pub x: u32,
    /// Top edge, in pixels
    pub y: u32,
    /// Width, in pixels
    pub width: u32,
    /// Height, in pixels
    pub height: u32,
}

impl GlyphRect {
    /// Moves the rectangle `rows` pixels down, or returns `None` if `y` would overflow.
    #[must_use]
    pub fn shifted_down(self, rows: u32) -> Option<Self> {
        Some(Self { y: self.y.checked_add(rows)?, ..self })
    }
}

/// A single glyph: its character code and where its bitmap lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serde-deserialize", derive(serde::Deserialize))]
#[cfg_attr(any(feature = "rkyv-serialize", feature = "rkyv-deserialize"), derive(rkyv::Archive))]
#[cfg_attr(feature = "rkyv-serialize", derive(rkyv::Serialize))]
#[cfg_attr(feature = "rkyv-deserialize", derive(rkyv::Deserialize))]
pub struct GlyphRecord {
    /// Character code. Only single-byte values are produced by the loader.
    pub codepoint: u16,
    /// Bitmap location
    pub rect: GlyphRect,
}

/// Glyphs in metadata file order.
///
/// The packer writes codepoints and rectangles as two parallel arrays, so the
/// position of a record in this sequence is its index in both.
pub type GlyphSequence = Vec<GlyphRecord>;

const FIELD_NAMES: [&str; 4] = ["x", "y", "width", "height"];

/// Reads the metadata file at `path`.
///
/// # Errors
/// [`Error::MetadataOpen`] if the file cannot be read, [`Error::MalformedLine`]
/// for the first line that does not parse.
pub fn load_glyphs(path: &Path) -> Result<GlyphSequence, Error> {
    parse_glyphs(&read_metadata(path)?)
}

/// Reads the raw bytes of the metadata file at `path`.
///
/// # Errors
/// [`Error::MetadataOpen`] if the file cannot be read.
pub fn read_metadata(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|source| Error::MetadataOpen {
        path: path.to_owned(),
        source,
    })
}

/// Parses metadata text, one glyph per line.
///
/// Bytes are taken as-is rather than decoded as UTF-8, since the first byte of
/// every line is the codepoint itself. Empty lines are skipped.
///
/// # Errors
/// [`Error::MalformedLine`] for the first line that does not parse.
pub fn parse_glyphs(data: &[u8]) -> Result<GlyphSequence, Error> {
    let mut glyphs = GlyphSequence::new();

    for (idx, line) in data.split(|&b| b == b'\n').enumerate() {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            tracing::debug!(line = idx + 1, "skipping empty metadata line");
            continue;
        }

        let glyph = parse_line(line).map_err(|reason| Error::MalformedLine {
            line: idx + 1,
            reason,
        })?;
        glyphs.push(glyph);
    }

    tracing::debug!(count = glyphs.len(), "loaded glyph metadata");
    Ok(glyphs)
}

/// Parses a single `<char> <x> <y> <width> <height>` line.
///
/// The first byte is the codepoint, the second must be whitespace, and the
/// remainder must hold exactly four whitespace-separated decimal numbers.
///
/// # Errors
/// A description of the problem, without line information.
pub fn parse_line(line: &[u8]) -> Result<GlyphRecord, String> {
    let (&codepoint, rest) = line.split_first().ok_or("line is empty")?;

    match rest.split_first() {
        Some((sep, _)) if sep.is_ascii_whitespace() => {}
        Some((sep, _)) => {
            return Err(format!(
                "expected whitespace after the character, found byte {sep:#04x}"
            ))
        }
        None => return Err("missing glyph rectangle".into()),
    }

    let mut tokens = rest
        .split(u8::is_ascii_whitespace)
        .filter(|token| !token.is_empty());

    let mut fields = [0u32; 4];
    for (field, name) in fields.iter_mut().zip(FIELD_NAMES) {
        let Some(token) = tokens.next() else {
            return Err(format!("missing field `{name}`"));
        };

        *field = std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                format!(
                    "field `{name}` is not an unsigned 32-bit number: {:?}",
                    String::from_utf8_lossy(token)
                )
            })?;
    }

    if let Some(extra) = tokens.next() {
        return Err(format!(
            "unexpected trailing data {:?}",
            String::from_utf8_lossy(extra)
        ));
    }

    let [x, y, width, height] = fields;
    Ok(GlyphRecord {
        codepoint: u16::from(codepoint),
        rect: GlyphRect { x, y, width, height },
    })
}
