use std::io;
use std::path::PathBuf;

/// Everything that can go wrong between reading the metadata file and writing the packed atlas.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The command line did not name exactly a metadata file, a source image and an output image.
    #[error("wrong number of arguments")]
    Usage,

    /// The metadata file could not be opened or read.
    #[error("failed to open metadata file {}: {source}", path.display())]
    MetadataOpen {
        /// Path that was passed on the command line
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// A metadata line does not follow `<char> <x> <y> <width> <height>`.
    #[error("malformed metadata on line {line}: {reason}")]
    MalformedLine {
        /// 1-based line number
        line: usize,
        /// What the tokenizer tripped over
        reason: String,
    },

    /// The source image could not be decoded.
    #[cfg(feature = "image")]
    #[error("failed to decode source image {}: {source}", path.display())]
    ImageDecode {
        /// Path of the source image
        path: PathBuf,
        /// Decoder failure
        source: image::ImageError,
    },

    /// The packed atlas could not be encoded or written.
    #[cfg(feature = "image")]
    #[error("failed to write output image {}: {source}", path.display())]
    ImageWrite {
        /// Path of the output image
        path: PathBuf,
        /// Encoder failure
        source: image::ImageError,
    },

    /// Image dimensions or record count cannot be laid out.
    #[error("invalid layout: {0}")]
    InvalidLayout(&'static str),

    /// A pixel buffer's length disagrees with its dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize {
        /// `width * height * channels`
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// The image encoder has no color type with this many channels.
    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u8),

    /// A packed atlas is too small to hold the metadata its record count announces.
    #[error("metadata region needs {needed} bytes, but only {available} are available")]
    TruncatedMetadata {
        /// Bytes the announced records occupy
        needed: usize,
        /// Bytes available in the metadata rows
        available: usize,
    },

    /// The recovered glyph table could not be written.
    #[error("failed to write glyph dump {}: {source}", path.display())]
    DumpWrite {
        /// Dump destination
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// The recovered glyph table could not be serialized.
    #[error("failed to serialize glyph dump: {0}")]
    DumpSerialize(String),

    /// The dump path's extension names no supported format.
    #[error("cannot deduce dump format from {} (supported: txt, ron, json, rkyv)", path.display())]
    DumpFormat {
        /// Dump destination
        path: PathBuf,
    },
}

impl Error {
    /// Process exit code reported by the command line tool.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Usage | Error::DumpFormat { .. } => 1,
            Error::MetadataOpen { .. } => 2,
            #[cfg(feature = "image")]
            Error::ImageDecode { .. } => 3,
            Error::MalformedLine { .. } => 4,
            Error::InvalidLayout(_)
            | Error::BufferSize { .. }
            | Error::UnsupportedChannels(_)
            | Error::TruncatedMetadata { .. } => 5,
            #[cfg(feature = "image")]
            Error::ImageWrite { .. } => 6,
            Error::DumpWrite { .. } | Error::DumpSerialize(_) => 6,
        }
    }
}
