use std::{io, path::PathBuf};

use thiserror::Error;
use write_fonts::{read::ReadError, tables::cmap::CmapConflict, types::Tag};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(#[source] clap::Error),
    #[error("'{0}' exists but is not a directory")]
    ExpectedDirectory(PathBuf),
    #[error("io failed for '{path}': '{source}'")]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Missing file '{0}'")]
    FileExpected(PathBuf),
    #[error("Unable to read font '{path}': {source}")]
    ReadFont {
        path: PathBuf,
        #[source]
        source: ReadError,
    },
    #[error("'{tag}' table not found in '{path}'")]
    MissingTable { path: PathBuf, tag: Tag },
    #[error("Offset {offset} is out of bounds for '{tag}' ({len} bytes)")]
    ByteOutOfRange { tag: Tag, offset: usize, len: usize },
    #[error("No glyph is mapped to {0:?}")]
    MissingGlyph(char),
    #[error("Glyph id {0} does not fit a layout table")]
    GlyphIdOverflow(u32),
    #[error("Glyph {0} is referenced but was not kept by the subset")]
    UnmappedGlyph(u32),
    #[error(transparent)]
    Cmap(#[from] CmapConflict),
    #[error("Generating bytes for '{tag}' failed: {reason}")]
    DumpTable { tag: Tag, reason: String },
    #[error("Duplicate identifier! {0}")]
    DuplicateIdentifier(String),
    #[error("Duplicate title! {0}")]
    DuplicateTitle(String),
    #[error("Duplicate description! {0}")]
    DuplicateDescription(String),
    #[error("Bad identifier pattern: {0}")]
    BadRegex(#[source] regex::Error),
    #[error("'{0}' is not a '-' separated sequence of lowercase words")]
    MalformedIdentifier(String),
    #[error("'{0}' does not start with a declared category")]
    UnknownCategory(String),
    #[error("Unsupported file type in fixture tree: '{0}'")]
    UnsupportedFileType(PathBuf),
    #[error("Writing archive '{path}' failed: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl Error {
    /// Wrap an [io::Error] with the path it happened on
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Error {
        let path = path.into();
        move |source| Error::FileIo { path, source }
    }
}
