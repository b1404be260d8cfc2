use std::io;

use crate::arena::ArenaError;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading an EPUB
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Open, seek or read failure on the underlying byte source
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad header, missing EOCDR, truncated or inconsistent central directory
    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    /// Compression method other than stored (0) or raw DEFLATE (8)
    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    /// The inflate stream was incomplete or corrupt
    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    /// Unterminated tag or attribute without its delimiters
    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// A structural element the pipeline depends on is absent
    #[error("Required element not found: {0}")]
    RequiredElementNotFound(&'static str),

    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// A buffer reservation was refused by the allocator
    #[error("Out of memory")]
    OutOfMemory,
}

impl Error {
    pub(crate) fn malformed_archive(msg: impl Into<String>) -> Self {
        Error::MalformedArchive(msg.into())
    }

    /// Short reads while decoding archive structures mean the archive is
    /// truncated, not that the source is unavailable.
    pub(crate) fn from_structure_read(err: io::Error, what: &str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::MalformedArchive(format!("truncated {what}"))
        } else {
            Error::Io(err)
        }
    }
}
