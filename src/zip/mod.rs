//! ZIP archive parsing and extraction.
//!
//! Just enough of the format to pull single entries out of an EPUB: the
//! End of Central Directory Record, the central directory, and stored or
//! raw-DEFLATE payloads.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`archive`]: The opened archive and entry decompression
//!
//! ## Limitations
//!
//! - No ZIP64 support
//! - No encryption support
//! - No multi-disk archive support
//! - Only STORED (0) and DEFLATE (8) compression methods

mod archive;
mod parser;
mod structures;

pub use archive::{DEFAULT_MAX_ENTRY_SIZE, ZipArchive};
pub use parser::ZipParser;
pub use structures::*;
