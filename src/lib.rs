//! # epubinfo
//!
//! Extract bibliographic metadata (title, language, authors, identifiers,
//! cover image) from EPUB files.
//!
//! Nothing here leans on a general-purpose archive or XML library. The
//! crate carries its own pieces:
//!
//! - [`zip`]: a ZIP central-directory reader with stored and raw-DEFLATE
//!   entry extraction
//! - [`xml`]: a forward-only XML tokenizer over an in-memory buffer
//! - [`arena`]: a fixed-capacity bump allocator hosting token text
//! - [`epub`]: the state machine that goes from `container.xml` to the OPF
//!   `<metadata>` element
//!
//! ## Example
//!
//! ```no_run
//! use epubinfo::EpubDocument;
//!
//! fn main() -> epubinfo::Result<()> {
//!     let doc = EpubDocument::open("book.epub")?;
//!     println!("{} ({})", doc.title(), doc.language());
//!     for i in 0..doc.creator_count() {
//!         println!("by {}", doc.creator(i).unwrap_or_default());
//!     }
//!     doc.save_cover("cover.jpg")?;
//!     Ok(())
//! }
//! ```

pub mod arena;
pub mod cli;
pub mod config;
pub mod epub;
pub mod error;
pub mod io;
pub mod xml;
pub mod zip;

pub use arena::{Arena, ArenaError};
pub use cli::Cli;
pub use config::ExtractConfig;
pub use epub::{EpubDocument, Metadata, MetadataExtractor};
pub use error::{Error, Result};
pub use io::{LocalFileReader, ReadAt};
pub use zip::{ZipArchive, ZipEntry};
