//! EPUB metadata extraction built on the ZIP reader and XML tokenizer.

mod cover;
mod document;
mod metadata;

pub use cover::locate_cover;
pub use document::EpubDocument;
pub use metadata::{
    CONTAINER_PATH, Extraction, ExtractionState, Metadata, MetadataExtractor, extract_metadata,
};
