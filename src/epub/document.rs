use std::path::Path;

use crate::arena::Arena;
use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt};
use crate::zip::{ZipArchive, ZipEntry};

use super::cover::locate_cover;
use super::metadata::{Metadata, MetadataExtractor};

/// A successfully opened EPUB and its metadata.
///
/// Everything the accessors hand out is owned by the document and released
/// when it is dropped.
pub struct EpubDocument<R: ReadAt = LocalFileReader> {
    archive: ZipArchive<R>,
    opf_path: String,
    metadata: Metadata,
    config: ExtractConfig,
}

impl EpubDocument<LocalFileReader> {
    /// Open an EPUB from the filesystem with the default limits.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &ExtractConfig::default())
    }

    /// Open an EPUB from the filesystem with explicit limits.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the `.epub` file
    /// * `config` - Arena capacity and per-entry size limit
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be opened, otherwise any error of
    /// [`from_reader`](EpubDocument::from_reader).
    pub fn open_with(path: impl AsRef<Path>, config: &ExtractConfig) -> Result<Self> {
        let reader = LocalFileReader::new(path.as_ref())?;
        Self::from_reader(reader, config)
    }

    /// Open an EPUB, logging the reason and returning `None` on failure.
    pub fn load(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to open epub");
                None
            }
        }
    }
}

impl<R: ReadAt> EpubDocument<R> {
    /// Read the archive structure and extract the metadata from `reader`.
    ///
    /// # Arguments
    ///
    /// * `reader` - Any byte source holding the EPUB
    /// * `config` - Arena capacity and per-entry size limit
    ///
    /// # Returns
    ///
    /// A document with its metadata fully extracted. There is no partially
    /// populated document: any failure aborts the open.
    ///
    /// # Errors
    ///
    /// * [`Error::MalformedArchive`] and the other archive errors from
    ///   [`ZipArchive::open`]
    /// * [`Error::RequiredElementNotFound`] if `container.xml`, its rootfile,
    ///   the OPF or its `<metadata>` element is missing
    /// * [`Error::MalformedXml`] for an unterminated tag or unclosed
    ///   `<metadata>`
    /// * [`Error::Arena`] if a single token does not fit the arena
    pub fn from_reader(reader: R, config: &ExtractConfig) -> Result<Self> {
        let archive = ZipArchive::open(reader)?.with_max_entry_size(config.max_entry_size);
        let extraction = MetadataExtractor::new(config)?.extract(&archive)?;

        Ok(Self {
            archive,
            opf_path: extraction.opf_path,
            metadata: extraction.metadata,
            config: config.clone(),
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Archive path of the OPF package document
    pub fn opf_path(&self) -> &str {
        &self.opf_path
    }

    pub fn entries(&self) -> &[ZipEntry] {
        self.archive.entries()
    }

    /// Title, or `""` when absent.
    pub fn title(&self) -> &str {
        self.metadata.title()
    }

    pub fn subtitle(&self) -> &str {
        self.metadata.subtitle()
    }

    pub fn language(&self) -> &str {
        self.metadata.language()
    }

    pub fn description(&self) -> &str {
        self.metadata.description()
    }

    pub fn publisher(&self) -> &str {
        self.metadata.publisher()
    }

    pub fn author_count(&self) -> usize {
        self.metadata.author_count()
    }

    /// Author at `index` (0-based), or `None` past the end.
    pub fn author(&self, index: usize) -> Option<&str> {
        self.metadata.author(index)
    }

    pub fn creator_count(&self) -> usize {
        self.metadata.creator_count()
    }

    pub fn creator(&self, index: usize) -> Option<&str> {
        self.metadata.creator(index)
    }

    pub fn identifier_count(&self) -> usize {
        self.metadata.identifier_count()
    }

    pub fn identifier(&self, index: usize) -> Option<&str> {
        self.metadata.identifier(index)
    }

    /// Archive path of the cover image, if the manifest names one.
    pub fn cover_path(&self) -> Result<Option<String>> {
        let opf = self
            .archive
            .read_file(&self.opf_path)?
            .ok_or(Error::RequiredElementNotFound("OPF package document"))?;
        let mut arena = Arena::init(self.config.arena_capacity)?;
        locate_cover(&mut arena, &String::from_utf8_lossy(&opf), &self.opf_path)
    }

    /// Raw bytes of the cover image.
    ///
    /// # Errors
    ///
    /// [`Error::RequiredElementNotFound`] if the manifest names no cover or
    /// the named entry is absent from the archive.
    pub fn cover_image(&self) -> Result<Vec<u8>> {
        let cover = self
            .cover_path()?
            .ok_or(Error::RequiredElementNotFound("cover image"))?;
        tracing::debug!(cover = %cover, "found cover image");
        self.archive
            .read_file(&cover)?
            .ok_or(Error::RequiredElementNotFound("cover image"))
    }

    /// Write the cover image to `output`.
    ///
    /// # Arguments
    ///
    /// * `output` - Destination file, created or truncated
    ///
    /// # Errors
    ///
    /// Those of [`cover_image`](Self::cover_image), plus [`Error::Io`] if
    /// the file cannot be written.
    pub fn save_cover(&self, output: impl AsRef<Path>) -> Result<()> {
        let image = self.cover_image()?;
        std::fs::write(output.as_ref(), image)?;
        Ok(())
    }
}
