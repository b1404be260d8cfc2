//! Metadata extraction state machine.
//!
//! `container.xml` names the OPF package document; the OPF's `<metadata>`
//! element holds the `dc:*` fields. The extractor walks both with the
//! tokenizer, resetting its arena after every token. Anything that has to
//! outlive a token (the OPF path, each field value) is copied into an owned
//! `String` before the reset.

use crate::arena::Arena;
use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use crate::io::ReadAt;
use crate::xml::{TagType, Token, XmlTokenizer, tag_attribute, tag_name};
use crate::zip::ZipArchive;

/// Location of the EPUB container manifest
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Bibliographic metadata collected from the OPF.
///
/// Singular fields keep the last occurrence; list fields keep every
/// occurrence in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    /// Sourced from `dc:subject`
    pub subtitle: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    /// `dc:author`
    pub authors: Vec<String>,
    /// `dc:creator`
    pub creators: Vec<String>,
    /// `dc:identifier`
    pub identifiers: Vec<String>,
}

impl Metadata {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn subtitle(&self) -> &str {
        self.subtitle.as_deref().unwrap_or_default()
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn publisher(&self) -> &str {
        self.publisher.as_deref().unwrap_or_default()
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    pub fn author(&self, index: usize) -> Option<&str> {
        self.authors.get(index).map(String::as_str)
    }

    pub fn creator_count(&self) -> usize {
        self.creators.len()
    }

    pub fn creator(&self, index: usize) -> Option<&str> {
        self.creators.get(index).map(String::as_str)
    }

    pub fn identifier_count(&self) -> usize {
        self.identifiers.len()
    }

    pub fn identifier(&self, index: usize) -> Option<&str> {
        self.identifiers.get(index).map(String::as_str)
    }

    fn apply(&mut self, field: DcField, value: String) {
        match field {
            DcField::Title => self.title = Some(value),
            DcField::Subject => self.subtitle = Some(value),
            DcField::Language => self.language = Some(value),
            DcField::Description => self.description = Some(value),
            DcField::Publisher => self.publisher = Some(value),
            DcField::Author => self.authors.push(value),
            DcField::Creator => self.creators.push(value),
            DcField::Identifier => self.identifiers.push(value),
        }
    }
}

/// `dc:*` elements that land in the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DcField {
    Title,
    Subject,
    Language,
    Description,
    Publisher,
    Author,
    Creator,
    Identifier,
}

impl DcField {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "title" => Some(DcField::Title),
            "subject" => Some(DcField::Subject),
            "language" => Some(DcField::Language),
            "description" => Some(DcField::Description),
            "publisher" => Some(DcField::Publisher),
            "author" => Some(DcField::Author),
            "creator" => Some(DcField::Creator),
            "identifier" => Some(DcField::Identifier),
            _ => None,
        }
    }
}

/// Where the extractor is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    LocatingRootfile,
    LocatingMetadataStart,
    CollectingMetadataFields,
    Done,
}

/// Result of a full extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Archive path of the OPF package document
    pub opf_path: String,
    pub metadata: Metadata,
}

/// Drives the tokenizer through `container.xml` and the OPF.
#[derive(Debug)]
pub struct MetadataExtractor {
    arena: Arena,
    state: ExtractionState,
}

impl MetadataExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            arena: Arena::init(config.arena_capacity)?,
            state: ExtractionState::LocatingRootfile,
        })
    }

    pub fn state(&self) -> ExtractionState {
        self.state
    }

    /// Run the whole pipeline against an opened archive.
    pub fn extract<R: ReadAt>(&mut self, archive: &ZipArchive<R>) -> Result<Extraction> {
        let container = archive
            .read_file(CONTAINER_PATH)?
            .ok_or(Error::RequiredElementNotFound(CONTAINER_PATH))?;
        let opf_path = self.locate_rootfile(&String::from_utf8_lossy(&container))?;

        let opf = archive
            .read_file(&opf_path)?
            .ok_or(Error::RequiredElementNotFound("OPF package document"))?;
        let metadata = self.extract_from_opf(&String::from_utf8_lossy(&opf))?;

        Ok(Extraction { opf_path, metadata })
    }

    /// Find the first tag in `container.xml` carrying a `full-path`
    /// attribute and return its value.
    ///
    /// A tag that mentions `full-path` without a well-formed value is
    /// skipped.
    ///
    /// # Errors
    ///
    /// [`Error::RequiredElementNotFound`] if the document ends, or a tag is
    /// left unterminated, before any tag yields a value.
    pub fn locate_rootfile(&mut self, container: &str) -> Result<String> {
        self.transition(ExtractionState::LocatingRootfile);
        self.arena.reset();
        let mut tokenizer = XmlTokenizer::new(container);

        loop {
            let found = match tokenizer.next(&self.arena)? {
                Token::Tag(_, text) => match tag_attribute(&self.arena, text, "full-path") {
                    Ok(value) => value.map(str::to_owned),
                    Err(Error::MalformedXml(reason)) => {
                        tracing::warn!(%reason, "skipping tag without a usable full-path");
                        None
                    }
                    Err(e) => return Err(e),
                },
                Token::Text(_) => None,
                Token::Eof | Token::Malformed => {
                    return Err(Error::RequiredElementNotFound("rootfile full-path"));
                }
            };
            self.arena.reset();

            if let Some(path) = found {
                tracing::debug!(opf = %path, "found rootfile");
                return Ok(path);
            }
        }
    }

    /// Locate `<metadata>` in the OPF and collect its `dc:*` fields.
    pub fn extract_from_opf(&mut self, opf: &str) -> Result<Metadata> {
        let mut tokenizer = XmlTokenizer::new(opf);
        self.locate_metadata_start(&mut tokenizer)?;
        let metadata = self.collect_fields(&mut tokenizer)?;
        self.transition(ExtractionState::Done);
        Ok(metadata)
    }

    /// Advance `tokenizer` just past the first element tag named `metadata`.
    pub fn locate_metadata_start(&mut self, tokenizer: &mut XmlTokenizer<'_>) -> Result<()> {
        self.transition(ExtractionState::LocatingMetadataStart);
        self.arena.reset();

        loop {
            let found = match tokenizer.next(&self.arena)? {
                Token::Tag(kind, text) if kind.is_element() => {
                    tag_name(&self.arena, text)? == "metadata"
                }
                Token::Tag(..) | Token::Text(_) => false,
                Token::Eof => return Err(Error::RequiredElementNotFound("<metadata> element")),
                Token::Malformed => return Err(unterminated_tag(tokenizer)),
            };
            self.arena.reset();

            if found {
                return Ok(());
            }
        }
    }

    /// Collect `dc:*` fields until `</metadata>`.
    ///
    /// An open `dc:*` tag consumes exactly one following token; only a text
    /// token yields a value.
    pub fn collect_fields(&mut self, tokenizer: &mut XmlTokenizer<'_>) -> Result<Metadata> {
        self.transition(ExtractionState::CollectingMetadataFields);
        self.arena.reset();
        let mut metadata = Metadata::default();

        loop {
            let done = match tokenizer.next(&self.arena)? {
                Token::Tag(TagType::Close, text) => tag_name(&self.arena, text)? == "metadata",
                Token::Tag(TagType::Open, text) => {
                    let name = tag_name(&self.arena, text)?;
                    if let Some(suffix) = name.strip_prefix("dc:") {
                        match tokenizer.next(&self.arena)? {
                            Token::Text(value) => {
                                if let Some(field) = DcField::from_suffix(suffix) {
                                    metadata.apply(field, value.trim_end().to_owned());
                                }
                            }
                            Token::Tag(..) => {
                                tracing::warn!(element = name, "element has no text body");
                            }
                            Token::Eof => return Err(unclosed_metadata()),
                            Token::Malformed => return Err(unterminated_tag(tokenizer)),
                        }
                    }
                    false
                }
                Token::Tag(..) | Token::Text(_) => false,
                Token::Eof => return Err(unclosed_metadata()),
                Token::Malformed => return Err(unterminated_tag(tokenizer)),
            };
            self.arena.reset();

            if done {
                return Ok(metadata);
            }
        }
    }

    fn transition(&mut self, next: ExtractionState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "extraction state");
        }
        self.state = next;
    }
}

fn unterminated_tag(tokenizer: &XmlTokenizer<'_>) -> Error {
    Error::MalformedXml(format!(
        "unterminated tag at byte {}",
        tokenizer.position()
    ))
}

fn unclosed_metadata() -> Error {
    Error::MalformedXml("<metadata> element is never closed".to_string())
}

/// Run the pipeline against `archive` with a fresh extractor.
pub fn extract_metadata<R: ReadAt>(
    archive: &ZipArchive<R>,
    config: &ExtractConfig,
) -> Result<Extraction> {
    MetadataExtractor::new(config)?.extract(archive)
}
