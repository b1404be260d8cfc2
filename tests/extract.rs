mod common;

use common::{ZipBuilder, epub, opf};
use epubinfo::epub::{CONTAINER_PATH, extract_metadata};
use epubinfo::{EpubDocument, Error, ExtractConfig, ZipArchive};

const MOBY_DICK: &str = r#"<dc:title>Moby Dick</dc:title>
    <dc:creator opf:role="aut">Herman Melville</dc:creator>
    <dc:creator>Ishmael</dc:creator>
    <dc:author>H. Melville</dc:author>
    <dc:language>en</dc:language>
    <dc:subject>Whaling</dc:subject>
    <dc:publisher>Harper &amp; Brothers</dc:publisher>
    <dc:description>A sea story.   </dc:description>
    <dc:identifier id="uid">urn:isbn:9780000000001</dc:identifier>
    <dc:identifier>urn:uuid:1234</dc:identifier>
    <meta name="cover" content="cover-img"/>"#;

const COVER_ITEM: &str =
    r#"<item id="cover-img" href="images/cover.png" media-type="image/png"/>"#;

fn document(bytes: Vec<u8>) -> EpubDocument<Vec<u8>> {
    EpubDocument::from_reader(bytes, &ExtractConfig::default()).unwrap()
}

#[test]
fn extracts_metadata_end_to_end() {
    let doc = document(epub(&opf(MOBY_DICK, "")).build());

    assert_eq!(doc.opf_path(), "OEBPS/content.opf");
    assert_eq!(doc.title(), "Moby Dick");
    assert_eq!(doc.language(), "en");
    assert_eq!(doc.subtitle(), "Whaling");
    assert_eq!(doc.description(), "A sea story.");

    assert_eq!(doc.creator_count(), 2);
    assert_eq!(doc.creator(0), Some("Herman Melville"));
    assert_eq!(doc.creator(1), Some("Ishmael"));
    assert_eq!(doc.creator(2), None);

    assert_eq!(doc.author_count(), 1);
    assert_eq!(doc.author(0), Some("H. Melville"));

    assert_eq!(doc.identifier_count(), 2);
    assert_eq!(doc.identifier(0), Some("urn:isbn:9780000000001"));
    assert_eq!(doc.identifier(1), Some("urn:uuid:1234"));
}

#[test]
fn minimal_epub_yields_title_and_ordered_creators() {
    let metadata = "<dc:title>T</dc:title><dc:creator>A</dc:creator><dc:creator>B</dc:creator>";
    let doc = document(epub(&opf(metadata, "")).build());

    assert_eq!(doc.title(), "T");
    assert_eq!(doc.metadata().creators, ["A", "B"]);
    for field in [doc.subtitle(), doc.language(), doc.description(), doc.publisher()] {
        assert_eq!(field, "");
    }
    assert_eq!(doc.author_count(), 0);
    assert_eq!(doc.identifier_count(), 0);
}

#[test]
fn entities_are_not_decoded() {
    let doc = document(epub(&opf(MOBY_DICK, "")).build());
    assert_eq!(doc.publisher(), "Harper &amp; Brothers");
}

#[test]
fn absent_fields_read_as_empty() {
    let doc = document(epub(&opf("<dc:title>Only a title</dc:title>", "")).build());
    assert_eq!(doc.title(), "Only a title");
    assert_eq!(doc.publisher(), "");
    assert_eq!(doc.language(), "");
    assert_eq!(doc.author_count(), 0);
    assert_eq!(doc.author(0), None);
    assert_eq!(doc.metadata().publisher, None);
}

#[test]
fn extract_metadata_runs_against_an_open_archive() {
    let archive = ZipArchive::open(epub(&opf(MOBY_DICK, "")).build()).unwrap();
    let extraction = extract_metadata(&archive, &ExtractConfig::default()).unwrap();
    assert_eq!(extraction.opf_path, "OEBPS/content.opf");
    assert_eq!(extraction.metadata.title.as_deref(), Some("Moby Dick"));
}

#[test]
fn tiny_arena_is_enough_for_short_tokens() {
    let config = ExtractConfig::default().with_arena_capacity(256);
    let doc = EpubDocument::from_reader(epub(&opf(MOBY_DICK, "")).build(), &config).unwrap();
    assert_eq!(doc.title(), "Moby Dick");
}

#[test]
fn token_larger_than_arena_fails() {
    let config = ExtractConfig::default().with_arena_capacity(16);
    let result = EpubDocument::from_reader(epub(&opf(MOBY_DICK, "")).build(), &config);
    assert!(matches!(result, Err(Error::Arena(_))));
}

#[test]
fn missing_container_is_reported() {
    let bytes = ZipBuilder::new()
        .stored("mimetype", b"application/epub+zip")
        .deflated("OEBPS/content.opf", opf(MOBY_DICK, "").as_bytes())
        .build();
    let result = EpubDocument::from_reader(bytes, &ExtractConfig::default());
    assert!(matches!(
        result,
        Err(Error::RequiredElementNotFound(path)) if path == CONTAINER_PATH
    ));
}

#[test]
fn missing_opf_is_reported() {
    let bytes = ZipBuilder::new()
        .stored("mimetype", b"application/epub+zip")
        .deflated(CONTAINER_PATH, common::CONTAINER.as_bytes())
        .build();
    let result = EpubDocument::from_reader(bytes, &ExtractConfig::default());
    assert!(matches!(result, Err(Error::RequiredElementNotFound(_))));
}

#[test]
fn container_without_rootfile_is_reported() {
    let bytes = ZipBuilder::new()
        .deflated(CONTAINER_PATH, b"<container><rootfiles/></container>")
        .build();
    let result = EpubDocument::from_reader(bytes, &ExtractConfig::default());
    assert!(matches!(result, Err(Error::RequiredElementNotFound(_))));
}

#[test]
fn opf_without_metadata_is_reported() {
    let bytes = ZipBuilder::new()
        .deflated(CONTAINER_PATH, common::CONTAINER.as_bytes())
        .deflated(
            "OEBPS/content.opf",
            b"<package><manifest><item id=\"a\" href=\"a.xhtml\"/></manifest></package>",
        )
        .build();
    let result = EpubDocument::from_reader(bytes, &ExtractConfig::default());
    assert!(matches!(result, Err(Error::RequiredElementNotFound(_))));
}

#[test]
fn trailing_bytes_after_archive_are_tolerated() {
    let mut bytes = epub(&opf("<dc:title>T</dc:title>", "")).build();
    bytes.push(0);
    let doc = document(bytes);
    assert_eq!(doc.title(), "T");
}

#[test]
fn container_comment_mentioning_full_path_is_skipped() {
    let container = r#"<?xml version="1.0"?>
<!-- set the full-path attribute below -->
<container><rootfiles><rootfile full-path="OEBPS/content.opf"/></rootfiles></container>"#;
    let bytes = ZipBuilder::new()
        .deflated(CONTAINER_PATH, container.as_bytes())
        .deflated("OEBPS/content.opf", opf("<dc:title>T</dc:title>", "").as_bytes())
        .build();
    assert_eq!(document(bytes).title(), "T");
}

#[test]
fn not_a_zip_is_malformed() {
    let result =
        EpubDocument::from_reader(b"%PDF-1.7 not an epub".to_vec(), &ExtractConfig::default());
    assert!(matches!(result, Err(Error::MalformedArchive(_))));
}

#[test]
fn opens_and_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("moby.epub");
    std::fs::write(&path, epub(&opf(MOBY_DICK, "")).build()).unwrap();

    let doc = EpubDocument::open(&path).unwrap();
    assert_eq!(doc.title(), "Moby Dick");
    assert!(doc.entries().iter().any(|e| e.file_name == "OEBPS/ch1.xhtml"));

    let loaded = EpubDocument::load(&path).unwrap();
    assert_eq!(loaded.metadata(), doc.metadata());
}

#[test]
fn load_returns_none_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    assert!(EpubDocument::load(dir.path().join("missing.epub")).is_none());

    let garbage = dir.path().join("garbage.epub");
    std::fs::write(&garbage, b"garbage").unwrap();
    assert!(EpubDocument::load(&garbage).is_none());

    assert!(matches!(
        EpubDocument::open(dir.path().join("missing.epub")),
        Err(Error::Io(_))
    ));
}

#[test]
fn saves_cover_image() {
    let png = b"\x89PNG\r\n\x1a\nnot really a png";
    let bytes = epub(&opf(MOBY_DICK, COVER_ITEM))
        .stored("OEBPS/images/cover.png", png)
        .build();
    let doc = document(bytes);

    assert_eq!(
        doc.cover_path().unwrap().as_deref(),
        Some("OEBPS/images/cover.png")
    );

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cover.png");
    doc.save_cover(&out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), png);
}

#[test]
fn missing_cover_is_reported() {
    let doc = document(epub(&opf("<dc:title>No cover</dc:title>", "")).build());
    assert_eq!(doc.cover_path().unwrap(), None);
    assert!(matches!(
        doc.cover_image(),
        Err(Error::RequiredElementNotFound(_))
    ));
}
