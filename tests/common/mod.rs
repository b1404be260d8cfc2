//! Synthetic ZIP and EPUB archives built in memory.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Stored,
    Deflated,
}

struct Entry {
    name: String,
    data: Vec<u8>,
    method: Method,
    local_extra: Vec<u8>,
}

/// Writes local headers, payloads, the central directory and the EOCDR.
#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<Entry>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.entry(name, data, Method::Stored, &[])
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.entry(name, data, Method::Deflated, &[])
    }

    pub fn directory(self, name: &str) -> Self {
        self.entry(name, &[], Method::Stored, &[])
    }

    /// An entry whose local header carries an extra field the central
    /// directory copy does not.
    pub fn stored_with_local_extra(self, name: &str, data: &[u8], extra: &[u8]) -> Self {
        self.entry(name, data, Method::Stored, extra)
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    fn entry(mut self, name: &str, data: &[u8], method: Method, local_extra: &[u8]) -> Self {
        self.entries.push(Entry {
            name: name.to_string(),
            data: data.to_vec(),
            method,
            local_extra: local_extra.to_vec(),
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let mut crc = flate2::Crc::new();
            crc.update(&entry.data);
            let crc = crc.sum();

            let (method, payload) = match entry.method {
                Method::Stored => (0u16, entry.data.clone()),
                Method::Deflated => (8u16, deflate(&entry.data)),
            };
            let lfh_offset = out.len() as u32;

            out.extend_from_slice(b"PK\x03\x04");
            put_u16(&mut out, 20);
            put_u16(&mut out, 0);
            put_u16(&mut out, method);
            put_u16(&mut out, 0);
            put_u16(&mut out, 0);
            put_u32(&mut out, crc);
            put_u32(&mut out, payload.len() as u32);
            put_u32(&mut out, entry.data.len() as u32);
            put_u16(&mut out, entry.name.len() as u16);
            put_u16(&mut out, entry.local_extra.len() as u16);
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&entry.local_extra);
            out.extend_from_slice(&payload);

            central.extend_from_slice(b"PK\x01\x02");
            put_u16(&mut central, 20);
            put_u16(&mut central, 20);
            put_u16(&mut central, 0);
            put_u16(&mut central, method);
            put_u16(&mut central, 0);
            put_u16(&mut central, 0);
            put_u32(&mut central, crc);
            put_u32(&mut central, payload.len() as u32);
            put_u32(&mut central, entry.data.len() as u32);
            put_u16(&mut central, entry.name.len() as u16);
            put_u16(&mut central, 0);
            put_u16(&mut central, 0);
            put_u16(&mut central, 0);
            put_u16(&mut central, 0);
            put_u32(&mut central, 0);
            put_u32(&mut central, lfh_offset);
            central.extend_from_slice(entry.name.as_bytes());
        }

        let cd_offset = out.len() as u32;
        out.extend_from_slice(&central);

        out.extend_from_slice(b"PK\x05\x06");
        put_u16(&mut out, 0);
        put_u16(&mut out, 0);
        put_u16(&mut out, self.entries.len() as u16);
        put_u16(&mut out, self.entries.len() as u16);
        put_u32(&mut out, central.len() as u32);
        put_u32(&mut out, cd_offset);
        put_u16(&mut out, self.comment.len() as u16);
        out.extend_from_slice(&self.comment);
        out
    }
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// An OPF whose `<metadata>` holds `metadata` verbatim and whose manifest
/// holds `manifest` verbatim.
pub fn opf(metadata: &str, manifest: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="uid" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    {metadata}
  </metadata>
  <manifest>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
    {manifest}
  </manifest>
  <spine><itemref idref="ch1"/></spine>
</package>
"#
    )
}

/// A minimal EPUB: mimetype, container.xml and `OEBPS/content.opf`.
pub fn epub(opf: &str) -> ZipBuilder {
    ZipBuilder::new()
        .stored("mimetype", b"application/epub+zip")
        .directory("META-INF/")
        .deflated("META-INF/container.xml", CONTAINER.as_bytes())
        .directory("OEBPS/")
        .deflated("OEBPS/content.opf", opf.as_bytes())
        .deflated("OEBPS/ch1.xhtml", b"<html><body><p>Call me Ishmael.</p></body></html>")
}
