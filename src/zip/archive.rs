use flate2::{Crc, Decompress, FlushDecompress, Status};

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipEntry, find_entry};

/// No entry may decompress to more than this unless configured otherwise.
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// An opened ZIP archive: the decoded central directory plus the source
/// it was read from.
pub struct ZipArchive<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ZipEntry>,
    max_entry_size: u64,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Validate the header, locate the EOCDR and decode the central directory.
    ///
    /// # Arguments
    ///
    /// * `reader` - The byte source holding the whole archive
    ///
    /// # Returns
    ///
    /// An archive whose entries are ready for lookup and extraction.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedArchive`] for a bad header, a missing EOCDR or an
    /// inconsistent central directory; [`Error::Io`] if the source fails.
    pub fn open(reader: R) -> Result<Self> {
        let parser = ZipParser::new(reader);

        if !parser.valid_header() {
            return Err(Error::malformed_archive("invalid zip header"));
        }

        let (eocd, _) = parser.locate_eocdr()?;
        let entries = parser.read_central_directory(&eocd)?;

        Ok(Self {
            parser,
            entries,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        })
    }

    /// Cap the uncompressed size of any single entry.
    pub fn with_max_entry_size(mut self, max_entry_size: u64) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    /// Entries in central-directory order
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// First non-directory entry named exactly `file_name`
    pub fn find_entry(&self, file_name: &str) -> Option<&ZipEntry> {
        find_entry(&self.entries, file_name)
    }

    /// Extract an entry's payload to memory.
    ///
    /// Stored entries are returned verbatim; raw DEFLATE entries are
    /// inflated to exactly `uncompressed_size` bytes. The result is checked
    /// against the central-directory CRC-32.
    ///
    /// # Arguments
    ///
    /// * `entry` - One of this archive's [`entries`](Self::entries)
    ///
    /// # Returns
    ///
    /// The uncompressed payload.
    ///
    /// # Errors
    ///
    /// * [`Error::UnsupportedCompression`] for methods other than 0 and 8
    /// * [`Error::MalformedArchive`] if the entry exceeds the size limit or
    ///   its payload runs past the end of the archive
    /// * [`Error::DecompressionFailed`] if inflation stops short or the
    ///   CRC-32 does not match
    pub fn decompress_entry(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        if let CompressionMethod::Unknown(method) = entry.compression_method {
            return Err(Error::UnsupportedCompression(method));
        }

        if entry.uncompressed_size > self.max_entry_size {
            return Err(Error::malformed_archive(format!(
                "{} declares {} bytes, more than the {} byte limit",
                entry.file_name, entry.uncompressed_size, self.max_entry_size
            )));
        }

        let data_offset = self.parser.data_offset(entry)?;
        let payload_fits = data_offset
            .checked_add(entry.compressed_size)
            .is_some_and(|end| end <= self.parser.size());
        if !payload_fits {
            return Err(Error::malformed_archive(format!(
                "payload of {} runs past the end of the archive",
                entry.file_name
            )));
        }

        let compressed = self.read_payload(data_offset, entry.compressed_size)?;

        let output = match entry.compression_method {
            CompressionMethod::Stored => {
                if entry.compressed_size != entry.uncompressed_size {
                    return Err(Error::malformed_archive(format!(
                        "stored entry {} has mismatched sizes",
                        entry.file_name
                    )));
                }
                compressed
            }
            CompressionMethod::Deflate => inflate_raw(&compressed, entry.uncompressed_size)?,
            CompressionMethod::Unknown(method) => {
                return Err(Error::UnsupportedCompression(method));
            }
        };

        let mut crc = Crc::new();
        crc.update(&output);
        if crc.sum() != entry.crc32 {
            return Err(Error::DecompressionFailed(format!(
                "crc mismatch for {}",
                entry.file_name
            )));
        }

        tracing::debug!(
            name = %entry.file_name,
            size = output.len(),
            "decompressed entry"
        );
        Ok(output)
    }

    /// Look an entry up by name and decompress it.
    ///
    /// Returns `Ok(None)` when no file entry has that exact name; errors
    /// are those of [`decompress_entry`](Self::decompress_entry).
    pub fn read_file(&self, file_name: &str) -> Result<Option<Vec<u8>>> {
        match self.find_entry(file_name) {
            Some(entry) => self.decompress_entry(entry).map(Some),
            None => Ok(None),
        }
    }

    fn read_payload(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let mut buf = reserve(len)?;
        buf.resize(len as usize, 0);
        self.parser
            .reader()
            .read_exact_at(offset, &mut buf)
            .map_err(|e| Error::from_structure_read(e, "entry payload"))?;
        Ok(buf)
    }
}

fn reserve(len: u64) -> Result<Vec<u8>> {
    let len = usize::try_from(len).map_err(|_| Error::OutOfMemory)?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    Ok(buf)
}

/// Inflate a raw DEFLATE stream (no zlib/gzip framing) into exactly
/// `expected` bytes.
fn inflate_raw(input: &[u8], expected: u64) -> Result<Vec<u8>> {
    let mut output = reserve(expected)?;
    let mut inflater = Decompress::new(false);

    let status = inflater
        .decompress_vec(input, &mut output, FlushDecompress::Finish)
        .map_err(|e| Error::DecompressionFailed(e.to_string()))?;

    if status != Status::StreamEnd {
        return Err(Error::DecompressionFailed(format!(
            "stream incomplete after {} of {} bytes",
            inflater.total_out(),
            expected
        )));
    }
    if output.len() as u64 != expected {
        return Err(Error::DecompressionFailed(format!(
            "inflated {} bytes, expected {}",
            output.len(),
            expected
        )));
    }

    Ok(output)
}
