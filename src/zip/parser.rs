//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory Record (EOCDR) near the file's end
//! 2. Read the Central Directory to get metadata for all entries
//! 3. For extraction, read each entry's Local File Header and payload

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
const MAX_COMMENT_SIZE: u64 = 65535;

/// The EOCDR can only live in the last `22 + 65535` bytes.
const MAX_EOCDR_SEARCH: u64 = EndOfCentralDirectory::SIZE as u64 + MAX_COMMENT_SIZE;

/// Size of each backward read while hunting for the EOCDR.
const EOCDR_WINDOW: usize = 2048;

/// Consecutive windows overlap by this much so a signature straddling a
/// window boundary is still seen whole.
const WINDOW_OVERLAP: usize = EndOfCentralDirectory::SIGNATURE.len() - 1;

/// Low-level ZIP file parser.
///
/// Typically used through [`ZipArchive`](super::ZipArchive) rather than
/// directly.
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: R,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    /// Create a new parser over the given reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - Any byte source implementing [`ReadAt`]
    ///
    /// # Returns
    ///
    /// A new parser instance; the source size is captured once here.
    pub fn new(reader: R) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Check the first four bytes against the local file header signature.
    ///
    /// Any read failure counts as an invalid header.
    pub fn valid_header(&self) -> bool {
        let mut header = [0u8; 4];
        match self.reader.read_exact_at(0, &mut header) {
            Ok(()) => header == LFH_SIGNATURE,
            Err(_) => false,
        }
    }

    /// Find and parse the End of Central Directory Record.
    ///
    /// Windows of [`EOCDR_WINDOW`] bytes are read backward from the end of
    /// the file, each overlapping the previous one by three bytes, and each
    /// is scanned from its end toward its start. The first signature hit
    /// whose comment-length field accounts for exactly the bytes that follow
    /// the record wins, so signature bytes inside the comment itself are
    /// passed over. If no hit is consistent (the archive carries trailing
    /// bytes after its comment), the hit nearest the end is used.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCDR, offset of EOCDR in file).
    ///
    /// # Errors
    ///
    /// [`Error::MalformedArchive`] if no signature lies within the last
    /// `22 + 65535` bytes, or if the file is too short to hold one.
    pub fn locate_eocdr(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let record_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < record_size {
            return Err(Error::malformed_archive(
                "archive is smaller than an end of central directory record",
            ));
        }

        let floor = self.size.saturating_sub(MAX_EOCDR_SEARCH);
        let mut buf = vec![0u8; EOCDR_WINDOW];
        let mut window_end = self.size;
        let mut nearest = None;

        loop {
            let window_start = window_end.saturating_sub(EOCDR_WINDOW as u64).max(floor);
            let window = &mut buf[..(window_end - window_start) as usize];
            self.reader
                .read_exact_at(window_start, window)
                .map_err(|e| Error::from_structure_read(e, "archive tail"))?;

            for i in (0..window.len().saturating_sub(WINDOW_OVERLAP)).rev() {
                if &window[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                    continue;
                }
                let offset = window_start + i as u64;
                if offset + record_size > self.size {
                    continue;
                }

                let mut record = [0u8; EndOfCentralDirectory::SIZE];
                self.reader
                    .read_exact_at(offset, &mut record)
                    .map_err(|e| Error::from_structure_read(e, "end of central directory"))?;
                let eocd = EndOfCentralDirectory::from_bytes(&record)?;

                if offset + record_size + eocd.comment_len as u64 == self.size {
                    tracing::debug!(
                        offset,
                        entries = eocd.total_entries,
                        cd_offset = eocd.cd_offset,
                        "found end of central directory"
                    );
                    return Ok((eocd, offset));
                }
                if nearest.is_none() {
                    nearest = Some((eocd, offset));
                }
            }

            if window_start <= floor {
                break;
            }
            window_end = window_start + WINDOW_OVERLAP as u64;
        }

        match nearest {
            Some((eocd, offset)) => {
                tracing::warn!(
                    offset,
                    comment_len = eocd.comment_len,
                    after_record = self.size - offset - record_size,
                    "end of central directory comment length does not reach end of file"
                );
                Ok((eocd, offset))
            }
            None => Err(Error::malformed_archive(
                "end of central directory signature not found",
            )),
        }
    }

    /// Decode `eocd.total_entries` central-directory records.
    ///
    /// Records carry no length prefix of their own, so the cursor advances
    /// by `46 + name + extra + comment` after each one.
    ///
    /// # Arguments
    ///
    /// * `eocd` - The record returned by [`locate_eocdr`](Self::locate_eocdr)
    ///
    /// # Returns
    ///
    /// Entries in central-directory order, directories included.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedArchive`] if the directory starts past the end of
    /// the file, a record lacks its signature, or the directory is cut
    /// short before `total_entries` records were read.
    pub fn read_central_directory(&self, eocd: &EndOfCentralDirectory) -> Result<Vec<ZipEntry>> {
        let cd_offset = eocd.cd_offset as u64;
        if cd_offset > self.size {
            return Err(Error::malformed_archive(format!(
                "central directory offset {cd_offset} is past the end of the archive"
            )));
        }

        let mut entries = Vec::with_capacity(eocd.total_entries as usize);
        let mut offset = cd_offset;

        for _ in 0..eocd.total_entries {
            let (entry, record_len) = self.parse_cdfh(offset)?;
            entries.push(entry);
            offset += record_len;
        }

        tracing::debug!(count = entries.len(), "read central directory");
        Ok(entries)
    }

    /// Parse the Central Directory File Header at `offset`.
    ///
    /// Returns the entry and the full length of its record.
    fn parse_cdfh(&self, offset: u64) -> Result<(ZipEntry, u64)> {
        let mut header = [0u8; CDFH_MIN_SIZE];
        self.reader
            .read_exact_at(offset, &mut header)
            .map_err(|e| Error::from_structure_read(e, "central directory"))?;

        if &header[0..4] != CDFH_SIGNATURE {
            return Err(Error::malformed_archive(format!(
                "invalid central directory file header at offset {offset}"
            )));
        }

        let mut cursor = Cursor::new(&header[4..]);
        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;
        let file_comment_length = cursor.read_u16::<LittleEndian>()? as u64;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        self.reader
            .read_exact_at(offset + CDFH_MIN_SIZE as u64, &mut file_name_bytes)
            .map_err(|e| Error::from_structure_read(e, "central directory file name"))?;
        // Use lossy conversion to handle non-UTF8 filenames gracefully
        let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();

        let record_len =
            CDFH_MIN_SIZE as u64 + file_name_length + extra_field_length + file_comment_length;

        let entry = ZipEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
        };
        Ok((entry, record_len))
    }

    /// Get the payload offset for an entry.
    ///
    /// The Local File Header's own name and extra lengths are used, since
    /// they may differ from the central-directory copy.
    ///
    /// # Arguments
    ///
    /// * `entry` - An entry from [`read_central_directory`](Self::read_central_directory)
    ///
    /// # Returns
    ///
    /// The byte offset where the entry's payload begins.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedArchive`] if the local header is truncated or
    /// carries the wrong signature.
    pub fn data_offset(&self, entry: &ZipEntry) -> Result<u64> {
        let mut lfh_buf = [0u8; LFH_SIZE];
        self.reader
            .read_exact_at(entry.lfh_offset, &mut lfh_buf)
            .map_err(|e| Error::from_structure_read(e, "local file header"))?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(Error::malformed_archive(format!(
                "invalid local file header for {}",
                entry.file_name
            )));
        }

        let mut cursor = Cursor::new(&lfh_buf[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// The underlying data source
    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}
