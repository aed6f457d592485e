//! Types for reading ZIP archives mapped into memory.

use std::mem;

use crate::compression::CompressionMethod;
use crate::extra_fields::Zip64ExtendedInformation;
use crate::result::{invalid, ZipError, ZipResult};
use crate::spec::{
    self, Block, Zip32CDEBlock, Zip32CentralDirectoryEnd, Zip64CentralDirectoryEnd,
    ZipCentralEntryBlock, ZipLocalEntryBlock, ZIP64_BYTES_THR,
};
use crate::types::ZipEntry;

/// Configuration for opening an archive.
#[derive(Copy, Clone, Debug, Default)]
pub struct Config {
    /// Retry local-header resolution with the stored 32-bit offset widened
    /// by `0x1_0000_0000` when the header signature check fails, covering
    /// archives whose offset field wrapped without ZIP64 extended info.
    /// Off by default; only some historical writers need it.
    pub wide_offset_retry: bool,
}

/// ZIP archive reader over a borrowed byte slice.
///
/// The caller provides the mapped bytes (read from disk, memory-mapped, or
/// otherwise); the archive borrows them for its whole lifetime and never
/// writes to them. Construction parses all metadata eagerly; afterwards the
/// archive is immutable and can be shared across threads without locking.
///
/// Entries are addressed by index in name order, or looked up by exact name.
///
/// ```no_run
/// fn list_zip_contents(bytes: &[u8]) -> zipfs::ZipResult<()> {
///     let archive = zipfs::ZipArchive::new(bytes)?;
///
///     for i in 0..archive.len() {
///         let entry = archive.by_index(i)?;
///         println!(
///             "Entry: {} ({} bytes)",
///             String::from_utf8_lossy(entry.name()),
///             entry.size()
///         );
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct ZipArchive<'a> {
    data: &'a [u8],
    /// Start of the first local file header within the slice; everything
    /// before it is prefix (self-extractor stub, concatenated data).
    base_offset: usize,
    /// Absolute offset of the first central-directory record.
    cd_start: usize,
    /// Per-entry offsets relative to `cd_start`, sorted by entry name
    /// (bytewise, shorter name first on prefix ties).
    entry_offsets: Vec<usize>,
    /// The archive comment trailing the EOCD record.
    comment: &'a [u8],
    zip64: bool,
    config: Config,
}

/// A decoded central-directory record with ZIP64 overrides applied.
pub(crate) struct CentralEntry<'a> {
    pub(crate) block: ZipCentralEntryBlock,
    pub(crate) name: &'a [u8],
    pub(crate) uncompressed_size: u64,
    pub(crate) compressed_size: u64,
    pub(crate) header_start: u64,
}

impl<'a> ZipArchive<'a> {
    /// Read a ZIP archive from a byte slice with the default configuration.
    pub fn new(data: &'a [u8]) -> ZipResult<ZipArchive<'a>> {
        Self::with_config(Config::default(), data)
    }

    /// Read a ZIP archive from a byte slice.
    pub fn with_config(config: Config, data: &'a [u8]) -> ZipResult<ZipArchive<'a>> {
        let eocd = Zip32CentralDirectoryEnd::find_and_parse(data)?;
        let zip64 = Zip64CentralDirectoryEnd::find_and_parse(data, eocd.position);
        let is_zip64 = zip64.is_some();

        let comment_start = eocd.position + mem::size_of::<Zip32CDEBlock>();
        let comment = data
            .get(comment_start..comment_start + eocd.comment_length as usize)
            .unwrap_or(&[]);

        // The ZIP64 record is authoritative when present. Without one, the
        // 0xFFFF/0xFFFFFFFF sentinels are taken at face value; the
        // signature-checked walk below stops at the first record that
        // doesn't exist anyway.
        let (declared_entries, cd_offset, cd_size) = match zip64 {
            Some(zip64) => (
                zip64.number_of_files,
                zip64.central_directory_offset,
                zip64.central_directory_size,
            ),
            None => (
                u64::from(eocd.number_of_files),
                u64::from(eocd.central_directory_offset),
                u64::from(eocd.central_directory_size),
            ),
        };

        if declared_entries == 0 {
            return Ok(ZipArchive {
                data,
                base_offset: 0,
                cd_start: eocd.position,
                entry_offsets: Vec::new(),
                comment,
                zip64: is_zip64,
                config,
            });
        }

        let (base_offset, cd_start) = spec::find_base_and_central_dir(data, cd_offset)?;

        // Capacity estimate: the declared count, bounded by how many fixed
        // records could possibly fit in the declared directory size.
        let fits = cd_size / mem::size_of::<ZipCentralEntryBlock>() as u64;
        let mut entry_offsets =
            Vec::with_capacity(usize::try_from(declared_entries.min(fits)).unwrap_or(0));
        let mut pos = 0usize;
        for _ in 0..declared_entries {
            let Ok(block) = ZipCentralEntryBlock::interpret(data, cd_start + pos) else {
                break;
            };
            match (cd_start + pos).checked_add(block.record_length()) {
                Some(end) if end <= data.len() => {
                    entry_offsets.push(pos);
                    pos += block.record_length();
                }
                _ => break,
            }
        }

        entry_offsets.sort_unstable_by(|&a, &b| {
            raw_name(data, cd_start, a).cmp(&raw_name(data, cd_start, b))
        });

        Ok(ZipArchive {
            data,
            base_offset,
            cd_start,
            entry_offsets,
            comment,
            zip64: is_zip64,
            config,
        })
    }

    /// Whether `data` ends in something that looks like an EOCD record,
    /// without building the entry index.
    pub fn is_valid(data: &[u8]) -> bool {
        Zip32CentralDirectoryEnd::find_and_parse(data).is_ok()
    }

    /// Number of entries in the central directory.
    pub fn len(&self) -> usize {
        self.entry_offsets.len()
    }

    /// Whether this zip archive contains no files.
    pub fn is_empty(&self) -> bool {
        self.entry_offsets.is_empty()
    }

    /// Whether the archive carries ZIP64 end-of-central-directory records.
    pub fn is_zip64(&self) -> bool {
        self.zip64
    }

    /// Offset of the first local file header within the slice. Non-zero for
    /// archives prefixed with other data.
    pub fn base_offset(&self) -> u64 {
        self.base_offset as u64
    }

    /// The underlying byte slice.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// The archive comment; empty when none was written.
    pub fn comment(&self) -> &'a [u8] {
        self.comment
    }

    /// Entry names in index (name-sorted) order.
    pub fn file_names(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.entry_offsets
            .iter()
            .map(|&rel| raw_name(self.data, self.cd_start, rel))
    }

    /// The stored name of the entry at `index`.
    pub fn name_for_index(&self, index: usize) -> Option<&'a [u8]> {
        self.entry_offsets
            .get(index)
            .map(|&rel| raw_name(self.data, self.cd_start, rel))
    }

    /// Binary-search the name-sorted index for an exact (byte-wise,
    /// case-sensitive) match.
    pub fn index_for_name(&self, name: &[u8]) -> Option<usize> {
        self.entry_offsets
            .binary_search_by(|&rel| raw_name(self.data, self.cd_start, rel).cmp(&name))
            .ok()
    }

    /// Index of the first entry whose name is `>= key` in the index order.
    pub(crate) fn lower_bound(&self, key: &[u8]) -> usize {
        self.entry_offsets
            .partition_point(|&rel| raw_name(self.data, self.cd_start, rel) < key)
    }

    /// Materialize the entry at `index`: decode its central-directory record
    /// and resolve the local header down to the compressed bytes in place.
    /// The contents still need [`ZipEntry::inflate`].
    pub fn by_index(&self, index: usize) -> ZipResult<ZipEntry<'a>> {
        let entry = self.central_entry(index)?;
        let method = CompressionMethod::parse_from_u16(entry.block.compression_method);
        // Directory entries have nothing to read; skip local-header
        // resolution so odd writers can't make directories unreadable.
        let raw: &'a [u8] = if spec::is_dir(entry.name) {
            &[]
        } else {
            self.find_data(&entry)?
        };

        Ok(ZipEntry {
            name: entry.name,
            flags: entry.block.flags,
            dos_time: entry.block.dos_time,
            crc32: entry.block.crc32,
            compressed_size: entry.compressed_size,
            uncompressed_size: entry.uncompressed_size,
            method,
            raw,
            contents: None,
        })
    }

    /// Materialize an entry by its exact stored name.
    pub fn by_name(&self, name: &[u8]) -> ZipResult<ZipEntry<'a>> {
        match self.index_for_name(name) {
            Some(index) => self.by_index(index),
            None => Err(ZipError::FileNotFound(
                String::from_utf8_lossy(name).into_owned().into_boxed_str(),
            )),
        }
    }

    pub(crate) fn central_entry(&self, index: usize) -> ZipResult<CentralEntry<'a>> {
        let Some(&rel) = self.entry_offsets.get(index) else {
            return Err(ZipError::FileNotFound(
                format!("entry #{index}").into_boxed_str(),
            ));
        };
        let offset = self.cd_start + rel;
        let block = ZipCentralEntryBlock::interpret(self.data, offset)?;

        let name_start = offset + mem::size_of::<ZipCentralEntryBlock>();
        let name_end = name_start + block.file_name_length as usize;
        let extra_end = name_end + block.extra_field_length as usize;
        let (Some(name), Some(extra_field)) = (
            self.data.get(name_start..name_end),
            self.data.get(name_end..extra_end),
        ) else {
            invalid!("central directory record is truncated");
        };

        let mut uncompressed_size = u64::from(block.uncompressed_size);
        let mut compressed_size = u64::from(block.compressed_size);
        let mut header_start = u64::from(block.header_start);

        let zip64 = Zip64ExtendedInformation::parse(
            extra_field,
            uncompressed_size == ZIP64_BYTES_THR,
            compressed_size == ZIP64_BYTES_THR,
            header_start == ZIP64_BYTES_THR,
        );
        if let Some(zip64) = zip64 {
            uncompressed_size = zip64.uncompressed_size.unwrap_or(uncompressed_size);
            compressed_size = zip64.compressed_size.unwrap_or(compressed_size);
            header_start = zip64.header_start.unwrap_or(header_start);
        }

        Ok(CentralEntry {
            block,
            name,
            uncompressed_size,
            compressed_size,
            header_start,
        })
    }

    /// Resolve an entry's local header and return the compressed payload,
    /// `base_offset + header_start + 30 + name + extra` onward.
    fn find_data(&self, entry: &CentralEntry<'a>) -> ZipResult<&'a [u8]> {
        let mut offset = self
            .base_offset
            .checked_add(usize::try_from(entry.header_start).map_err(|_| ZipError::Truncated)?)
            .ok_or(ZipError::Truncated)?;

        if !spec::local_signature_at(self.data, offset) {
            // A 32-bit offset that wrapped past 4 GiB without ZIP64 extended
            // info; quirks mode re-tries one bit higher.
            let retried = self
                .config
                .wide_offset_retry
                .then_some(entry.header_start | 0x1_0000_0000)
                .and_then(|wide| usize::try_from(wide).ok())
                .and_then(|wide| self.base_offset.checked_add(wide))
                .filter(|&wide| spec::local_signature_at(self.data, wide));
            offset = match retried {
                Some(wide) => wide,
                None => invalid!("local file header signature mismatch"),
            };
        }

        let block = ZipLocalEntryBlock::interpret(self.data, offset)?;
        let data_start = offset
            + mem::size_of::<ZipLocalEntryBlock>()
            + block.file_name_length as usize
            + block.extra_field_length as usize;
        let compressed = usize::try_from(entry.compressed_size).map_err(|_| ZipError::Truncated)?;

        match data_start.checked_add(compressed) {
            Some(end) if end <= self.data.len() => Ok(&self.data[data_start..end]),
            _ => Err(ZipError::Truncated),
        }
    }
}

fn raw_name<'a>(data: &'a [u8], cd_start: usize, rel: usize) -> &'a [u8] {
    let offset = cd_start + rel;
    // The construction-time walk validated every record it indexed, so the
    // lookups below cannot fail for an offset taken from `entry_offsets`.
    match ZipCentralEntryBlock::interpret(data, offset) {
        Ok(block) => {
            let start = offset + mem::size_of::<ZipCentralEntryBlock>();
            data.get(start..start + block.file_name_length as usize)
                .unwrap_or(&[])
        }
        Err(_) => &[],
    }
}

