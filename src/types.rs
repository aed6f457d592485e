//! Types that describe what is contained in a ZIP archive.

use std::borrow::Cow;
use std::fmt;

use crate::compression::{self, CompressionMethod};
use crate::result::ZipResult;
use crate::spec;

/// Representation of a moment in time.
///
/// Zip files use an old format from DOS to store timestamps, with its own
/// set of peculiarities. For example, it has a resolution of 2 seconds!
///
/// The raw packed 32-bit value is kept as the canonical representation;
/// the accessors unpack individual fields on demand. There is no timezone
/// associated with a [`DateTime`], so it should ideally only be used for
/// user-facing descriptions.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DateTime(u32);

impl DateTime {
    /// Wraps a raw DOS date/time value as read from an archive header.
    pub const fn from_raw(raw: u32) -> DateTime {
        DateTime(raw)
    }

    /// The packed 32-bit DOS value (date in the high half, time in the low).
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the year. There is no epoch, i.e. 2018 will be returned as 2018.
    pub const fn year(self) -> u16 {
        (((self.0 >> 25) & 0x7F) + 1980) as u16
    }

    /// Get the month, where 1 = january and 12 = december
    ///
    /// # Warning
    ///
    /// When read from a zip file, this may not be a reasonable value
    pub const fn month(self) -> u8 {
        ((self.0 >> 21) & 0x0F) as u8
    }

    /// Get the day
    ///
    /// # Warning
    ///
    /// When read from a zip file, this may not be a reasonable value
    pub const fn day(self) -> u8 {
        ((self.0 >> 16) & 0x1F) as u8
    }

    /// Get the hour
    ///
    /// # Warning
    ///
    /// When read from a zip file, this may not be a reasonable value
    pub const fn hour(self) -> u8 {
        ((self.0 >> 11) & 0x1F) as u8
    }

    /// Get the minute
    ///
    /// # Warning
    ///
    /// When read from a zip file, this may not be a reasonable value
    pub const fn minute(self) -> u8 {
        ((self.0 >> 5) & 0x3F) as u8
    }

    /// Get the second
    ///
    /// # Warning
    ///
    /// When read from a zip file, this may not be a reasonable value
    pub const fn second(self) -> u8 {
        ((self.0 & 0x1F) * 2) as u8
    }
}

impl fmt::Display for DateTime {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

/// What a resolved path refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EntryKind {
    /// A regular file backed by an archive member.
    File,
    /// A directory, explicit or synthesized.
    Dir,
}

impl EntryKind {
    /// Whether this is [`EntryKind::Dir`].
    pub const fn is_dir(self) -> bool {
        matches!(self, EntryKind::Dir)
    }

    /// Whether this is [`EntryKind::File`].
    pub const fn is_file(self) -> bool {
        matches!(self, EntryKind::File)
    }
}

/// Metadata for one entry as surfaced to the filesystem bridge.
///
/// `name` borrows from the archive slice: the full stored path for
/// [`stat`](crate::fs::ZipFs::stat), the name relative to the enumerated
/// directory for [`each`](crate::fs::ZipFs::each). Directory names keep
/// their single trailing `/`.
#[derive(Clone, Copy, Debug)]
pub struct EntryStat<'a> {
    /// Entry name; opaque bytes, UTF-8 only when the entry says so.
    pub name: &'a [u8],
    /// Uncompressed size in bytes; 0 for directories.
    pub size: u64,
    /// Raw DOS modification time; 0 for synthesized directories.
    pub dos_time: u32,
    /// File or directory.
    pub kind: EntryKind,
}

impl<'a> EntryStat<'a> {
    /// The modification time as a decodable [`DateTime`].
    pub fn last_modified(&self) -> DateTime {
        DateTime::from_raw(self.dos_time)
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// A materialized archive member: central-directory metadata plus the
/// member's compressed bytes in place, and, once inflated, its contents.
///
/// The descriptor borrows the archive slice and cannot outlive it. It is
/// move-only: for `STORE` members the contents alias `raw`, and the
/// `Cow` tracks whether anything was actually allocated.
#[derive(Debug)]
pub struct ZipEntry<'a> {
    pub(crate) name: &'a [u8],
    pub(crate) flags: u16,
    pub(crate) dos_time: u32,
    pub(crate) crc32: u32,
    pub(crate) compressed_size: u64,
    pub(crate) uncompressed_size: u64,
    pub(crate) method: CompressionMethod,
    pub(crate) raw: &'a [u8],
    pub(crate) contents: Option<Cow<'a, [u8]>>,
}

impl<'a> ZipEntry<'a> {
    /// The stored entry name. Opaque bytes; see [`Self::is_utf8`].
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    /// True iff the name ends in `/`.
    pub fn is_dir(&self) -> bool {
        spec::is_dir(self.name)
    }

    /// General-purpose bit 11: the name (and comment) are UTF-8.
    pub fn is_utf8(&self) -> bool {
        self.flags & (1 << 11) != 0
    }

    /// General-purpose bit 0: the member is encrypted. Encrypted members
    /// cannot be read by this crate.
    pub fn is_encrypted(&self) -> bool {
        self.flags & 1 != 0
    }

    /// Uncompressed size in bytes, with any ZIP64 override applied.
    pub fn size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Compressed size in bytes, with any ZIP64 override applied.
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Raw DOS modification time from the central directory.
    pub fn mtime_dos(&self) -> u32 {
        self.dos_time
    }

    /// The modification time as a decodable [`DateTime`].
    pub fn last_modified(&self) -> DateTime {
        DateTime::from_raw(self.dos_time)
    }

    /// CRC-32 of the uncompressed data, as recorded by the writer. Never
    /// verified by this crate.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// How the member's bytes are stored.
    pub fn compression_method(&self) -> CompressionMethod {
        self.method
    }

    /// The member's compressed bytes, borrowed from the archive slice.
    pub fn raw_data(&self) -> &'a [u8] {
        self.raw
    }

    /// The readable contents, if [`Self::inflate`] has run.
    pub fn contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }

    /// Decompress the member in place. Idempotent; directories inflate to
    /// empty contents. `STORE` members alias the raw bytes without copying.
    pub fn inflate(&mut self) -> ZipResult<()> {
        if self.contents.is_some() {
            return Ok(());
        }
        let contents = if self.is_dir() {
            Cow::Borrowed(&[] as &[u8])
        } else {
            compression::decompress(self.method, self.raw, self.uncompressed_size)?
        };
        self.contents = Some(contents);
        Ok(())
    }
}
