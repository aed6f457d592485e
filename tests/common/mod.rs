//! In-memory construction of ZIP byte streams for tests.
//!
//! The crate only reads archives, so the tests assemble their fixtures by
//! hand: local headers, central directory, EOCD, and (when a member needs
//! it) ZIP64 records, laid out the way everyday writers produce them.

use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

const SENTINEL32: u32 = u32::MAX;
const SENTINEL16: u16 = u16::MAX;

struct Member {
    name: Vec<u8>,
    method: u16,
    dos_time: u32,
    payload: Vec<u8>,
    uncompressed_size: u64,
    compressed_size: u64,
    /// Claim this local-header offset in the central directory instead of
    /// the member's real position.
    header_offset_override: Option<u64>,
}

#[derive(Default)]
pub struct ZipBuilder {
    prefix: Vec<u8>,
    comment: Vec<u8>,
    members: Vec<Member>,
}

#[allow(dead_code)]
impl ZipBuilder {
    pub fn new() -> ZipBuilder {
        ZipBuilder::default()
    }

    /// Prepend arbitrary bytes before the archive proper.
    pub fn prefix(mut self, bytes: &[u8]) -> ZipBuilder {
        self.prefix = bytes.to_vec();
        self
    }

    pub fn comment(mut self, bytes: &[u8]) -> ZipBuilder {
        self.comment = bytes.to_vec();
        self
    }

    /// A `STORE` member.
    pub fn file(self, name: &str, data: &[u8]) -> ZipBuilder {
        self.file_with_time(name, data, 0)
    }

    pub fn file_with_time(mut self, name: &str, data: &[u8], dos_time: u32) -> ZipBuilder {
        self.members.push(Member {
            name: name.as_bytes().to_vec(),
            method: 0,
            dos_time,
            payload: data.to_vec(),
            uncompressed_size: data.len() as u64,
            compressed_size: data.len() as u64,
            header_offset_override: None,
        });
        self
    }

    /// A `DEFLATE` member compressed from `data`.
    pub fn file_deflated(mut self, name: &str, data: &[u8]) -> ZipBuilder {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        let payload = encoder.finish().unwrap();
        self.members.push(Member {
            name: name.as_bytes().to_vec(),
            method: 8,
            dos_time: 0,
            payload: payload.clone(),
            uncompressed_size: data.len() as u64,
            compressed_size: payload.len() as u64,
            header_offset_override: None,
        });
        self
    }

    /// An explicit directory entry (name must end in `/`).
    pub fn dir(self, name: &str) -> ZipBuilder {
        assert!(name.ends_with('/'));
        self.file(name, b"")
    }

    /// A member with an arbitrary compression method and raw payload.
    pub fn member_raw(
        mut self,
        name: &str,
        method: u16,
        payload: &[u8],
        uncompressed_size: u64,
    ) -> ZipBuilder {
        self.members.push(Member {
            name: name.as_bytes().to_vec(),
            method,
            dos_time: 0,
            payload: payload.to_vec(),
            uncompressed_size,
            compressed_size: payload.len() as u64,
            header_offset_override: None,
        });
        self
    }

    /// A member whose central-directory record claims the given sizes and
    /// local-header offset. Values over 32 bits get ZIP64 sentinels plus an
    /// extended-information extra field. A dummy local header is emitted at
    /// the member's real position so the slice contains one.
    pub fn phantom_member(
        mut self,
        name: &str,
        uncompressed_size: u64,
        compressed_size: u64,
        header_offset: u64,
    ) -> ZipBuilder {
        self.members.push(Member {
            name: name.as_bytes().to_vec(),
            method: 0,
            dos_time: 0,
            payload: Vec::new(),
            uncompressed_size,
            compressed_size,
            header_offset_override: Some(header_offset),
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = self.prefix.clone();
        let zip_start = out.len();

        let mut header_offsets = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let offset = (out.len() - zip_start) as u64;
            header_offsets.push(member.header_offset_override.unwrap_or(offset));

            out.extend_from_slice(&0x04034b50u32.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes()); // version needed
            out.extend_from_slice(&0u16.to_le_bytes()); // flags
            out.extend_from_slice(&member.method.to_le_bytes());
            out.extend_from_slice(&member.dos_time.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // crc32
            out.extend_from_slice(&clamp32(member.compressed_size).to_le_bytes());
            out.extend_from_slice(&clamp32(member.uncompressed_size).to_le_bytes());
            out.extend_from_slice(&(member.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // extra field length
            out.extend_from_slice(&member.name);
            out.extend_from_slice(&member.payload);
        }

        let cd_offset = (out.len() - zip_start) as u64;
        let mut any_zip64 = false;
        for (member, &header_offset) in self.members.iter().zip(&header_offsets) {
            let mut extra = Vec::new();
            let mut zip64_data = Vec::new();
            if member.uncompressed_size > u64::from(u32::MAX) {
                zip64_data.extend_from_slice(&member.uncompressed_size.to_le_bytes());
            }
            if member.compressed_size > u64::from(u32::MAX) {
                zip64_data.extend_from_slice(&member.compressed_size.to_le_bytes());
            }
            if header_offset > u64::from(u32::MAX) {
                zip64_data.extend_from_slice(&header_offset.to_le_bytes());
            }
            if !zip64_data.is_empty() {
                any_zip64 = true;
                extra.extend_from_slice(&0x0001u16.to_le_bytes());
                extra.extend_from_slice(&(zip64_data.len() as u16).to_le_bytes());
                extra.extend_from_slice(&zip64_data);
            }

            out.extend_from_slice(&0x02014b50u32.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes()); // version made by
            out.extend_from_slice(&20u16.to_le_bytes()); // version needed
            out.extend_from_slice(&0u16.to_le_bytes()); // flags
            out.extend_from_slice(&member.method.to_le_bytes());
            out.extend_from_slice(&member.dos_time.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // crc32
            out.extend_from_slice(&clamp32(member.compressed_size).to_le_bytes());
            out.extend_from_slice(&clamp32(member.uncompressed_size).to_le_bytes());
            out.extend_from_slice(&(member.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // comment length
            out.extend_from_slice(&0u16.to_le_bytes()); // disk number start
            out.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
            out.extend_from_slice(&0u32.to_le_bytes()); // external attributes
            out.extend_from_slice(&clamp32(header_offset).to_le_bytes());
            out.extend_from_slice(&member.name);
            out.extend_from_slice(&extra);
        }
        let cd_size = (out.len() - zip_start) as u64 - cd_offset;

        if any_zip64 {
            let zip64_eocd_position = out.len() as u64;
            out.extend_from_slice(&0x06064b50u32.to_le_bytes());
            out.extend_from_slice(&44u64.to_le_bytes()); // record size
            out.extend_from_slice(&45u16.to_le_bytes()); // version made by
            out.extend_from_slice(&45u16.to_le_bytes()); // version needed
            out.extend_from_slice(&0u32.to_le_bytes()); // disk number
            out.extend_from_slice(&0u32.to_le_bytes()); // cd disk number
            out.extend_from_slice(&(self.members.len() as u64).to_le_bytes());
            out.extend_from_slice(&(self.members.len() as u64).to_le_bytes());
            out.extend_from_slice(&cd_size.to_le_bytes());
            out.extend_from_slice(&cd_offset.to_le_bytes());

            out.extend_from_slice(&0x07064b50u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // disk with zip64 eocd
            out.extend_from_slice(&zip64_eocd_position.to_le_bytes());
            out.extend_from_slice(&1u32.to_le_bytes()); // total disks
        }

        out.extend_from_slice(&0x06054b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // disk number
        out.extend_from_slice(&0u16.to_le_bytes()); // cd disk number
        let entries16 = if any_zip64 {
            SENTINEL16
        } else {
            self.members.len() as u16
        };
        out.extend_from_slice(&entries16.to_le_bytes());
        out.extend_from_slice(&entries16.to_le_bytes());
        if any_zip64 {
            out.extend_from_slice(&SENTINEL32.to_le_bytes());
            out.extend_from_slice(&SENTINEL32.to_le_bytes());
        } else {
            out.extend_from_slice(&(cd_size as u32).to_le_bytes());
            out.extend_from_slice(&(cd_offset as u32).to_le_bytes());
        }
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.comment);

        out
    }
}

fn clamp32(value: u64) -> u32 {
    if value > u64::from(u32::MAX) {
        SENTINEL32
    } else {
        value as u32
    }
}
