//! A library for reading ZIP archives as a read-only directory tree.
//!
//! The crate is built for mounting: hand [`ZipFs::open`] an archive that is
//! already in memory (read or memory-mapped by the caller) and it answers
//! the questions a filesystem bridge asks — resolve a path, stat an entry,
//! list a directory, read a file. Directory listings include directories
//! that exist only implicitly, synthesized from the entries that traverse
//! them; file reads decompress members on demand and keep recently used
//! ones in a bounded LRU cache.
//!
//! [`ZipArchive`] underneath is a plain zero-copy reader: it parses the
//! central directory (ZIP64 included, prefixed archives tolerated) into a
//! name-sorted index and materializes entries that borrow their compressed
//! bytes straight from the slice.
//!
//! ```no_run
//! use zipfs::ZipFs;
//!
//! fn list_root(bytes: &[u8]) -> zipfs::ZipResult<()> {
//!     let mut fs = ZipFs::open(bytes)?;
//!
//!     fs.each(b"", |child| {
//!         println!(
//!             "{} ({} bytes)",
//!             String::from_utf8_lossy(child.name),
//!             child.size
//!         );
//!     })?;
//!
//!     if let Some((_, Some(index))) = fs.locate(b"readme.txt") {
//!         let contents = fs.read(index)?;
//!         println!("{}", String::from_utf8_lossy(contents));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Only `STORE` and `DEFLATE` members can be read. Writing, encryption,
//! multi-disk archives, and streaming (non-random) access are out of scope.

#![warn(missing_docs)]

pub mod cache;
mod compression;
mod extra_fields;
pub mod fs;
pub mod read;
pub mod result;
mod spec;
mod types;

pub use crate::cache::LruCache;
pub use crate::compression::CompressionMethod;
pub use crate::fs::{ZipFs, DEFAULT_CACHE_SIZE};
pub use crate::read::{Config, ZipArchive};
pub use crate::result::{ZipError, ZipResult};
pub use crate::types::{DateTime, EntryKind, EntryStat, ZipEntry};
