//! The hierarchical filesystem surface over a flat ZIP entry table.
//!
//! ZIP names entries by full path; a mount point needs directories. This
//! module resolves paths against the name-sorted entry index, synthesizes
//! directory nodes for intermediate components that have no record of their
//! own, and serves file reads through a bounded LRU cache of decompressed
//! members.

use memchr::memchr;

use crate::cache::LruCache;
use crate::read::{Config, ZipArchive};
use crate::result::{ZipError, ZipResult};
use crate::spec;
use crate::types::{EntryKind, EntryStat, ZipEntry};

/// Default number of materialized entries kept by the read cache.
pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// A read-only filesystem view of one ZIP archive.
///
/// Paths are `/`-separated byte strings; the empty path (or `"/"`) is the
/// archive root. Lookup is byte-exact and case-sensitive.
///
/// The archive index is immutable and shareable; the read cache is not
/// internally synchronized, so a `ZipFs` shared between threads must sit
/// behind a mutex (or each thread keeps its own).
pub struct ZipFs<'a> {
    archive: ZipArchive<'a>,
    cache: LruCache<usize, ZipEntry<'a>>,
}

impl<'a> ZipFs<'a> {
    /// Open an archive with the default read-cache capacity.
    pub fn open(data: &'a [u8]) -> ZipResult<ZipFs<'a>> {
        Self::with_cache_capacity(data, DEFAULT_CACHE_SIZE)
    }

    /// Open an archive holding at most `capacity` decompressed members.
    pub fn with_cache_capacity(data: &'a [u8], capacity: usize) -> ZipResult<ZipFs<'a>> {
        Ok(ZipFs {
            archive: ZipArchive::new(data)?,
            // The read path parks entries in the cache before borrowing
            // them back out, so it needs at least one slot.
            cache: LruCache::new(capacity.max(1)),
        })
    }

    /// Open an archive with an explicit parser configuration.
    pub fn with_config(config: Config, data: &'a [u8], capacity: usize) -> ZipResult<ZipFs<'a>> {
        Ok(ZipFs {
            archive: ZipArchive::with_config(config, data)?,
            cache: LruCache::new(capacity.max(1)),
        })
    }

    /// The underlying archive index.
    pub fn archive(&self) -> &ZipArchive<'a> {
        &self.archive
    }

    /// Number of real entries (synthesized directories not included).
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Whether the archive contains no entries.
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Resolve a path to what it names.
    ///
    /// Returns `None` when nothing in the archive matches. The root
    /// resolves to `(Dir, None)`. A directory that exists only implicitly
    /// (some entry traverses it, none records it) resolves to `Dir` with
    /// the index of one such descendant.
    pub fn locate(&self, path: &[u8]) -> Option<(EntryKind, Option<usize>)> {
        if path.is_empty() || path == b"/" {
            return Some((EntryKind::Dir, None));
        }

        if let Some(index) = self.archive.index_for_name(path) {
            let kind = if spec::is_dir(path) {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            return Some((kind, Some(index)));
        }

        let mut dir_name = path.to_vec();
        dir_name.push(b'/');
        if let Some(index) = self.archive.index_for_name(&dir_name) {
            return Some((EntryKind::Dir, Some(index)));
        }
        if let Some(index) = self.first_with_prefix(&dir_name) {
            return Some((EntryKind::Dir, Some(index)));
        }

        None
    }

    /// Metadata for the entry at `index`.
    pub fn stat(&self, index: usize) -> ZipResult<EntryStat<'a>> {
        let entry = self.archive.central_entry(index)?;
        let kind = if spec::is_dir(entry.name) {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        Ok(EntryStat {
            name: entry.name,
            size: entry.uncompressed_size,
            dos_time: entry.block.dos_time,
            kind,
        })
    }

    /// The decompressed contents of the entry at `index`, served from the
    /// cache. Directories read as empty. The borrow is valid until the next
    /// call that touches the cache.
    pub fn read(&mut self, index: usize) -> ZipResult<&[u8]> {
        if index >= self.archive.len() {
            return Err(not_found(index));
        }

        if !self.cache.contains(&index) {
            let mut entry = self.archive.by_index(index)?;
            entry.inflate()?;
            self.cache.insert(index, entry);
        }

        match self.cache.get(&index) {
            Some(entry) => Ok(entry.contents().unwrap_or(&[])),
            None => Err(not_found(index)),
        }
    }

    /// Drop all cached decompressed members. Subsequent reads re-inflate.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Visit the direct children of a directory.
    ///
    /// `path` must name a directory (empty, `"/"`, or any form `locate`
    /// resolves to one); a trailing `/` is supplied if missing. Files and
    /// explicitly recorded subdirectories are reported with their own
    /// metadata; deeper descendants surface once as a synthesized directory
    /// with size 0 and mtime 0. Child names are relative to `path`, with a
    /// single trailing `/` on directories.
    pub fn each<F>(&self, path: &[u8], mut visit: F) -> ZipResult<()>
    where
        F: FnMut(EntryStat<'a>),
    {
        let mut prefix = path.to_vec();
        if prefix == b"/" {
            prefix.clear();
        }
        if !prefix.is_empty() && !prefix.ends_with(b"/") {
            prefix.push(b'/');
        }

        let start = self.archive.lower_bound(&prefix);
        let mut last_dir: &[u8] = &[];

        for index in start..self.archive.len() {
            let entry = self.archive.central_entry(index)?;
            if !entry.name.starts_with(&prefix) {
                break;
            }
            if entry.name == &prefix[..] {
                continue;
            }

            let rel = &entry.name[prefix.len()..];
            match memchr(b'/', rel) {
                // No slash: a file directly in this directory.
                None => visit(EntryStat {
                    name: rel,
                    size: entry.uncompressed_size,
                    dos_time: entry.block.dos_time,
                    kind: EntryKind::File,
                }),
                // Trailing slash only: a recorded child directory.
                Some(pos) if pos == rel.len() - 1 => {
                    last_dir = rel;
                    visit(EntryStat {
                        name: rel,
                        size: 0,
                        dos_time: entry.block.dos_time,
                        kind: EntryKind::Dir,
                    });
                }
                // Deeper descendant: synthesize its ancestor at this level,
                // once per run of entries sharing it.
                Some(pos) => {
                    let child = &rel[..pos + 1];
                    if child != last_dir {
                        last_dir = child;
                        visit(EntryStat {
                            name: child,
                            size: 0,
                            dos_time: 0,
                            kind: EntryKind::Dir,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    fn first_with_prefix(&self, prefix: &[u8]) -> Option<usize> {
        let start = self.archive.lower_bound(prefix);
        let name = self.archive.name_for_index(start)?;
        name.starts_with(prefix).then_some(start)
    }
}

fn not_found(index: usize) -> ZipError {
    ZipError::FileNotFound(format!("entry #{index}").into_boxed_str())
}
