//! Possible ZIP compression methods and the decompression engine.

use std::borrow::Cow;
use std::fmt;

use flate2::{Decompress, FlushDecompress, Status};

use crate::result::{ZipError, ZipResult};

/// Identifies the storage format used to write an entry's bytes.
///
/// When creating ZIP files, you may choose the method to use with
/// other tools; this crate only reads them. Only `Stored` and `Deflated`
/// members can be decompressed; every other method is carried through as
/// [`Unsupported`](CompressionMethod::Unsupported) and rejected at read
/// time.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[non_exhaustive]
pub enum CompressionMethod {
    /// Store the file as is
    Stored,
    /// Compress the file using Deflate
    Deflated,
    /// Unsupported compression method
    Unsupported(u16),
}

impl CompressionMethod {
    /// Decode the method from its central-directory field value.
    pub const fn parse_from_u16(val: u16) -> CompressionMethod {
        match val {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflated,
            v => CompressionMethod::Unsupported(v),
        }
    }

    /// The method's central-directory field value.
    pub const fn serialize_to_u16(self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflated => 8,
            CompressionMethod::Unsupported(v) => v,
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Just duplicate what the Debug format looks like, i.e, the enum key:
        write!(f, "{self:?}")
    }
}

/// Produce the readable bytes of a member whose compressed payload is `raw`.
///
/// `STORE` aliases the input without allocating; `DEFLATE` inflates a raw
/// deflate stream (no zlib or gzip framing) into a buffer of exactly
/// `uncompressed_size` bytes. Pure: no shared state, safe to call
/// concurrently for distinct members.
pub(crate) fn decompress(
    method: CompressionMethod,
    raw: &[u8],
    uncompressed_size: u64,
) -> ZipResult<Cow<'_, [u8]>> {
    match method {
        CompressionMethod::Stored => Ok(Cow::Borrowed(raw)),
        CompressionMethod::Deflated => inflate_raw(raw, uncompressed_size).map(Cow::Owned),
        CompressionMethod::Unsupported(v) => Err(ZipError::UnsupportedMethod(v)),
    }
}

fn inflate_raw(raw: &[u8], uncompressed_size: u64) -> ZipResult<Vec<u8>> {
    let size = usize::try_from(uncompressed_size)
        .map_err(|_| ZipError::Decompression("uncompressed size exceeds address space".into()))?;
    let mut out = vec![0u8; size];
    let mut inflater = Decompress::new(false);

    loop {
        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out() as usize;
        let status = inflater
            .decompress(&raw[consumed..], &mut out[produced..], FlushDecompress::Finish)
            .map_err(|err| ZipError::Decompression(err.to_string().into()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                // No forward progress: the output is full while the stream
                // wants more, or the input ran out before end-of-stream.
                if inflater.total_in() as usize == consumed
                    && inflater.total_out() as usize == produced
                {
                    return Err(ZipError::Decompression(
                        "deflate stream did not terminate".into(),
                    ));
                }
            }
        }
    }

    if inflater.total_out() != uncompressed_size {
        return Err(ZipError::Decompression(
            "deflate stream ended short of the declared size".into(),
        ));
    }
    if inflater.total_in() as usize != raw.len() {
        return Err(ZipError::Decompression(
            "trailing bytes after end of deflate stream".into(),
        ));
    }

    Ok(out)
}
