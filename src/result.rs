//! Error types that can be emitted from this library

use std::borrow::Cow;

use displaydoc::Display;
use thiserror::Error;

use std::io;

/// Generic result type with ZipError as its error variant
pub type ZipResult<T> = Result<T, ZipError>;

/// Error type for Zip
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum ZipError {
    /// invalid Zip archive: {0}
    InvalidArchive(Cow<'static, str>),

    /// entry data extends past the end of the archive
    Truncated,

    /// unsupported compression method: {0}
    UnsupportedMethod(u16),

    /// decompression failed: {0}
    Decompression(Cow<'static, str>),

    /// specified file not found in archive
    FileNotFound(Box<str>),
}

pub(crate) fn invalid_archive<T, M: Into<Cow<'static, str>>>(message: M) -> ZipResult<T> {
    Err(ZipError::InvalidArchive(message.into()))
}

macro_rules! invalid {
    ($fmt_string:literal) => {
        {
            return crate::result::invalid_archive($fmt_string);
        }
    };
    ($fmt_string:literal, $($param:expr),+) => {
        {
            return crate::result::invalid_archive(format!($fmt_string, $($param),+));
        }
    };
}
pub(crate) use invalid;

impl From<ZipError> for io::Error {
    fn from(err: ZipError) -> io::Error {
        let kind = match &err {
            ZipError::InvalidArchive(_) => io::ErrorKind::InvalidData,
            ZipError::Truncated => io::ErrorKind::UnexpectedEof,
            ZipError::UnsupportedMethod(_) => io::ErrorKind::Unsupported,
            ZipError::Decompression(_) => io::ErrorKind::InvalidData,
            ZipError::FileNotFound(_) => io::ErrorKind::NotFound,
        };

        io::Error::new(kind, err)
    }
}
