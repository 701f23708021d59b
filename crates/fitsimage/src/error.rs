use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur while accessing a FITS image.
#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be opened or created.
    #[error("cannot open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A file was requested in create mode but the path is already taken.
    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    /// The file contents are not a valid FITS primary header.
    #[error("invalid FITS header: {0}")]
    InvalidHeader(&'static str),
    /// Unrecognized BITPIX value.
    #[error("invalid BITPIX value: {0}")]
    InvalidBitpix(i64),
    /// The image is not a flat 2-D scalar image of the expected type.
    #[error("unsupported image shape: {0}")]
    UnsupportedShape(String),
    /// A keyword required to describe the image is absent.
    #[error("missing required keyword: {0}")]
    MissingKeyword(String),
    /// A keyword requested by the caller is absent.
    #[error("keyword '{0}' not found")]
    KeywordNotFound(String),
    /// A keyword exists but its value cannot be read as the requested type.
    #[error("keyword '{keyword}' is not {expected}")]
    TypeMismatch {
        keyword: String,
        expected: &'static str,
    },
    /// Pixel read out of bounds or past the stored data.
    #[error("read failed: {0}")]
    Read(String),
    /// Header or pixel update refused, or the storage write failed.
    #[error("write failed: {0}")]
    Write(String),
    /// The storage write failed at the OS level.
    #[error("cannot write '{}': {source}", path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A pixel buffer could not be allocated.
    #[error("cannot allocate buffer of {0} pixels")]
    Allocation(usize),
}

/// Coarse error category, used by callers that map failures to exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Open,
    UnsupportedShape,
    MissingKeyword,
    KeywordNotFound,
    TypeMismatch,
    Read,
    Write,
    Allocation,
}

impl Error {
    /// Return the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Open { .. } | Error::AlreadyExists(_) | Error::InvalidHeader(_) => {
                ErrorKind::Open
            }
            Error::InvalidBitpix(_) | Error::UnsupportedShape(_) => ErrorKind::UnsupportedShape,
            Error::MissingKeyword(_) => ErrorKind::MissingKeyword,
            Error::KeywordNotFound(_) => ErrorKind::KeywordNotFound,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::Read(_) => ErrorKind::Read,
            Error::Write(_) | Error::Flush { .. } => ErrorKind::Write,
            Error::Allocation(_) => ErrorKind::Allocation,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
