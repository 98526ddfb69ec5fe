use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error as TError;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors produced while decoding or splitting a boot image.
#[derive(Debug, TError)]
pub enum Error {
    /// Wrong file type
    #[error("android boot magic not found in {0}")]
    InvalidMagic(String),

    /// Flash page size of zero, or too small to hold the header
    #[error("invalid flash page size {0}")]
    InvalidPageSize(u32),

    /// The file ends before the header does
    #[error("boot image truncated before the end of the header")]
    TruncatedInput,

    /// I/O error with the offending path attached
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Ramdisk payload is not a valid gzip stream
    #[error("gunzip {} failed: {source}", .path.display())]
    Decompression {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other decoding error
    #[error("malformed boot image header: {0}")]
    Decode(binrw::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps a binrw decode failure onto the crate taxonomy. A short read
    /// anywhere in the header means the file cannot hold one.
    pub(crate) fn from_decode(err: binrw::Error) -> Self {
        match err {
            binrw::Error::BadMagic { .. } => Error::InvalidMagic("<input>".into()),
            binrw::Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Error::TruncatedInput
            }
            binrw::Error::Backtrace(bt) => Self::from_decode(*bt.error),
            other => Error::Decode(other),
        }
    }

    /// Attaches the input path to errors that identify the file itself.
    pub(crate) fn locate(self, path: &Path) -> Self {
        match self {
            Error::InvalidMagic(_) => Error::InvalidMagic(path.display().to_string()),
            other => other,
        }
    }
}
