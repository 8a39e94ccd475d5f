//! Error taxonomy for extraction.
//!
//! Errors are plain values with `source()` chains. Per-entry failures that
//! do not abort a walk are collected into [`MultiError`] in insertion
//! order, so callers can decide whether a partially readable archive is
//! acceptable.

use std::error::Error as _;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

use crate::codec::CodecError;
use crate::limits::CompressLimitReached;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A codec constructor rejected the stream: the content could not be
    /// opened as the selected format at all.
    #[error("failed to construct decoder for {path}: {source}")]
    GetReader {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file {path} is not compressed or the compression method is not supported")]
    NotCompressedOrNotSupported { path: PathBuf },

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to process {path}: {source}")]
    Process {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a valid tar stream: {source}")]
    TarDecode {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("archive has too many entries")]
    TooManyEntries,

    #[error("not enough space to extract archive")]
    NotEnoughSpace,

    #[error("no zip file found in {path}")]
    NoZipFileFound { path: PathBuf },

    #[error(transparent)]
    Multi(#[from] MultiError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ExtractError {
    pub(crate) fn open(path: &Path, source: io::Error) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn from_codec(err: CodecError, path: &Path) -> Self {
        match err {
            CodecError::Io(source) => Self::open(path, source),
            CodecError::GetReader(source) => Self::GetReader {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Whether this error, anywhere along its cause chain, was raised by
    /// the aggregate decompression budget being exhausted.
    pub fn is_compress_limit_reached(&self) -> bool {
        match self {
            Self::GetReader { source, .. }
            | Self::Open { source, .. }
            | Self::Process { source, .. }
            | Self::TarDecode { source, .. }
            | Self::Io(source) => io_holds_compress_limit(source),
            Self::Multi(multi) => multi.iter().any(|e| io_holds_compress_limit(&e.source)),
            _ => false,
        }
    }
}

/// `io::Error::source()` skips over the error's own custom payload, so
/// the payload is inspected through `get_ref` at every nesting level.
fn io_holds_compress_limit(err: &io::Error) -> bool {
    let Some(inner) = err.get_ref() else {
        return false;
    };
    if inner.is::<CompressLimitReached>() {
        return true;
    }
    if let Some(nested) = inner.downcast_ref::<io::Error>() {
        return io_holds_compress_limit(nested);
    }
    let mut current = inner.source();
    while let Some(cause) = current {
        if cause.is::<CompressLimitReached>() {
            return true;
        }
        current = cause.source();
    }
    false
}

/// A failure attributed to one archive entry.
#[derive(Debug, thiserror::Error)]
#[error("failed to process entry {path}: {source}")]
pub struct EntryError {
    pub path: String,
    #[source]
    pub source: io::Error,
}

/// Ordered aggregation of per-entry failures that did not abort the walk.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<EntryError>,
}

impl MultiError {
    pub fn push(&mut self, path: impl Into<String>, source: io::Error) {
        self.errors.push(EntryError {
            path: path.into(),
            source,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryError> {
        self.errors.iter()
    }

    /// The walk error dominates; an accumulator left over from a clean
    /// walk is returned as the terminal error.
    pub(crate) fn finish(self, walk: Result<(), ExtractError>) -> Result<(), ExtractError> {
        match walk {
            Err(err) => Err(err),
            Ok(()) if !self.is_empty() => Err(self.into()),
            Ok(()) => Ok(()),
        }
    }
}

impl Display for MultiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} archive entries failed", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n  {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}
