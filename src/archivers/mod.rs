//! Extraction front-ends sharing the handler protocol and the
//! decompression-bomb defenses.

mod decompressor;
mod gz_metadata;
mod tar;
mod zip;

use std::fs::Metadata;
use std::path::Path;
use std::time::UNIX_EPOCH;

pub use self::decompressor::Decompressor;
pub use self::gz_metadata::GzMetadataArchiver;
pub use self::tar::TarArchiver;
pub use self::zip::ZipArchiver;

use crate::errors::ExtractError;
use crate::header::EntryHandler;

/// Common capability of the four front-ends: stream the entries of the
/// archive at `path` into `handler`.
pub trait Archiver {
    fn extract_archive(
        &self,
        path: &Path,
        handler: &mut dyn EntryHandler,
    ) -> Result<(), ExtractError>;
}

pub(crate) fn archive_metadata(path: &Path) -> Result<Metadata, ExtractError> {
    std::fs::metadata(path).map_err(|source| ExtractError::open(path, source))
}

pub(crate) fn unix_mod_time(metadata: &Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}
