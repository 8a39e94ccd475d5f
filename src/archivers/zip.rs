//! Zip extraction driven by the central directory.

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::trace;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::archivers::Archiver;
use crate::errors::{ExtractError, MultiError};
use crate::header::{ArchiveHeader, EntryHandler};
use crate::limits::LimitProvider;
use crate::paths;

/// Streaming extractor for zip archives.
///
/// The central directory is located from the end of the file, so archives
/// with leading non-zip bytes (the zip-with-prefix layout found in `.deb`
/// packages) extract normally. A file without a recognizable central
/// directory fails with [`NoZipFileFound`](ExtractError::NoZipFileFound).
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiver {
    /// Maximum decompressed/compressed ratio, 0 meaning unbounded.
    pub max_compress_ratio: u64,
    /// Maximum number of central-directory entries, 0 meaning unbounded.
    /// Inclusive, like [`TarArchiver`](crate::TarArchiver).
    pub max_number_of_entries: usize,
}

impl Archiver for ZipArchiver {
    #[tracing::instrument(skip(self, handler), fields(path = %path.display()))]
    fn extract_archive(
        &self,
        path: &Path,
        handler: &mut dyn EntryHandler,
    ) -> Result<(), ExtractError> {
        let file = File::open(path).map_err(|source| ExtractError::open(path, source))?;
        let compressed_size = file
            .metadata()
            .map_err(|source| ExtractError::open(path, source))?
            .len();
        let provider = LimitProvider::for_ratio(self.max_compress_ratio, compressed_size);

        let mut archive = ZipArchive::new(file).map_err(|err| match err {
            ZipError::Io(source) => ExtractError::open(path, source),
            _ => ExtractError::NoZipFileFound {
                path: path.to_path_buf(),
            },
        })?;

        let mut multi = MultiError::default();
        let walk = 'walk: {
            for index in 0..archive.len() {
                if self.max_number_of_entries != 0 && index >= self.max_number_of_entries {
                    break 'walk Err(ExtractError::TooManyEntries);
                }
                let fallback_name = archive
                    .name_for_index(index)
                    .map(paths::clean_entry_name);
                let mut entry = match archive.by_index(index) {
                    Ok(entry) => entry,
                    Err(err) => {
                        let name = fallback_name.unwrap_or_else(|| format!("#{index}"));
                        multi.push(name, io::Error::other(err));
                        continue;
                    }
                };
                if entry.is_dir() {
                    continue;
                }
                let cleaned = paths::clean_entry_name(entry.name());
                if paths::is_placeholder_folder(&cleaned) {
                    continue;
                }
                let mod_time = entry
                    .last_modified()
                    .and_then(|modified| modified.to_time().ok())
                    .map(|modified| modified.unix_timestamp())
                    .unwrap_or(0);
                let size = entry.size();
                trace!(name = %cleaned, size, "surfacing entry");

                let mut reader = provider.wrap(&mut entry);
                let mut header = ArchiveHeader::new(&mut reader, cleaned, mod_time, size);
                if let Err(err) = handler.on_entry(&mut header) {
                    break 'walk Err(err);
                }
            }
            Ok(())
        };
        multi.finish(walk)
    }
}
