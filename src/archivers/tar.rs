//! Tar-family extraction with symlink alias fan-out.
//!
//! Extraction is two streaming passes over the archive. The first pass
//! only records symlinks, mapping each link target (the *real* path) to
//! the ordered list of link paths that reach it. The second pass surfaces
//! every regular entry once for its own path and once per alias, so a
//! scanner sees the content under every name by which the archive makes
//! it reachable.
//!
//! All alias invocations of one entry share the entry's single underlying
//! reader: bytes consumed while handling one alias are not delivered
//! again for the next. Handlers that need the content must read it during
//! the first invocation; later aliases carry the same metadata and the
//! remaining (typically empty) stream.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tar::{Archive, Entry};
use tracing::{debug, trace};

use crate::archivers::{archive_metadata, Archiver};
use crate::codec::{self, CodecChain, CodecOptions};
use crate::errors::{ExtractError, MultiError};
use crate::header::{ArchiveHeader, EntryHandler};
use crate::limits::LimitProvider;
use crate::paths;

type SymlinkMap = HashMap<String, Vec<String>>;

/// Streaming extractor for POSIX tar archives, with or without an outer
/// compression layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarArchiver {
    /// Maximum decompressed/compressed ratio, 0 meaning unbounded.
    pub max_compress_ratio: u64,
    /// Maximum number of archive entries per pass, 0 meaning unbounded.
    /// The limit is inclusive: an archive with exactly this many entries
    /// extracts, one more fails with
    /// [`TooManyEntries`](ExtractError::TooManyEntries).
    pub max_number_of_entries: usize,
}

impl Archiver for TarArchiver {
    #[tracing::instrument(skip(self, handler), fields(path = %path.display()))]
    fn extract_archive(
        &self,
        path: &Path,
        handler: &mut dyn EntryHandler,
    ) -> Result<(), ExtractError> {
        let metadata = archive_metadata(path)?;
        let provider = LimitProvider::for_ratio(self.max_compress_ratio, metadata.len());

        let symlinks = self.resolve_symlinks(path)?;
        debug!(targets = symlinks.len(), "resolved symlink map");

        // The first chain was consumed by the symlink pass; decode again
        // from the start, this time drawing down the shared byte budget.
        let mut archive = Archive::new(provider.wrap(self.open_chain(path)?));
        let mut entries = archive
            .entries()
            .map_err(|source| ExtractError::TarDecode {
                path: path.to_path_buf(),
                source,
            })?;

        let mut multi = MultiError::default();
        let mut count = 0usize;
        let walk = loop {
            let Some(next) = entries.next() else {
                break Ok(());
            };
            if self.max_number_of_entries != 0 && count >= self.max_number_of_entries {
                break Err(ExtractError::TooManyEntries);
            }
            count += 1;

            let mut entry = match next {
                Ok(entry) => entry,
                // An undecodable header: nothing after it can be located
                // in the stream, so the walk itself fails.
                Err(source) => {
                    break Err(ExtractError::Process {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            };
            // Only regular files are surfaced: directories, symlinks and
            // special entries carry no content of their own.
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let cleaned = paths::clean_entry_name(&String::from_utf8_lossy(&entry.path_bytes()));
            if paths::is_placeholder_folder(&cleaned) {
                continue;
            }
            let size = match entry.header().size() {
                Ok(size) => size,
                Err(source) => {
                    multi.push(cleaned, source);
                    continue;
                }
            };
            let mod_time = entry.header().mtime().unwrap_or(0) as i64;
            trace!(name = %cleaned, size, "surfacing entry");

            let aliases = symlinks.get(&cleaned).map(Vec::as_slice).unwrap_or(&[]);
            if let Err(err) = surface_entry(&mut entry, &cleaned, aliases, mod_time, size, handler)
            {
                break Err(err);
            }
        };
        multi.finish(walk)
    }
}

/// Invoke the handler for the entry's own path and every alias. All
/// invocations see the same reader; the walk stops on the first handler
/// error only after the remaining aliases were attempted.
fn surface_entry<R: Read>(
    entry: &mut Entry<'_, R>,
    cleaned: &str,
    aliases: &[String],
    mod_time: i64,
    size: u64,
    handler: &mut dyn EntryHandler,
) -> Result<(), ExtractError> {
    let mut first_err = None;
    for name in std::iter::once(cleaned).chain(aliases.iter().map(String::as_str)) {
        let mut header = ArchiveHeader::new(&mut *entry, name, mod_time, size);
        if let Err(err) = handler.on_entry(&mut header) {
            first_err.get_or_insert(err);
        }
    }
    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl TarArchiver {
    fn open_chain(&self, path: &Path) -> Result<CodecChain, ExtractError> {
        codec::open(path, &CodecOptions::default())
            .map_err(|err| ExtractError::from_codec(err, path))
    }

    /// First pass: map every symlink's resolved target to the link paths
    /// pointing at it, in archive order. Reads headers only; entry
    /// content is skipped without charging the extraction budget.
    fn resolve_symlinks(&self, path: &Path) -> Result<SymlinkMap, ExtractError> {
        let mut archive = Archive::new(self.open_chain(path)?);
        let mut symlinks = SymlinkMap::new();
        let mut count = 0usize;
        for next in archive
            .entries()
            .map_err(|source| ExtractError::TarDecode {
                path: path.to_path_buf(),
                source,
            })?
        {
            if self.max_number_of_entries != 0 && count >= self.max_number_of_entries {
                return Err(ExtractError::TooManyEntries);
            }
            count += 1;

            let entry = next.map_err(|source| ExtractError::TarDecode {
                path: path.to_path_buf(),
                source,
            })?;
            if !entry.header().entry_type().is_symlink() {
                continue;
            }
            let cleaned = paths::clean_entry_name(&String::from_utf8_lossy(&entry.path_bytes()));
            let Some(target) = entry.link_name_bytes() else {
                continue;
            };
            let target = String::from_utf8_lossy(&target).into_owned();
            let real = resolve_target(&cleaned, &target);
            trace!(link = %cleaned, %real, "recorded symlink");
            symlinks.entry(real).or_default().push(cleaned);
        }
        Ok(symlinks)
    }
}

/// The real path a symlink resolves to inside the archive: an absolute
/// target stands alone, a relative one is joined onto the link's parent
/// directory.
fn resolve_target(cleaned_link: &str, target: &str) -> String {
    if target.starts_with('/') {
        return paths::clean_entry_name(target);
    }
    let parent = match cleaned_link.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    };
    paths::clean_join(parent, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_targets_resolve_against_link_parent() {
        assert_eq!(resolve_target("dir/link", "file"), "dir/file");
        assert_eq!(resolve_target("dir/sub/link", "../file"), "dir/file");
        assert_eq!(resolve_target("link", "file"), "file");
    }

    #[test]
    fn absolute_targets_stand_alone() {
        assert_eq!(resolve_target("dir/link", "/opt/file"), "opt/file");
        assert_eq!(resolve_target("dir/link", "/a//b/./c"), "a/b/c");
    }
}
