//! Single-file streaming decompression.

use std::path::Path;

use tracing::debug;

use crate::archivers::{archive_metadata, unix_mod_time, Archiver};
use crate::codec::{self, CodecOptions};
use crate::errors::ExtractError;
use crate::header::{ArchiveHeader, EntryHandler};
use crate::limits::LimitProvider;
use crate::paths;

/// Streams the decompressed content of a single compressed file to the
/// handler in one invocation. The logical entry name is the file's
/// basename with the compression extension stripped; the declared size is
/// the *compressed* size, since the decompressed length is unknown up
/// front.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decompressor {
    /// Maximum decompressed/compressed ratio, 0 meaning unbounded.
    pub max_compress_ratio: u64,
}

impl Archiver for Decompressor {
    #[tracing::instrument(skip(self, handler), fields(path = %path.display()))]
    fn extract_archive(
        &self,
        path: &Path,
        handler: &mut dyn EntryHandler,
    ) -> Result<(), ExtractError> {
        let metadata = archive_metadata(path)?;
        let provider = LimitProvider::for_ratio(self.max_compress_ratio, metadata.len());

        let chain = codec::open(path, &CodecOptions::default())
            .map_err(|err| ExtractError::from_codec(err, path))?;
        if !chain.is_compressed() {
            return Err(ExtractError::NotCompressedOrNotSupported {
                path: path.to_path_buf(),
            });
        }
        debug!(kind = %chain.kind(), "decompressing");

        let name = path
            .file_name()
            .and_then(|basename| basename.to_str())
            .map(paths::strip_final_extension)
            .unwrap_or_default()
            .to_string();
        let mut reader = provider.wrap(chain);
        let mut header =
            ArchiveHeader::new(&mut reader, name, unix_mod_time(&metadata), metadata.len());
        handler.on_entry(&mut header)
    }
}
