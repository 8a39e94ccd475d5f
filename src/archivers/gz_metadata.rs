//! Metadata-only archiver: the whole decompressed stream is one logical
//! entry named `metadata`.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::archivers::Archiver;
use crate::codec::{self, CodecOptions};
use crate::errors::ExtractError;
use crate::header::{ArchiveHeader, EntryHandler};
use crate::limits::LimitProvider;

const METADATA_ENTRY_NAME: &str = "metadata";

/// Surfaces a compressed metadata blob (a repository index, typically
/// gzipped) as a single entry. Unlike [`Decompressor`](crate::Decompressor)
/// it does not insist on the content being compressed: a pass-through
/// stream is handed over as-is. The entry reports the current wall clock
/// as its modification time and size 0, the stream length being unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct GzMetadataArchiver {
    /// Maximum decompressed/compressed ratio, 0 meaning unbounded.
    pub max_compress_ratio: u64,
}

impl Archiver for GzMetadataArchiver {
    #[tracing::instrument(skip(self, handler), fields(path = %path.display()))]
    fn extract_archive(
        &self,
        path: &Path,
        handler: &mut dyn EntryHandler,
    ) -> Result<(), ExtractError> {
        let metadata = super::archive_metadata(path)?;
        let provider = LimitProvider::for_ratio(self.max_compress_ratio, metadata.len());

        let chain = codec::open(path, &CodecOptions::default())
            .map_err(|err| ExtractError::from_codec(err, path))?;
        let mut reader = provider.wrap(chain);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or(0);
        let mut header = ArchiveHeader::new(&mut reader, METADATA_ENTRY_NAME, now, 0);
        handler.on_entry(&mut header)
    }
}
