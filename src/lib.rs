//! Streaming archive and compressed-file extraction.
//!
//! Given a path, an [`Archiver`] identifies the container and/or
//! compression format, opens a streaming read path and invokes a
//! caller-supplied [`EntryHandler`] once per logical entry, without ever
//! materializing decompressed data to disk. Built for ingestion pipelines
//! that must inspect untrusted archives: every entry reader is routed
//! through a shared byte budget ([`LimitProvider`]) so decompression
//! bombs abort early, and the tar front-end fans entries out across
//! symlink aliases so content is seen under every reachable path.
//!
//! ```no_run
//! use archive_extractor::{Archiver, ArchiveHeader, ExtractError, TarArchiver};
//! use std::io::Read;
//!
//! let archiver = TarArchiver {
//!     max_compress_ratio: 100,
//!     max_number_of_entries: 10_000,
//! };
//! let mut names = Vec::new();
//! archiver.extract_archive(
//!     "layer.tar.gz".as_ref(),
//!     &mut |header: &mut ArchiveHeader<'_>| -> Result<(), ExtractError> {
//!         names.push(header.name.clone());
//!         let mut prefix = [0u8; 512];
//!         let read = header.read(&mut prefix)?;
//!         // inspect prefix[..read]
//!         Ok(())
//!     },
//! )?;
//! # Ok::<(), ExtractError>(())
//! ```

mod archivers;
mod codec;
mod errors;
mod header;
mod limits;
mod paths;

#[cfg(test)]
mod test_utils;

pub use archivers::{Archiver, Decompressor, GzMetadataArchiver, TarArchiver, ZipArchiver};
pub use codec::{detect, CodecChain, CodecError, CodecOptions, CompressionKind, DEFAULT_BUF_SIZE};
pub use errors::{EntryError, ExtractError, MultiError};
pub use header::{ArchiveHeader, EntryHandler};
pub use limits::{CompressLimitReached, LimitAggregatingReader, LimitProvider};
pub use paths::{
    clean, clean_entry_name, clean_join, is_folder, is_placeholder_folder, strip_final_extension,
};
