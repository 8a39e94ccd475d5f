//! Compression format probe and decoder factory.
//!
//! Classification is a pure function over `(magic prefix, extension)` so
//! the selection policy is testable without touching the filesystem. The
//! factory itself opens the file twice: once for a throwaway magic sniff
//! and once for the decoder, so the decode stream always starts at the
//! configured offset.

mod lzip;
mod lzw;

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use bzip2::read::BzDecoder;
use derive_more::Display;
use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use liblzma::read::XzDecoder;
use liblzma::stream::Stream;
use tracing::debug;

use self::lzip::LzipDecoder;
use self::lzw::LzwReader;

pub const DEFAULT_BUF_SIZE: usize = 32 * 1024;

// xz carries the longest magic considered here.
const MAX_MAGIC_BYTES: usize = 6;

const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];
const BZIP2_MAGIC: &[u8] = &[0x42, 0x5A, 0x68];
const XZ_MAGIC: &[u8] = &[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];
const LZMA_MAGIC: &[u8] = &[0x5D, 0x00, 0x00];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xB5, 0x2F, 0xFD];
const LZIP_MAGIC: &[u8] = &[0x4C, 0x5A, 0x49, 0x50];

/// Compression applied to a byte stream, as far as this library is
/// concerned. `None` means the content is passed through untouched.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
    #[display("bzip2")]
    Bzip2,
    #[display("gzip")]
    Gzip,
    #[display("xz")]
    Xz,
    #[display("lzma")]
    Lzma,
    #[display("zstd")]
    Zstd,
    #[display("lzip")]
    Lzip,
    #[display("lzw")]
    Lzw,
    #[display("deflate")]
    Deflate,
    #[display("zlib")]
    Zlib,
    #[display("none")]
    None,
}

/// Classify content from a magic prefix (the first six bytes at most)
/// and the file extension (without the leading dot, case-sensitive).
///
/// Extension-only formats win first: they have no reliable magic. Magic
/// bytes are tried next, and the extension again as a fallback for files
/// too short to sniff.
pub fn detect(magic: &[u8], extension: Option<&str>) -> CompressionKind {
    match extension {
        Some("Z") => return CompressionKind::Lzw,
        Some("infl") => return CompressionKind::Deflate,
        Some("xp3") => return CompressionKind::Zlib,
        Some("lz") => return CompressionKind::Lzip,
        _ => {}
    }
    if magic.starts_with(BZIP2_MAGIC) {
        return CompressionKind::Bzip2;
    }
    if magic.starts_with(GZIP_MAGIC) {
        return CompressionKind::Gzip;
    }
    if magic.starts_with(XZ_MAGIC) {
        return CompressionKind::Xz;
    }
    if magic.starts_with(LZMA_MAGIC) {
        return CompressionKind::Lzma;
    }
    if magic.starts_with(LZIP_MAGIC) {
        return CompressionKind::Lzip;
    }
    if magic.starts_with(ZSTD_MAGIC) {
        return CompressionKind::Zstd;
    }
    match extension {
        Some("bz2" | "tbz2") => CompressionKind::Bzip2,
        Some("gz" | "tgz") => CompressionKind::Gzip,
        Some("xz" | "txz") => CompressionKind::Xz,
        Some("lzma" | "tlzma") => CompressionKind::Lzma,
        Some("zst") => CompressionKind::Zstd,
        _ => CompressionKind::None,
    }
}

/// Options for [`open`]: how many bytes to seek past before decoding and
/// the buffer size layered between the file and the decoder.
#[derive(Debug, Clone, Copy)]
pub struct CodecOptions {
    pub buf_size: usize,
    pub skip_bytes: u64,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            buf_size: DEFAULT_BUF_SIZE,
            skip_bytes: 0,
        }
    }
}

impl CodecOptions {
    pub fn with_skip_bytes(mut self, skip_bytes: u64) -> Self {
        self.skip_bytes = skip_bytes;
        self
    }

    pub fn with_buf_size(mut self, buf_size: usize) -> Self {
        self.buf_size = buf_size;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The decoder constructor rejected the stream. Distinguished from
    /// plain I/O so callers can tell "not this codec" from "bad data
    /// later on".
    #[error("failed to construct decoder: {0}")]
    GetReader(#[source] io::Error),
}

/// An owned composite stream: the decoder stacked on a buffered view of
/// the file. Dropping the chain releases the decoder and then the file.
pub struct CodecChain {
    reader: Box<dyn Read>,
    kind: CompressionKind,
}

impl CodecChain {
    pub fn kind(&self) -> CompressionKind {
        self.kind
    }

    pub fn is_compressed(&self) -> bool {
        self.kind != CompressionKind::None
    }
}

impl Read for CodecChain {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Classify the file and build its decode chain.
pub fn open(path: &Path, options: &CodecOptions) -> Result<CodecChain, CodecError> {
    let extension = path.extension().and_then(|ext| ext.to_str());
    // A failed sniff (unreadable or empty file) falls back to the
    // extension rules inside detect().
    let magic = sniff_magic(path, options).unwrap_or_default();
    let kind = detect(&magic, extension);
    debug!(%kind, path = %path.display(), "selected decoder");

    let file = open_at(path, options)?;
    let buffered = BufReader::with_capacity(options.buf_size, file);
    let reader = build_decoder(kind, buffered).map_err(CodecError::GetReader)?;
    Ok(CodecChain { reader, kind })
}

fn open_at(path: &Path, options: &CodecOptions) -> io::Result<File> {
    let mut file = File::open(path)?;
    if options.skip_bytes > 0 {
        file.seek(SeekFrom::Start(options.skip_bytes))?;
    }
    Ok(file)
}

fn sniff_magic(path: &Path, options: &CodecOptions) -> io::Result<Vec<u8>> {
    let mut file = open_at(path, options)?;
    let mut buf = [0u8; MAX_MAGIC_BYTES];
    let n = file.read(&mut buf)?;
    Ok(buf[..n].to_vec())
}

fn build_decoder(
    kind: CompressionKind,
    buffered: BufReader<File>,
) -> io::Result<Box<dyn Read>> {
    Ok(match kind {
        CompressionKind::Bzip2 => Box::new(BzDecoder::new(buffered)),
        CompressionKind::Gzip => Box::new(MultiGzDecoder::new(buffered)),
        CompressionKind::Xz => Box::new(XzDecoder::new(buffered)),
        CompressionKind::Lzma => {
            let stream = Stream::new_lzma_decoder(u64::MAX).map_err(io::Error::other)?;
            Box::new(XzDecoder::new_stream(buffered, stream))
        }
        CompressionKind::Zstd => Box::new(zstd::stream::read::Decoder::new(buffered)?),
        CompressionKind::Lzip => Box::new(LzipDecoder::new(buffered)?),
        CompressionKind::Lzw => Box::new(LzwReader::new(buffered)),
        CompressionKind::Deflate => Box::new(DeflateDecoder::new(buffered)),
        CompressionKind::Zlib => Box::new(ZlibDecoder::new(buffered)),
        CompressionKind::None => Box::new(buffered),
    })
}
