//! Fixture builders and handlers shared by the test suite.

use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

use filetime::FileTime;
use tar::{EntryType, Header};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime};

use crate::errors::ExtractError;
use crate::header::{ArchiveHeader, EntryHandler};

/// The timestamp written into zip fixtures: 2018-08-13 08:11:08 UTC.
pub const ZIP_FIXTURE_MTIME: i64 = 1534147868;

pub fn gzip_data(data: impl AsRef<[u8]>) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data.as_ref()).unwrap();
    encoder.finish().unwrap()
}

pub fn deflate_data(data: impl AsRef<[u8]>) -> Vec<u8> {
    let mut encoder =
        flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data.as_ref()).unwrap();
    encoder.finish().unwrap()
}

pub fn zlib_data(data: impl AsRef<[u8]>) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data.as_ref()).unwrap();
    encoder.finish().unwrap()
}

pub fn bz2_data(data: impl AsRef<[u8]>) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), Default::default());
    encoder.write_all(data.as_ref()).unwrap();
    encoder.finish().unwrap()
}

pub fn xz_data(data: impl AsRef<[u8]>) -> Vec<u8> {
    let mut encoder = liblzma::write::XzEncoder::new(Vec::new(), 6);
    encoder.write_all(data.as_ref()).unwrap();
    encoder.finish().unwrap()
}

pub fn lzma_data(data: impl AsRef<[u8]>) -> Vec<u8> {
    let options = liblzma::stream::LzmaOptions::new_preset(6).unwrap();
    let stream = liblzma::stream::Stream::new_lzma_encoder(&options).unwrap();
    let mut encoder = liblzma::write::XzEncoder::new_stream(Vec::new(), stream);
    encoder.write_all(data.as_ref()).unwrap();
    encoder.finish().unwrap()
}

/// A single well-formed lzip member. The LZMA1 payload is the alone
/// encoding minus its 13-byte header (properties, dictionary size,
/// unknown-length field); with the length unknown the encoder terminates
/// the stream with an end marker, exactly as lzip requires.
pub fn lzip_data(data: impl AsRef<[u8]>) -> Vec<u8> {
    let data = data.as_ref();
    let alone = lzma_data(data);
    let mut member = Vec::with_capacity(alone.len() + 13);
    member.extend_from_slice(b"LZIP");
    member.push(1);
    member.push(23); // dictionary size 1 << 23, the preset-6 default
    member.extend_from_slice(&alone[13..]);
    member.extend_from_slice(&crc32(data).to_le_bytes());
    member.extend_from_slice(&(data.len() as u64).to_le_bytes());
    member.extend_from_slice(&((member.len() + 8) as u64).to_le_bytes());
    member
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

pub fn zstd_data(data: impl AsRef<[u8]>) -> Vec<u8> {
    zstd::encode_all(data.as_ref(), 0).unwrap()
}

pub fn lzw_data(data: impl AsRef<[u8]>) -> Vec<u8> {
    weezl::encode::Encoder::new(weezl::BitOrder::Lsb, 8)
        .encode(data.as_ref())
        .unwrap()
}

/// A temporary directory of fixture files.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn write(&self, name: &str, data: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, data.as_ref()).unwrap();
        path
    }

    pub fn write_with_mtime(&self, name: &str, data: impl AsRef<[u8]>, mtime: i64) -> PathBuf {
        let path = self.write(name, data);
        filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
        path
    }
}

/// In-memory tar builder supporting the entry types the extractor cares
/// about.
pub struct TarFixture {
    builder: tar::Builder<Vec<u8>>,
}

impl TarFixture {
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    pub fn file(mut self, path: &str, data: impl AsRef<[u8]>, mtime: u64) -> Self {
        let data = data.as_ref();
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mtime(mtime);
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        self.builder
            .append_data(&mut header, path, &[][..])
            .unwrap();
        self
    }

    pub fn symlink(mut self, link: &str, target: &str) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        self.builder.append_link(&mut header, link, target).unwrap();
        self
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.builder.finish().unwrap();
        self.builder.into_inner().unwrap()
    }
}

fn zip_options(method: CompressionMethod) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(method)
        .last_modified_time(DateTime::from_date_and_time(2018, 8, 13, 8, 11, 8).unwrap())
}

pub fn zip_archive<S: AsRef<str>, D: AsRef<[u8]>>(
    files: impl IntoIterator<Item = (S, D)>,
) -> Vec<u8> {
    zip_archive_with(files, CompressionMethod::Deflated, &[])
}

pub fn zip_archive_with<S: AsRef<str>, D: AsRef<[u8]>>(
    files: impl IntoIterator<Item = (S, D)>,
    method: CompressionMethod,
    directories: &[&str],
) -> Vec<u8> {
    let mut writer = zip::write::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for dir in directories {
        writer.add_directory(*dir, zip_options(method)).unwrap();
    }
    for (path, data) in files {
        writer.start_file(path.as_ref(), zip_options(method)).unwrap();
        writer.write_all(data.as_ref()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// One surfaced entry, as observed by [`CaptureHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEntry {
    pub name: String,
    pub mod_time: i64,
    pub size: u64,
    pub is_folder: bool,
    pub content: Vec<u8>,
}

/// Records every invocation and drains each entry's reader.
#[derive(Debug, Default)]
pub struct CaptureHandler {
    pub entries: Vec<CapturedEntry>,
}

impl EntryHandler for CaptureHandler {
    fn on_entry(&mut self, header: &mut ArchiveHeader<'_>) -> Result<(), ExtractError> {
        let mut content = Vec::new();
        header.read_to_end(&mut content)?;
        self.entries.push(CapturedEntry {
            name: header.name.clone(),
            mod_time: header.mod_time,
            size: header.size,
            is_folder: header.is_folder,
            content,
        });
        Ok(())
    }
}

impl CaptureHandler {
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

/// Drains entry readers and totals the bytes delivered, keeping the count
/// accurate even when a read fails mid-entry.
#[derive(Debug, Default)]
pub struct ReadCountHandler {
    pub read: u64,
    pub invocations: usize,
}

impl EntryHandler for ReadCountHandler {
    fn on_entry(&mut self, header: &mut ArchiveHeader<'_>) -> Result<(), ExtractError> {
        self.invocations += 1;
        let mut buf = [0u8; 4096];
        loop {
            match header.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => self.read += n as u64,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Fails every invocation without touching the reader.
#[derive(Debug, Default)]
pub struct FailingHandler {
    pub invocations: usize,
}

impl EntryHandler for FailingHandler {
    fn on_entry(&mut self, _header: &mut ArchiveHeader<'_>) -> Result<(), ExtractError> {
        self.invocations += 1;
        Err(ExtractError::Io(std::io::Error::other("handler rejected entry")))
    }
}
