//! Lzip member framing over a raw LZMA1 decoder.
//!
//! An lzip member is a 6-byte header (magic, version, coded dictionary
//! size) followed by an LZMA1 stream with fixed literal/position settings
//! and an explicit end-of-stream marker. The header is parsed here; the
//! payload is handed to liblzma as a raw filter chain. The 20-byte member
//! footer after the end marker is never read.

use std::io::{self, Read};

use liblzma::read::XzDecoder;
use liblzma::stream::{Filters, LzmaOptions, Stream};

const LZIP_MAGIC: [u8; 4] = *b"LZIP";
const LZIP_VERSION: u8 = 1;

// Valid range for the coded dictionary size exponent.
const MIN_DICT_BITS: u8 = 12;
const MAX_DICT_BITS: u8 = 29;

pub struct LzipDecoder<R: Read> {
    inner: XzDecoder<R>,
}

impl<R: Read> std::fmt::Debug for LzipDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LzipDecoder").finish_non_exhaustive()
    }
}

impl<R: Read> LzipDecoder<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let mut header = [0u8; 6];
        inner.read_exact(&mut header)?;
        if header[..4] != LZIP_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "missing lzip magic",
            ));
        }
        if header[4] != LZIP_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported lzip version {}", header[4]),
            ));
        }
        let dict_size = decode_dict_size(header[5])?;

        let mut options = LzmaOptions::new_preset(6).map_err(io::Error::other)?;
        options
            .dict_size(dict_size)
            .literal_context_bits(3)
            .literal_position_bits(0)
            .position_bits(2);
        let mut filters = Filters::new();
        filters.lzma1(&options);
        let stream = Stream::new_raw_decoder(&filters).map_err(io::Error::other)?;
        Ok(Self {
            inner: XzDecoder::new_stream(inner, stream),
        })
    }
}

/// Bits 4..0 hold the base-two log of the base size, bits 7..5 a fraction
/// of the base to subtract in sixteenths.
fn decode_dict_size(coded: u8) -> io::Result<u32> {
    let bits = coded & 0x1F;
    if !(MIN_DICT_BITS..=MAX_DICT_BITS).contains(&bits) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid lzip dictionary size byte {coded:#04x}"),
        ));
    }
    let base = 1u32 << bits;
    let fraction = u32::from(coded >> 5);
    Ok(base - fraction * (base / 16))
}

impl<R: Read> Read for LzipDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
