//! Streaming `Read` adapter over the `weezl` LZW decoder.

use std::io::{self, BufRead, Read};

use weezl::decode::Decoder;
use weezl::{BitOrder, LzwStatus};

const LITERAL_WIDTH: u8 = 8;

pub struct LzwReader<R> {
    inner: R,
    decoder: Decoder,
    done: bool,
}

impl<R: BufRead> LzwReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            decoder: Decoder::new(BitOrder::Lsb, LITERAL_WIDTH),
            done: false,
        }
    }
}

impl<R: BufRead> Read for LzwReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.done {
            return Ok(0);
        }
        loop {
            let input = self.inner.fill_buf()?;
            let result = self.decoder.decode_bytes(input, buf);
            let consumed_in = result.consumed_in;
            self.inner.consume(consumed_in);
            match result.status {
                Ok(LzwStatus::Ok) => {
                    if result.consumed_out > 0 {
                        return Ok(result.consumed_out);
                    }
                    // Header or partial code consumed without output yet.
                }
                Ok(LzwStatus::Done) => {
                    self.done = true;
                    return Ok(result.consumed_out);
                }
                Ok(LzwStatus::NoProgress) => {
                    // Input exhausted without an explicit end code.
                    self.done = true;
                    return Ok(result.consumed_out);
                }
                Err(err) => {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
                }
            }
        }
    }
}
