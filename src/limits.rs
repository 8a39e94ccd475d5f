//! Decompression-bomb defense: a shared byte budget for one archive.
//!
//! Every entry reader handed to a handler is routed through a
//! [`LimitAggregatingReader`] built from the archive's single
//! [`LimitProvider`], so the budget applies to the *sum* of bytes
//! delivered across all entries, not to any single entry. This catches
//! high-ratio archives regardless of how the payload is spread over
//! entries.

use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Leaf error carried inside the `io::Error` returned once the aggregate
/// budget is exhausted. Detect it with
/// [`ExtractError::is_compress_limit_reached`](crate::ExtractError::is_compress_limit_reached).
#[derive(Debug, thiserror::Error)]
#[error("decompressed byte limit of {limit} bytes reached")]
pub struct CompressLimitReached {
    pub limit: u64,
}

/// Single-use factory for [`LimitAggregatingReader`] wrappers sharing one
/// aggregate counter. `limit: None` disables the trip wire; the counter
/// still advances.
#[derive(Debug, Clone)]
pub struct LimitProvider {
    limit: Option<u64>,
    aggregate: Arc<AtomicU64>,
}

impl LimitProvider {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            limit,
            aggregate: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Budget for one archive: `max_compress_ratio * compressed_size`,
    /// unbounded when the ratio is zero.
    pub fn for_ratio(max_compress_ratio: u64, compressed_size: u64) -> Self {
        let limit = match max_compress_ratio {
            0 => None,
            ratio => Some(ratio.saturating_mul(compressed_size)),
        };
        Self::new(limit)
    }

    /// Wrap a byte source so its reads draw down the shared budget.
    pub fn wrap<R: Read>(&self, inner: R) -> LimitAggregatingReader<R> {
        LimitAggregatingReader {
            inner,
            limit: self.limit,
            aggregate: Arc::clone(&self.aggregate),
        }
    }

    /// Total bytes delivered so far through all wrappers of this provider.
    pub fn aggregate(&self) -> u64 {
        self.aggregate.load(Ordering::Relaxed)
    }
}

/// A `Read` wrapper charging delivered bytes against the provider-shared
/// aggregate. Once the aggregate exceeds the limit, this and every sibling
/// wrapper fail all subsequent reads, end-of-input included.
pub struct LimitAggregatingReader<R> {
    inner: R,
    limit: Option<u64>,
    aggregate: Arc<AtomicU64>,
}

impl<R: Read> Read for LimitAggregatingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        let total = self.aggregate.fetch_add(n as u64, Ordering::Relaxed) + n as u64;
        if let Some(limit) = self.limit {
            if total > limit {
                return Err(io::Error::other(CompressLimitReached { limit }));
            }
        }
        Ok(n)
    }
}
