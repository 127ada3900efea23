//! zlib-stream reassembly
//!
//! With `compress=zlib-stream` the whole connection is one zlib stream. Each logical
//! frame ends with a sync flush (`00 00 FF FF`) but may arrive split over several
//! socket messages. The inflate context is never reset between frames: later frames
//! back-reference the dictionary built by earlier ones.

use flate2::{Decompress, FlushDecompress, Status};
use thiserror::Error;

/// Trailer of a sync-flushed zlib block
pub const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

const OUTPUT_CHUNK: usize = 16 * 1024;

#[derive(Debug, Error)]
pub enum InflateError {
    #[error("zlib stream corrupted: {0}")]
    Corrupt(#[from] flate2::DecompressError),

    #[error("zlib stream made no progress with {pending} bytes pending")]
    Stalled { pending: usize },
}

/// Per-connection zlib-stream decoder
pub struct Inflater {
    decompress: Decompress,
    buffer: Vec<u8>,
}

impl Inflater {
    pub fn new() -> Self {
        Self {
            decompress: Decompress::new(true),
            buffer: Vec::new(),
        }
    }

    /// Feed one socket message. Returns the inflated frame once the buffered
    /// bytes end with [`ZLIB_SUFFIX`], `None` while the frame is incomplete.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<Vec<u8>>, InflateError> {
        self.buffer.extend_from_slice(chunk);
        if !self.buffer.ends_with(&ZLIB_SUFFIX) {
            return Ok(None);
        }

        let result = self.inflate_buffer();
        self.buffer.clear();
        result.map(Some)
    }

    fn inflate_buffer(&mut self) -> Result<Vec<u8>, InflateError> {
        let mut output = Vec::with_capacity(self.buffer.len().saturating_mul(4).max(OUTPUT_CHUNK));
        let mut input = self.buffer.as_slice();

        loop {
            if output.len() == output.capacity() {
                output.reserve(OUTPUT_CHUNK);
            }
            let (in_before, out_before) = (self.decompress.total_in(), self.decompress.total_out());
            let status = self
                .decompress
                .decompress_vec(input, &mut output, FlushDecompress::Sync)?;
            let consumed = (self.decompress.total_in() - in_before) as usize;
            let produced = self.decompress.total_out() - out_before;
            input = &input[consumed..];

            if matches!(status, Status::StreamEnd) {
                break;
            }
            let has_room = output.len() < output.capacity();
            if input.is_empty() && has_room {
                break;
            }
            if consumed == 0 && produced == 0 && has_room {
                return Err(InflateError::Stalled {
                    pending: input.len(),
                });
            }
        }

        tracing::trace!(
            compressed = self.buffer.len(),
            inflated = output.len(),
            "Frame inflated"
        );
        Ok(output)
    }

    /// Bytes of an incomplete frame currently buffered
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Inflater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inflater")
            .field("pending", &self.buffer.len())
            .field("total_in", &self.decompress.total_in())
            .field("total_out", &self.decompress.total_out())
            .finish()
    }
}
