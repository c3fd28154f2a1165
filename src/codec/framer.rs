//! Word framing for the RLE capture stream
//!
//! Turns a raw byte source into a lazy, finite sequence of fixed-width
//! little-endian words, each classified as a literal SAMPLE word or a
//! RUN-COUNT word via the top bit of the word's final byte. Single forward
//! pass, no byte reuse, not restartable.

use std::io::Read;

use thiserror::Error;

/// Framing errors, mapped by the decoder into the codec taxonomy
#[derive(Debug, Error)]
pub enum FrameError {
    /// Byte source ended between word boundaries
    ///
    /// End-of-stream exactly at a word boundary is signalled by iterator
    /// exhaustion instead; only a partial word produces this error.
    #[error("byte stream ended mid-word after {bytes_consumed} bytes")]
    Truncated { bytes_consumed: u64 },

    /// Read error from the byte source
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

/// One classified framing unit from the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    /// Literal packed sample value (RUN flag clear)
    Sample(u32),
    /// Stored run count, flag bit already masked off (actual duration = count + 1)
    Run(u32),
}

/// Lazy word framer over a byte source
///
/// Words are `width` bytes long, assembled little-endian
/// (`word = sum(byte[i] << 8i)`). Bytes are consumed in strict order.
pub struct WordFramer<R> {
    source: R,
    width: usize,
    flag_mask: u32,
    bytes_consumed: u64,
}

impl<R: Read> WordFramer<R> {
    /// Create a framer producing `width`-byte words (width in 1..=4)
    pub fn new(source: R, width: usize) -> Self {
        debug_assert!((1..=4).contains(&width));
        Self {
            source,
            width,
            flag_mask: 0x80 << (8 * (width - 1)),
            bytes_consumed: 0,
        }
    }

    /// Total bytes consumed from the source so far
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    /// Read exactly one word's worth of bytes
    ///
    /// Returns `Ok(None)` on a clean end-of-stream at the word boundary.
    fn fill_word(&mut self) -> Result<Option<u32>, FrameError> {
        let mut buf = [0u8; 4];
        let mut filled = 0usize;

        while filled < self.width {
            match self.source.read(&mut buf[filled..self.width]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.bytes_consumed += n as u64;
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FrameError::Io(e)),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < self.width {
            return Err(FrameError::Truncated {
                bytes_consumed: self.bytes_consumed,
            });
        }

        let mut word = 0u32;
        for (i, &byte) in buf[..self.width].iter().enumerate() {
            word |= u32::from(byte) << (8 * i);
        }
        Ok(Some(word))
    }
}

impl<R: Read> Iterator for WordFramer<R> {
    type Item = Result<Word, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.fill_word() {
            Ok(None) => None,
            Ok(Some(word)) => {
                let classified = if word & self.flag_mask != 0 {
                    Word::Run(word & !self.flag_mask)
                } else {
                    Word::Sample(word)
                };
                Some(Ok(classified))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
