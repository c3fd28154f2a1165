//! Codec error taxonomy
//!
//! The codec never retries or repairs a stream: every failure is surfaced to
//! the caller with enough context (bytes consumed, last good timestamp) for a
//! precise diagnostic, and no partial trace is ever returned on an error path.

use thiserror::Error;

/// Errors surfaced by the RLE capture codec
#[derive(Debug, Error)]
pub enum CodecError {
    /// Enabled-channel mask selects no channel groups
    #[error("channel mask 0x{mask:08x} enables no channel groups")]
    Configuration { mask: u32 },

    /// Stream ended mid-word or with a dangling run count
    ///
    /// A short read exactly at a word boundary is normal end-of-capture and
    /// never produces this error.
    #[error(
        "capture stream corrupt: truncated mid-word after {bytes_consumed} bytes \
         (last complete transition at sample {last_timestamp})"
    )]
    CorruptStream {
        bytes_consumed: u64,
        last_timestamp: u64,
    },

    /// A RUN word appeared before any SAMPLE word established a level
    #[error("protocol violation: run-length word at byte {bytes_consumed} precedes any sample word")]
    Protocol { bytes_consumed: u64 },

    /// Cooperative cancellation observed between words
    ///
    /// Distinct from corruption so callers can tell user-cancel from device
    /// failure.
    #[error(
        "capture cancelled after {bytes_consumed} bytes \
         (last complete transition at sample {last_timestamp})"
    )]
    Cancelled {
        bytes_consumed: u64,
        last_timestamp: u64,
    },

    /// I/O error from the byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// True when the error is a cooperative cancellation, not a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Result type alias using CodecError
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_message() {
        let err = CodecError::Configuration { mask: 0 };
        assert!(err.to_string().contains("0x00000000"));
        assert!(err.to_string().contains("no channel groups"));
    }

    #[test]
    fn test_corrupt_stream_carries_context() {
        let err = CodecError::CorruptStream {
            bytes_consumed: 17,
            last_timestamp: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("17"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_is_cancelled() {
        let cancelled = CodecError::Cancelled {
            bytes_consumed: 0,
            last_timestamp: 0,
        };
        assert!(cancelled.is_cancelled());
        assert!(!CodecError::Protocol { bytes_consumed: 1 }.is_cancelled());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "port closed");
        let err: CodecError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }
}
