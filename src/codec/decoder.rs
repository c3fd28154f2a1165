//! RLE decoder: classified words -> transition records
//!
//! The wire format represents a waveform as "level begins here" events: a
//! SAMPLE word establishes a new level at the current cursor, and RUN words
//! are pure timing deltas applied to the level established by the last SAMPLE
//! word. Any number of RUN words may follow one SAMPLE word (the hardware
//! splits counts that exceed the encodable width); their durations sum
//! without producing duplicate transition records.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use super::framer::{FrameError, Word, WordFramer};
use super::trace::{Trace, TransitionRecord};
use super::{ChannelLayout, CodecError};

/// Single-pass RLE stream decoder
///
/// Holds only the session-fixed channel layout and an optional sample budget;
/// each [`decode`](Self::decode) call owns its own framer state and output
/// buffer, so concurrent captures need nothing beyond independent sources.
#[derive(Debug, Clone, Copy)]
pub struct RleDecoder {
    layout: ChannelLayout,
    sample_budget: Option<u64>,
}

impl RleDecoder {
    /// Create a decoder for the given channel layout
    pub fn new(layout: ChannelLayout) -> Self {
        Self {
            layout,
            sample_budget: None,
        }
    }

    /// Stop decoding once the cursor reaches `budget` samples
    ///
    /// Records at or beyond the budget are discarded, never truncated
    /// mid-record. Budget exhaustion is normal termination, not an error.
    pub fn with_sample_budget(mut self, budget: u64) -> Self {
        self.sample_budget = Some(budget);
        self
    }

    /// Channel layout this decoder was built with
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Decode a byte stream into a trace
    ///
    /// Blocking, single forward pass, O(number of words). The cancellation
    /// flag is checked between words, never mid-word; on cancellation the
    /// call fails with [`CodecError::Cancelled`] instead of returning a
    /// partial trace. All-or-nothing: no trace is returned on any error path.
    pub fn decode<R: Read>(&self, source: R, cancel: &AtomicBool) -> Result<Trace, CodecError> {
        let mut framer = WordFramer::new(source, self.layout.sample_width());
        let mut records: Vec<TransitionRecord> = Vec::new();
        let mut last_value: Option<u32> = None;
        let mut cursor: u64 = 0;

        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(CodecError::Cancelled {
                    bytes_consumed: framer.bytes_consumed(),
                    last_timestamp: cursor,
                });
            }

            let word = match framer.next() {
                None => break,
                Some(Ok(word)) => word,
                Some(Err(FrameError::Truncated { bytes_consumed })) => {
                    return Err(CodecError::CorruptStream {
                        bytes_consumed,
                        last_timestamp: cursor,
                    });
                }
                Some(Err(FrameError::Io(e))) => return Err(CodecError::Io(e)),
            };

            match word {
                Word::Sample(packed) => {
                    if self.budget_reached(cursor) {
                        break;
                    }
                    let value = self.layout.unpack(packed);
                    records.push(TransitionRecord {
                        value,
                        timestamp: cursor,
                    });
                    last_value = Some(value);
                }
                Word::Run(stored) => {
                    // A run with no preceding sample has no level to extend
                    if last_value.is_none() {
                        return Err(CodecError::Protocol {
                            bytes_consumed: framer.bytes_consumed(),
                        });
                    }
                    // Stored count is duration minus one
                    cursor += u64::from(stored) + 1;
                    if self.budget_reached(cursor) {
                        break;
                    }
                }
            }
        }

        Ok(Trace::from_records(records))
    }

    /// Decode an in-memory stream, without cancellation
    ///
    /// Convenience wrapper used by tests and offline dump replay.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<Trace, CodecError> {
        self.decode(bytes, &AtomicBool::new(false))
    }

    fn budget_reached(&self, cursor: u64) -> bool {
        matches!(self.sample_budget, Some(budget) if cursor >= budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encoder::{PulseWaveform, RleEncoder};

    fn decoder(mask: u32) -> RleDecoder {
        RleDecoder::new(ChannelLayout::from_mask(mask).unwrap())
    }

    #[test]
    fn test_single_sample_word_decodes_to_one_record() {
        let trace = decoder(0xFF).decode_bytes(&[0x55]).unwrap();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.values(), &[0x55]);
        assert_eq!(trace.timestamps(), &[0]);
    }

    #[test]
    fn test_empty_stream_decodes_to_empty_trace() {
        let trace = decoder(0xFF).decode_bytes(&[]).unwrap();
        assert!(trace.is_empty());
    }

    #[test]
    fn test_run_payload_zero_is_duration_one() {
        // sample 0x10, run stored 0 (duration 1), sample 0x20
        let trace = decoder(0xFF).decode_bytes(&[0x10, 0x80, 0x20]).unwrap();
        assert_eq!(trace.values(), &[0x10, 0x20]);
        assert_eq!(trace.timestamps(), &[0, 1]);
    }

    #[test]
    fn test_run_does_not_emit_a_record() {
        let trace = decoder(0xFF).decode_bytes(&[0x10, 0x85]).unwrap();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.timestamps(), &[0]);
    }

    #[test]
    fn test_consecutive_runs_sum_durations() {
        // sample, run(duration 128), run(duration 6), sample
        let trace = decoder(0xFF)
            .decode_bytes(&[0x10, 0xFF, 0x85, 0x20])
            .unwrap();
        assert_eq!(trace.values(), &[0x10, 0x20]);
        assert_eq!(trace.timestamps(), &[0, 128 + 6]);
    }

    #[test]
    fn test_leading_run_is_protocol_error() {
        let err = decoder(0xFF).decode_bytes(&[0x83, 0x10]).unwrap_err();
        match err {
            CodecError::Protocol { bytes_consumed } => assert_eq!(bytes_consumed, 1),
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_mid_word_truncation_is_corrupt_stream() {
        // width 2, second word cut short after its first byte
        let err = decoder(0xFFFF)
            .decode_bytes(&[0x10, 0x00, 0x22])
            .unwrap_err();
        match err {
            CodecError::CorruptStream {
                bytes_consumed,
                last_timestamp,
            } => {
                assert_eq!(bytes_consumed, 3);
                assert_eq!(last_timestamp, 0);
            }
            other => panic!("expected corrupt stream, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamps_non_decreasing_and_start_at_zero() {
        let bytes = [0x01u8, 0x80, 0x02, 0x82, 0x03, 0x80, 0x80, 0x04];
        let trace = decoder(0xFF).decode_bytes(&bytes).unwrap();
        assert_eq!(trace.timestamps()[0], 0);
        for pair in trace.timestamps().windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_decoding_is_idempotent() {
        let bytes = [0x2Au8, 0x82, 0x55, 0x81, 0x2A, 0x80];
        let dec = decoder(0xFF);
        let first = dec.decode_bytes(&bytes).unwrap();
        let second = dec.decode_bytes(&bytes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sample_budget_discards_trailing_records() {
        // transitions at 0, 10, 20; budget 15 keeps the first two
        let bytes = [0x01u8, 0x89, 0x02, 0x89, 0x03];
        let dec = decoder(0xFF).with_sample_budget(15);
        let trace = dec.decode_bytes(&bytes).unwrap();
        assert_eq!(trace.values(), &[0x01, 0x02]);
        assert_eq!(trace.timestamps(), &[0, 10]);
    }

    #[test]
    fn test_sample_budget_zero_yields_empty_trace() {
        let dec = decoder(0xFF).with_sample_budget(0);
        let trace = dec.decode_bytes(&[0x01, 0x80, 0x02]).unwrap();
        assert!(trace.is_empty());
    }

    #[test]
    fn test_cancellation_between_words() {
        let cancel = AtomicBool::new(true);
        let err = decoder(0xFF)
            .decode(&[0x01u8, 0x80][..], &cancel)
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_sample_value_masked_to_enabled_channels() {
        // only channels 0..3 enabled; upper nibble of the byte is dropped
        let trace = decoder(0x0F).decode_bytes(&[0x7A]).unwrap();
        assert_eq!(trace.values(), &[0x0A]);
    }

    #[test]
    fn test_packed_groups_unpacked_to_channel_positions() {
        // groups 0 and 2 enabled: 2-byte words scatter to bytes 0 and 2
        let bytes = [0x34u8, 0x12, 0x01, 0x80, 0x78, 0x56];
        let trace = decoder(0x00FF_00FF).decode_bytes(&bytes).unwrap();
        assert_eq!(trace.values(), &[0x0012_0034, 0x0056_0078]);
        assert_eq!(trace.timestamps(), &[0, 2]);
    }

    /// Pulse-train round trip against the reference encoder, over the full
    /// grid of channel layouts the hardware supports.
    #[test]
    fn test_pulse_train_round_trip_grid() {
        const PADDING: u32 = 3;
        const PWM_RATIO: f64 = 0.74;
        const SAMPLE_COUNT: u32 = 4096;

        let masks = [
            0x0000_00FFu32,
            0x0000_FF00,
            0x00FF_0000,
            0xFF00_0000,
            0x0000_FFFF,
            0x00FF_FF00,
            0xFFFF_0000,
            0x00FF_00FF,
            0xFF00_FF00,
            0xFF00_00FF,
            0xFFFF_FF00,
            0xFFFF_00FF,
            0xFF00_FFFF,
            0x00FF_FFFF,
            0xFFFF_FFFF,
        ];

        for mask in masks {
            let layout = ChannelLayout::from_mask(mask).unwrap();
            let width_bits = 8 * layout.sample_width() as u32;

            // Same pulse construction as the hardware reference fixture
            let pulse_width = (1u64 << (width_bits - 1)) - 1;
            let high_time = (PWM_RATIO * pulse_width as f64) as u32;
            let low_time = pulse_width as u32 - high_time;

            let high_value = 0x5555_5555u32 & mask;
            let low_value = (high_value >> 1) & mask;

            let wave = PulseWaveform {
                high_value,
                low_value,
                high_time,
                low_time,
                padding: PADDING,
            };

            let bytes = RleEncoder::new(layout).encode_pulse_train(&wave, SAMPLE_COUNT);
            let trace = RleDecoder::new(layout).decode_bytes(&bytes).unwrap();

            assert_eq!(
                trace.len() as u32,
                SAMPLE_COUNT / 2 + 1,
                "record count, mask 0x{:08x}",
                mask
            );

            let mut expected_timestamp = 0u64;
            for (i, record) in trace.iter().enumerate() {
                let high = i % 2 != 0;
                let expected_value = if high { high_value } else { low_value };
                assert_eq!(record.value, expected_value, "value {} mask 0x{:08x}", i, mask);
                assert_eq!(
                    record.timestamp, expected_timestamp,
                    "timestamp {} mask 0x{:08x}",
                    i, mask
                );

                expected_timestamp += if i == 0 {
                    u64::from(PADDING)
                } else if high {
                    u64::from(high_time)
                } else {
                    u64::from(low_time)
                };
            }
        }
    }
}
