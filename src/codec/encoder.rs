//! Reference RLE encoder
//!
//! Produces conformant capture streams from a simple alternating high/low
//! pulse description. This is the algebraic inverse of the decoder for such
//! waveforms and exists to generate deterministic fixtures: it models the
//! stream a device emits for a PWM-style test signal, including a known
//! startup padding run before the first pulse.

use std::io::{self, Write};

use super::ChannelLayout;

/// Alternating pulse-train description
#[derive(Debug, Clone, Copy)]
pub struct PulseWaveform {
    /// Sample value while the pulse is high
    pub high_value: u32,
    /// Sample value while the pulse is low
    pub low_value: u32,
    /// High duration in samples (>= 1)
    pub high_time: u32,
    /// Low duration in samples (>= 1)
    pub low_time: u32,
    /// Startup offset in samples before the first pulse (>= 1)
    pub padding: u32,
}

/// Encoder producing packed RLE words for one channel layout
#[derive(Debug, Clone, Copy)]
pub struct RleEncoder {
    layout: ChannelLayout,
}

impl RleEncoder {
    /// Create an encoder for the given channel layout
    pub fn new(layout: ChannelLayout) -> Self {
        Self { layout }
    }

    /// Write a pulse train of `sample_count / 2` pulses
    ///
    /// Emits one leading low-level SAMPLE word and a RUN word covering the
    /// startup padding, then alternates SAMPLE (high first) and RUN words,
    /// one pair per pulse, each RUN storing `duration - 1`.
    pub fn write_pulse_train<W: Write>(
        &self,
        out: &mut W,
        wave: &PulseWaveform,
        sample_count: u32,
    ) -> io::Result<()> {
        debug_assert!(wave.high_time >= 1 && wave.low_time >= 1 && wave.padding >= 1);

        self.write_sample(out, wave.low_value)?;
        self.write_run(out, wave.padding - 1)?;

        for i in 0..sample_count / 2 {
            let high = i % 2 == 0;
            let value = if high { wave.high_value } else { wave.low_value };
            let duration = if high { wave.high_time } else { wave.low_time };

            self.write_sample(out, value)?;
            self.write_run(out, duration - 1)?;
        }

        out.flush()
    }

    /// Encode a pulse train into an in-memory stream
    pub fn encode_pulse_train(&self, wave: &PulseWaveform, sample_count: u32) -> Vec<u8> {
        let width = self.layout.sample_width();
        let mut bytes = Vec::with_capacity((sample_count as usize + 2) * width);
        self.write_pulse_train(&mut bytes, wave, sample_count)
            .expect("in-memory writes are infallible");
        bytes
    }

    /// Write one SAMPLE word: the packed value, little-endian
    pub fn write_sample<W: Write>(&self, out: &mut W, value: u32) -> io::Result<()> {
        self.write_word(out, self.layout.pack(value))
    }

    /// Write one RUN word: the stored count with the flag bit set
    ///
    /// `stored` is duration minus one and must leave the flag bit clear.
    pub fn write_run<W: Write>(&self, out: &mut W, stored: u32) -> io::Result<()> {
        debug_assert_eq!(stored & self.layout.run_flag_mask(), 0);
        self.write_word(out, stored | self.layout.run_flag_mask())
    }

    fn write_word<W: Write>(&self, out: &mut W, word: u32) -> io::Result<()> {
        let bytes = word.to_le_bytes();
        out.write_all(&bytes[..self.layout.sample_width()])
    }
}
