//! RLE capture codec for SUMP-class logic analyzers
//!
//! This module implements the wire-level codec that reconstructs a timed
//! digital-signal trace from the run-length-encoded byte stream the capture
//! hardware emits:
//! - Channel layout resolution (enabled-channel mask -> packed word width)
//! - Word framing (bytes -> classified SAMPLE / RUN words)
//! - RLE decoding (words -> transition records with cumulative timestamps)
//! - A reference encoder used to generate conformant fixture streams

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod framer;
pub mod trace;

// Re-exports
pub use decoder::RleDecoder;
pub use encoder::{PulseWaveform, RleEncoder};
pub use error::CodecError;
pub use framer::{FrameError, Word, WordFramer};
pub use trace::{Trace, TransitionRecord};

/// Number of 8-channel groups in the 32-bit channel mask
pub const GROUP_COUNT: usize = 4;

/// Resolved channel layout for one capture session
///
/// Derived once from the enabled-channel mask before decoding starts and
/// fixed for the whole session. The mask is partitioned into 4 groups of
/// 8 channels; the device transmits only the bytes of groups with at least
/// one enabled channel, packed into the low bytes of each word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    mask: u32,
    groups: [u8; GROUP_COUNT],
    width: u8,
}

impl ChannelLayout {
    /// Resolve the layout from an enabled-channel mask
    ///
    /// Group `g` covers channel bits `8g..8g+7`; a group is transmitted when
    /// any of its bits is set. An all-zero mask is a configuration error.
    pub fn from_mask(mask: u32) -> Result<Self, CodecError> {
        let mut groups = [0u8; GROUP_COUNT];
        let mut width = 0usize;

        for group in 0..GROUP_COUNT {
            if (mask >> (8 * group)) & 0xFF != 0 {
                groups[width] = group as u8;
                width += 1;
            }
        }

        if width == 0 {
            return Err(CodecError::Configuration { mask });
        }

        Ok(Self {
            mask,
            groups,
            width: width as u8,
        })
    }

    /// Enabled-channel mask this layout was resolved from
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Packed word width in bytes (1..=4, one byte per enabled group)
    pub fn sample_width(&self) -> usize {
        self.width as usize
    }

    /// Indices of the transmitted groups, in ascending order
    pub fn enabled_groups(&self) -> &[u8] {
        &self.groups[..self.width as usize]
    }

    /// RUN flag bit: top bit of the final byte of a packed word
    pub fn run_flag_mask(&self) -> u32 {
        0x80 << (8 * (self.width as usize - 1))
    }

    /// Expand a packed sample word into a 32-bit sample value
    ///
    /// Byte `i` of the packed word is the byte of the i-th enabled group.
    pub fn unpack(&self, packed: u32) -> u32 {
        let mut value = 0u32;
        for (i, &group) in self.enabled_groups().iter().enumerate() {
            value |= ((packed >> (8 * i)) & 0xFF) << (8 * group as usize);
        }
        value & self.mask
    }

    /// Pack a 32-bit sample value into its on-wire form
    ///
    /// Inverse of [`unpack`](Self::unpack): gathers the bytes of the enabled
    /// groups into the low bytes of the word.
    pub fn pack(&self, value: u32) -> u32 {
        let masked = value & self.mask;
        let mut packed = 0u32;
        for (i, &group) in self.enabled_groups().iter().enumerate() {
            packed |= ((masked >> (8 * group as usize)) & 0xFF) << (8 * i);
        }
        packed
    }
}
