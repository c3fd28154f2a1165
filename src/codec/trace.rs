//! Decoded trace types
//!
//! A [`Trace`] is the only codec entity that outlives a decode pass. It is
//! assembled from the decoder's transition records and never mutated once
//! returned to the caller.

use serde::Serialize;

/// One entry in the reconstructed trace: a level beginning at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    /// Sample value, unpacked to full channel positions and masked to the
    /// enabled channels
    pub value: u32,
    /// Cumulative timestamp in samples since capture start
    pub timestamp: u64,
}

/// Immutable decoded capture result
///
/// Two parallel equal-length sequences: `values[i]` is the logic level that
/// begins at sample `timestamps[i]`. Timestamps are non-decreasing and the
/// first entry of a non-empty trace is at timestamp 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trace {
    values: Vec<u32>,
    timestamps: Vec<u64>,
}

impl Trace {
    /// Assemble a trace from an ordered record sequence
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = TransitionRecord>,
    {
        let mut values = Vec::new();
        let mut timestamps = Vec::new();
        for record in records {
            values.push(record.value);
            timestamps.push(record.timestamp);
        }
        Self { values, timestamps }
    }

    /// Sample values, parallel to [`timestamps`](Self::timestamps)
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Timestamps in samples, parallel to [`values`](Self::values)
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    /// Number of transition records
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the trace holds no records
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Record at index `i`, if present
    pub fn get(&self, i: usize) -> Option<TransitionRecord> {
        Some(TransitionRecord {
            value: *self.values.get(i)?,
            timestamp: self.timestamps[i],
        })
    }

    /// Iterate over the records in order
    pub fn iter(&self) -> impl Iterator<Item = TransitionRecord> + '_ {
        self.values
            .iter()
            .zip(self.timestamps.iter())
            .map(|(&value, &timestamp)| TransitionRecord { value, timestamp })
    }
}
