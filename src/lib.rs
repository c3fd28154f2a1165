//! SUMP-RS: RLE capture codec for SUMP-class logic analyzers
//!
//! This crate reconstructs timed digital-signal traces from the compressed
//! byte stream a capture device emits, and wraps the decode in a cancellable
//! capture task.

pub mod capture;
pub mod codec;
pub mod config;
