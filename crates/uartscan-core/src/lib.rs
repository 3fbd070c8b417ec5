//! # UART Capture Framing Library
//!
//! This crate decodes raw sampled digital waveforms carrying
//! asynchronous serial (UART) traffic into framed words, and synthesizes
//! idealized UART waveforms from byte streams for testing.
//!
//! ## Overview
//!
//! The two directions are exact mirrors over the same framing
//! parameters:
//!
//! - **Decoding**: a resumable state machine walks a capture's level
//!   transitions and samples, recovering words with per-field parity and
//!   stop-bit checks
//! - **Encoding**: a synthesizer emits the level/duration run sequence
//!   for any word stream, suitable as decoder input
//!
//! Framing is configurable: 5-16 data bits, odd/even/no parity, 1/1.5/2
//! stop bits, LSB or MSB first, and three electrical inversion modes.
//!
//! ## Signal Flow
//!
//! ```text
//! Decode: capture (transitions + samples) → UartDecoder → spans + DecodedWords
//! Encode: words → UartEncoder → (level, duration) runs → capture / file
//! ```
//!
//! ## Example
//!
//! ```rust
//! use uartscan_core::{
//!     CaptureBuffer, FrameConfig, SampleClock, UartDecoder, UartEncoder, WordCollector,
//! };
//!
//! let config = FrameConfig::default(); // 8N1
//! let clock = SampleClock::new(96_000, 9_600).unwrap();
//!
//! // Synthesize a waveform into an in-memory capture...
//! let mut capture = CaptureBuffer::new(96_000);
//! let encoder = UartEncoder::new(config, clock);
//! encoder.encode_idle(&mut capture, 10);
//! encoder.encode_word(&mut capture, 0xAA);
//! encoder.encode_idle(&mut capture, 4);
//!
//! // ...and decode it back.
//! let mut decoder = UartDecoder::new(config, clock);
//! let mut words = WordCollector::new();
//! decoder.run(&mut capture, &mut words);
//! assert_eq!(words.values(), [0xAA]);
//! ```
//!
//! The decoder is incremental: it suspends when the capture runs out of
//! samples mid-frame and resumes exactly where it left off once more
//! samples are appended, which is how arbitrarily long captures are
//! processed without rescanning.

pub mod capture;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod render;
pub mod timing;

// Re-export main types
pub use capture::{BitSampler, CaptureBuffer, CaptureSource, Transition};
pub use config::{BitOrder, FrameConfig, FrameConfigBuilder, Inversion, Parity, StopBits};
pub use decoder::{
    DecodeSink, DecodeStatus, DecodedSpan, DecodedWord, SpanKind, UartDecoder, WordCollector,
};
pub use encoder::{LevelRun, RunSink, UartEncoder};
pub use error::ConfigError;
pub use render::{format_word, format_word_compact, WordFormat};
pub use timing::SampleClock;
