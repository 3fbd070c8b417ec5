//! Error types for the core crate.
//!
//! Only configuration problems are fatal. Per-word conditions found while
//! decoding (bad parity, missing stop bits) are reported as flags on the
//! decoded records, never as errors, so a noisy capture still decodes end
//! to end.

use thiserror::Error;

/// Configuration error, reported before any decoding or encoding starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Word width outside the supported 5..=16 bit range
    #[error("word width {0} out of range (5-16 bits per transfer)")]
    WordWidth(u8),

    /// Sample rate of zero
    #[error("sample rate must be positive")]
    ZeroSampleRate,

    /// Baud rate of zero
    #[error("baud rate must be positive")]
    ZeroBaudRate,

    /// Fewer than one sample per bit period
    #[error("baud rate {baud_rate} too high for sample rate {sample_rate} (needs at least one sample per bit)")]
    BaudTooHigh {
        /// Capture sample rate in samples per second
        sample_rate: u64,
        /// Requested baud rate
        baud_rate: u64,
    },
}
