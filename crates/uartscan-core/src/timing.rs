//! Sample-domain timing derived from the capture sample rate and the
//! configured baud rate.
//!
//! All decoder and encoder arithmetic is done in whole sample indices;
//! [`SampleClock`] is computed once per session and shared by both
//! directions.

use crate::config::{FrameConfig, StopBits};
use crate::error::ConfigError;

/// Timing constants for one decode/encode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleClock {
    sample_rate: u64,
    baud_rate: u64,
    samples_per_bit: u64,
    margin: u64,
}

impl SampleClock {
    /// Derive the timing constants, failing if the rates cannot yield at
    /// least one sample per bit period.
    pub fn new(sample_rate: u64, baud_rate: u64) -> Result<Self, ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }
        let samples_per_bit = sample_rate / baud_rate;
        if samples_per_bit < 1 {
            return Err(ConfigError::BaudTooHigh {
                sample_rate,
                baud_rate,
            });
        }
        Ok(SampleClock {
            sample_rate,
            baud_rate,
            samples_per_bit,
            // Inset between adjacent annotated spans. Cosmetic only:
            // never used in a sampling or cursor decision.
            margin: samples_per_bit / 20 + 1,
        })
    }

    /// Capture sample rate in samples per second.
    pub const fn sample_rate(&self) -> u64 {
        self.sample_rate
    }

    /// Configured baud rate.
    pub const fn baud_rate(&self) -> u64 {
        self.baud_rate
    }

    /// Duration of one bit period in samples.
    pub const fn samples_per_bit(&self) -> u64 {
        self.samples_per_bit
    }

    /// Cosmetic inset applied to the ends of annotated spans.
    pub const fn margin(&self) -> u64 {
        self.margin
    }

    /// Duration of the stop region in samples, from its half-bit count.
    pub const fn stop_samples(&self, stop_bits: StopBits) -> u64 {
        stop_bits.half_units() * self.samples_per_bit / 2
    }

    /// Total frame duration in samples for the given framing.
    pub fn frame_samples(&self, config: &FrameConfig) -> u64 {
        config.frame_half_bits() * self.samples_per_bit / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Parity;

    #[test]
    fn test_samples_per_bit() {
        let clock = SampleClock::new(96_000, 9_600).unwrap();
        assert_eq!(clock.samples_per_bit(), 10);

        // Truncating division
        let clock = SampleClock::new(1_000_000, 115_200).unwrap();
        assert_eq!(clock.samples_per_bit(), 8);
    }

    #[test]
    fn test_margin() {
        assert_eq!(SampleClock::new(96_000, 9_600).unwrap().margin(), 1);
        assert_eq!(SampleClock::new(400_000, 9_600).unwrap().margin(), 3);
    }

    #[test]
    fn test_rate_validation() {
        assert_eq!(
            SampleClock::new(0, 9_600),
            Err(ConfigError::ZeroSampleRate)
        );
        assert_eq!(SampleClock::new(96_000, 0), Err(ConfigError::ZeroBaudRate));
        assert_eq!(
            SampleClock::new(9_600, 96_000),
            Err(ConfigError::BaudTooHigh {
                sample_rate: 9_600,
                baud_rate: 96_000,
            })
        );
    }

    #[test]
    fn test_stop_samples() {
        let clock = SampleClock::new(96_000, 9_600).unwrap();
        assert_eq!(clock.stop_samples(StopBits::One), 10);
        assert_eq!(clock.stop_samples(StopBits::OneAndHalf), 15);
        assert_eq!(clock.stop_samples(StopBits::Two), 20);

        // Odd samples-per-bit truncates the half unit
        let clock = SampleClock::new(105_600, 9_600).unwrap();
        assert_eq!(clock.samples_per_bit(), 11);
        assert_eq!(clock.stop_samples(StopBits::OneAndHalf), 16);
    }

    #[test]
    fn test_frame_samples() {
        let clock = SampleClock::new(96_000, 9_600).unwrap();

        // 8N1: 10 bit periods
        assert_eq!(clock.frame_samples(&FrameConfig::default()), 100);

        // 8E2: 12 bit periods
        let config = FrameConfig::builder()
            .parity(Parity::Even)
            .stop_bits(StopBits::Two)
            .build()
            .unwrap();
        assert_eq!(clock.frame_samples(&config), 120);
    }
}
