//! Framing configuration shared by the decoder and the encoder.
//!
//! A [`FrameConfig`] is an immutable, validated description of how words
//! are framed on the wire: bits per transfer, parity, stop length, bit
//! order, and electrical inversion. Both directions of the pipeline read
//! the same value, which is what makes encode-then-decode round-trips
//! hold.
//!
//! ## Levels
//!
//! All level handling derives from the inversion mode alone:
//!
//! | Inversion          | start | idle/stop | data '1' | data '0' |
//! |--------------------|-------|-----------|----------|----------|
//! | `Normal`           | low   | high      | high     | low      |
//! | `AllInverted`      | high  | low       | low      | high     |
//! | `DataOnlyInverted` | low   | high      | low      | high     |
//!
//! `DataOnlyInverted` (used by ISO 7816 style links) flips only the data
//! bit interpretation; start and stop keep the `Normal` convention.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest supported word width in bits.
pub const MIN_WORD_WIDTH: u8 = 5;
/// Highest supported word width in bits.
pub const MAX_WORD_WIDTH: u8 = 16;

/// Parity bit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Parity {
    /// No parity bit between data and stop bits
    #[default]
    None,
    /// Parity bit makes the total number of one-bits odd
    Odd,
    /// Parity bit makes the total number of one-bits even
    Even,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::None => write!(f, "none"),
            Parity::Odd => write!(f, "odd"),
            Parity::Even => write!(f, "even"),
        }
    }
}

/// Data bit transmission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitOrder {
    /// Least significant bit first (the common UART convention)
    #[default]
    LsbFirst,
    /// Most significant bit first
    MsbFirst,
}

impl fmt::Display for BitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitOrder::LsbFirst => write!(f, "LSB first"),
            BitOrder::MsbFirst => write!(f, "MSB first"),
        }
    }
}

/// Electrical inversion mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Inversion {
    /// Non-inverted logic: idle high, start low
    #[default]
    Normal,
    /// Whole signal inverted: idle low, start high
    AllInverted,
    /// Only the data bits inverted; start/stop keep the normal convention
    DataOnlyInverted,
}

impl fmt::Display for Inversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inversion::Normal => write!(f, "normal"),
            Inversion::AllInverted => write!(f, "all inverted"),
            Inversion::DataOnlyInverted => write!(f, "data inverted"),
        }
    }
}

/// Stop bit count, carried as an integer number of half-bit periods so the
/// fractional 1.5 setting never touches floating point in the frame walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StopBits {
    /// One stop bit
    #[default]
    One,
    /// One and a half stop bits
    OneAndHalf,
    /// Two stop bits
    Two,
}

impl StopBits {
    /// Stop length in half-bit units (2, 3 or 4).
    pub const fn half_units(self) -> u64 {
        match self {
            StopBits::One => 2,
            StopBits::OneAndHalf => 3,
            StopBits::Two => 4,
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopBits::One => write!(f, "1"),
            StopBits::OneAndHalf => write!(f, "1.5"),
            StopBits::Two => write!(f, "2"),
        }
    }
}

/// Validated, immutable framing parameters.
///
/// Construct with [`FrameConfig::builder`]:
///
/// ```
/// use uartscan_core::{FrameConfig, Parity, StopBits};
///
/// let config = FrameConfig::builder()
///     .word_width(8)
///     .parity(Parity::Even)
///     .stop_bits(StopBits::Two)
///     .build()
///     .unwrap();
/// assert!(config.idle_level());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    word_width: u8,
    parity: Parity,
    stop_bits: StopBits,
    bit_order: BitOrder,
    inversion: Inversion,
}

impl FrameConfig {
    /// Start building a configuration. Defaults: 8 data bits, no parity,
    /// one stop bit, LSB first, normal logic (8N1).
    pub fn builder() -> FrameConfigBuilder {
        FrameConfigBuilder::default()
    }

    /// Bits per transfer (5..=16).
    pub const fn word_width(&self) -> u8 {
        self.word_width
    }

    /// Parity mode.
    pub const fn parity(&self) -> Parity {
        self.parity
    }

    /// Stop bit count.
    pub const fn stop_bits(&self) -> StopBits {
        self.stop_bits
    }

    /// Data bit order.
    pub const fn bit_order(&self) -> BitOrder {
        self.bit_order
    }

    /// Inversion mode.
    pub const fn inversion(&self) -> Inversion {
        self.inversion
    }

    /// Level of the start bit. Always the complement of [`idle_level`].
    ///
    /// [`idle_level`]: FrameConfig::idle_level
    pub fn start_level(&self) -> bool {
        matches!(self.inversion, Inversion::AllInverted)
    }

    /// Level of the idle line and of valid stop bits.
    pub fn idle_level(&self) -> bool {
        !self.start_level()
    }

    /// Wire levels for a data bit of one and zero, in that order.
    pub fn data_levels(&self) -> (bool, bool) {
        match self.inversion {
            Inversion::Normal => (true, false),
            Inversion::AllInverted | Inversion::DataOnlyInverted => (false, true),
        }
    }

    /// Whether sampled data bits must be flipped before assembly.
    pub fn inverts_data(&self) -> bool {
        !matches!(self.inversion, Inversion::Normal)
    }

    /// Initial value of the running parity accumulator.
    ///
    /// The decoder accumulates logical bit values while the encoder
    /// accumulates wire levels; seeding both with 1 under inversion is
    /// what keeps the two computations in agreement. Do not change one
    /// side without the other.
    pub fn parity_seed(&self) -> u8 {
        self.inverts_data() as u8
    }

    /// Total frame length in half-bit units: start + data + optional
    /// parity + stop.
    pub fn frame_half_bits(&self) -> u64 {
        let parity_bits = u64::from(self.parity != Parity::None);
        2 * (1 + u64::from(self.word_width) + parity_bits) + self.stop_bits.half_units()
    }
}

impl Default for FrameConfig {
    /// The ubiquitous 8N1 framing.
    fn default() -> Self {
        FrameConfig {
            word_width: 8,
            parity: Parity::None,
            stop_bits: StopBits::One,
            bit_order: BitOrder::LsbFirst,
            inversion: Inversion::Normal,
        }
    }
}

impl fmt::Display for FrameConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} data bits, {} parity, {} stop, {}, {}",
            self.word_width, self.parity, self.stop_bits, self.bit_order, self.inversion
        )
    }
}

/// Builder for [`FrameConfig`].
#[derive(Debug, Clone, Default)]
pub struct FrameConfigBuilder {
    config: FrameConfig,
}

impl FrameConfigBuilder {
    /// Set the number of data bits per transfer (5..=16).
    pub fn word_width(mut self, width: u8) -> Self {
        self.config.word_width = width;
        self
    }

    /// Set the parity mode.
    pub fn parity(mut self, parity: Parity) -> Self {
        self.config.parity = parity;
        self
    }

    /// Set the stop bit count.
    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.config.stop_bits = stop_bits;
        self
    }

    /// Set the data bit order.
    pub fn bit_order(mut self, bit_order: BitOrder) -> Self {
        self.config.bit_order = bit_order;
        self
    }

    /// Set the inversion mode.
    pub fn inversion(mut self, inversion: Inversion) -> Self {
        self.config.inversion = inversion;
        self
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<FrameConfig, ConfigError> {
        if !(MIN_WORD_WIDTH..=MAX_WORD_WIDTH).contains(&self.config.word_width) {
            return Err(ConfigError::WordWidth(self.config.word_width));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_8n1() {
        let config = FrameConfig::default();
        assert_eq!(config.word_width(), 8);
        assert_eq!(config.parity(), Parity::None);
        assert_eq!(config.stop_bits(), StopBits::One);
        assert_eq!(config.bit_order(), BitOrder::LsbFirst);
        assert_eq!(config.inversion(), Inversion::Normal);
    }

    #[test]
    fn test_level_derivation() {
        let normal = FrameConfig::builder().build().unwrap();
        assert!(!normal.start_level());
        assert!(normal.idle_level());
        assert_eq!(normal.data_levels(), (true, false));
        assert_eq!(normal.parity_seed(), 0);

        let inverted = FrameConfig::builder()
            .inversion(Inversion::AllInverted)
            .build()
            .unwrap();
        assert!(inverted.start_level());
        assert!(!inverted.idle_level());
        assert_eq!(inverted.data_levels(), (false, true));
        assert_eq!(inverted.parity_seed(), 1);

        let data_only = FrameConfig::builder()
            .inversion(Inversion::DataOnlyInverted)
            .build()
            .unwrap();
        assert!(!data_only.start_level());
        assert!(data_only.idle_level());
        assert_eq!(data_only.data_levels(), (false, true));
        assert_eq!(data_only.parity_seed(), 1);
    }

    #[test]
    fn test_start_and_idle_complementary() {
        for inversion in [
            Inversion::Normal,
            Inversion::AllInverted,
            Inversion::DataOnlyInverted,
        ] {
            let config = FrameConfig::builder().inversion(inversion).build().unwrap();
            assert_ne!(config.start_level(), config.idle_level());
        }
    }

    #[test]
    fn test_word_width_bounds() {
        assert!(FrameConfig::builder().word_width(5).build().is_ok());
        assert!(FrameConfig::builder().word_width(16).build().is_ok());
        assert_eq!(
            FrameConfig::builder().word_width(4).build(),
            Err(ConfigError::WordWidth(4))
        );
        assert_eq!(
            FrameConfig::builder().word_width(17).build(),
            Err(ConfigError::WordWidth(17))
        );
    }

    #[test]
    fn test_stop_half_units() {
        assert_eq!(StopBits::One.half_units(), 2);
        assert_eq!(StopBits::OneAndHalf.half_units(), 3);
        assert_eq!(StopBits::Two.half_units(), 4);
    }

    #[test]
    fn test_frame_half_bits() {
        // 8N1: start + 8 data + 1 stop = 10 bits = 20 half bits
        assert_eq!(FrameConfig::default().frame_half_bits(), 20);

        // 7E1.5: start + 7 data + parity + 1.5 stop
        let config = FrameConfig::builder()
            .word_width(7)
            .parity(Parity::Even)
            .stop_bits(StopBits::OneAndHalf)
            .build()
            .unwrap();
        assert_eq!(config.frame_half_bits(), 2 * 9 + 3);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = FrameConfig::builder()
            .word_width(9)
            .parity(Parity::Odd)
            .stop_bits(StopBits::Two)
            .bit_order(BitOrder::MsbFirst)
            .inversion(Inversion::DataOnlyInverted)
            .build()
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let recovered: FrameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, config);
    }
}
