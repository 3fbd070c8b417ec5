//! Human-readable rendering of decoded word values.
//!
//! Decoded values can be shown in any combination of hex, ASCII,
//! unsigned decimal and binary. Hex pads to the nibble count of the
//! configured word width and binary pads to the full width, so columns
//! line up across a dump.

use serde::{Deserialize, Serialize};

/// Which representations to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFormat {
    /// Hexadecimal, zero padded to the word width
    pub hex: bool,
    /// ASCII character (non-printable values shown as '.')
    pub ascii: bool,
    /// Unsigned decimal
    pub dec: bool,
    /// Binary, zero padded to the word width
    pub bin: bool,
}

impl Default for WordFormat {
    /// Hex plus ASCII, the usual dump format.
    fn default() -> Self {
        WordFormat {
            hex: true,
            ascii: true,
            dec: false,
            bin: false,
        }
    }
}

fn ascii_char(value: u16) -> char {
    match u32::from(value) {
        0x20..=0x7E => char::from_u32(u32::from(value)).unwrap_or('.'),
        _ => '.',
    }
}

/// Render `value` in every representation enabled in `format`.
///
/// ```
/// use uartscan_core::render::{format_word, WordFormat};
///
/// let text = format_word(0x41, 8, WordFormat::default());
/// assert_eq!(text, "0x41 'A'");
/// ```
pub fn format_word(value: u16, word_width: u8, format: WordFormat) -> String {
    let mut parts = Vec::new();
    if format.hex {
        let nibbles = usize::from(word_width).div_ceil(4);
        parts.push(format!("0x{:0nibbles$X}", value, nibbles = nibbles));
    }
    if format.ascii {
        parts.push(format!("'{}'", ascii_char(value)));
    }
    if format.dec {
        parts.push(format!("({})", value));
    }
    if format.bin {
        let width = usize::from(word_width);
        parts.push(format!("0b{:0width$b}", value, width = width));
    }
    parts.join(" ")
}

/// Render `value` in the first enabled representation only, for narrow
/// annotation columns. Preference order: hex, ASCII, decimal, binary.
pub fn format_word_compact(value: u16, word_width: u8, format: WordFormat) -> String {
    if format.hex {
        let nibbles = usize::from(word_width).div_ceil(4);
        format!("0x{:0nibbles$X}", value, nibbles = nibbles)
    } else if format.ascii {
        ascii_char(value).to_string()
    } else if format.dec {
        value.to_string()
    } else if format.bin {
        let width = usize::from(word_width);
        format!("0b{:0width$b}", value, width = width)
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: WordFormat = WordFormat {
        hex: true,
        ascii: true,
        dec: true,
        bin: true,
    };

    #[test]
    fn test_combined_format() {
        assert_eq!(format_word(0x41, 8, ALL), "0x41 'A' (65) 0b01000001");
    }

    #[test]
    fn test_default_format() {
        assert_eq!(format_word(0x0A, 8, WordFormat::default()), "0x0A '.'");
    }

    #[test]
    fn test_hex_pads_to_width_nibbles() {
        let hex_only = WordFormat {
            hex: true,
            ascii: false,
            dec: false,
            bin: false,
        };
        assert_eq!(format_word(0x5, 5, hex_only), "0x05");
        assert_eq!(format_word(0x5, 8, hex_only), "0x05");
        assert_eq!(format_word(0x5, 9, hex_only), "0x005");
        assert_eq!(format_word(0xBEE, 16, hex_only), "0x0BEE");
    }

    #[test]
    fn test_bin_pads_to_width() {
        let bin_only = WordFormat {
            hex: false,
            ascii: false,
            dec: false,
            bin: true,
        };
        assert_eq!(format_word(0b101, 5, bin_only), "0b00101");
        assert_eq!(format_word(0b101, 12, bin_only), "0b000000000101");
    }

    #[test]
    fn test_compact_prefers_hex_then_ascii() {
        assert_eq!(format_word_compact(0x41, 8, ALL), "0x41");

        let no_hex = WordFormat {
            hex: false,
            ..ALL
        };
        assert_eq!(format_word_compact(0x41, 8, no_hex), "A");

        let dec_only = WordFormat {
            hex: false,
            ascii: false,
            dec: true,
            bin: false,
        };
        assert_eq!(format_word_compact(0x41, 8, dec_only), "65");
    }

    #[test]
    fn test_nothing_enabled() {
        let none = WordFormat {
            hex: false,
            ascii: false,
            dec: false,
            bin: false,
        };
        assert_eq!(format_word(0x41, 8, none), "");
        assert_eq!(format_word_compact(0x41, 8, none), "");
    }
}
