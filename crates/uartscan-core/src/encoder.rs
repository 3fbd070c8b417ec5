//! Waveform synthesis: the mirror image of the decoder.
//!
//! [`UartEncoder`] turns word values into an idealized level/duration run
//! sequence under the same [`FrameConfig`] and [`SampleClock`] the
//! decoder uses. Feeding the runs into a
//! [`CaptureBuffer`](crate::capture::CaptureBuffer) yields a capture the
//! decoder accepts, which is the round-trip path the tests lean on.
//!
//! The encoder accumulates parity over emitted wire *levels* while the
//! decoder accumulates sampled *bit values*; the shared inversion-derived
//! seed is what makes the two agree. That symmetry is load-bearing —
//! change both sides or neither.

use crate::config::{BitOrder, FrameConfig, Parity};
use crate::timing::SampleClock;
use tracing::debug;

/// One constant-level stretch of synthesized waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRun {
    /// Wire level over the run
    pub level: bool,
    /// Run duration in samples
    pub duration: u64,
}

/// Consumer of synthesized runs, in emission order.
pub trait RunSink {
    /// Accept one run of `duration` samples at `level`.
    fn run(&mut self, level: bool, duration: u64);
}

impl RunSink for Vec<LevelRun> {
    fn run(&mut self, level: bool, duration: u64) {
        self.push(LevelRun { level, duration });
    }
}

/// UART waveform synthesizer.
#[derive(Debug, Clone, Copy)]
pub struct UartEncoder {
    config: FrameConfig,
    clock: SampleClock,
}

impl UartEncoder {
    /// Create an encoder over the given framing and timing.
    pub fn new(config: FrameConfig, clock: SampleClock) -> Self {
        UartEncoder { config, clock }
    }

    /// Framing parameters this encoder was built with.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Emit one framed word: start bit, data bits in configured order,
    /// optional parity bit, stop region.
    ///
    /// Bits of `code` above the configured word width are ignored.
    pub fn encode_word<K: RunSink + ?Sized>(&self, sink: &mut K, code: u16) {
        let spb = self.clock.samples_per_bit();
        let idle = self.config.idle_level();
        let (hi, lo) = self.config.data_levels();
        let width = self.config.word_width();

        // Start bit
        sink.run(!idle, spb);

        let mut parity_value = self.config.parity_seed();

        let indices: Vec<u8> = match self.config.bit_order() {
            BitOrder::MsbFirst => (0..width).rev().collect(),
            BitOrder::LsbFirst => (0..width).collect(),
        };
        for i in indices {
            let bit = (code >> i) & 1;
            let level = if bit == 1 { hi } else { lo };
            sink.run(level, spb);
            parity_value ^= level as u8;
        }

        match self.config.parity() {
            Parity::None => {}
            Parity::Odd => {
                parity_value ^= 1;
                sink.run(parity_value != 0, spb);
            }
            Parity::Even => {
                sink.run(parity_value != 0, spb);
            }
        }

        // Stop region
        sink.run(idle, self.clock.stop_samples(self.config.stop_bits()));
        debug!(code, "word encoded");
    }

    /// Emit one framed word per value, back to back.
    pub fn encode_sequence<K: RunSink + ?Sized>(&self, sink: &mut K, codes: &[u16]) {
        for &code in codes {
            self.encode_word(sink, code);
        }
    }

    /// Emit one framed word per character of `text`.
    ///
    /// Characters are encoded by their Unicode scalar value truncated to
    /// the word width, which for ASCII text is the byte value.
    pub fn encode_str<K: RunSink + ?Sized>(&self, sink: &mut K, text: &str) {
        for ch in text.chars() {
            self.encode_word(sink, ch as u16);
        }
    }

    /// Emit an idle gap of `bit_periods` bit periods.
    pub fn encode_idle<K: RunSink + ?Sized>(&self, sink: &mut K, bit_periods: u64) {
        sink.run(
            self.config.idle_level(),
            self.clock.samples_per_bit() * bit_periods,
        );
    }
}
