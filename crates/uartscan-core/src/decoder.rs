//! The UART framing state machine.
//!
//! [`UartDecoder`] walks a [`CaptureSource`] edge by edge and sample by
//! sample, emitting one [`DecodedWord`] per frame plus annotated spans
//! for the start bit, the data field, the parity bit and the stop
//! region.
//!
//! ## Resumability
//!
//! The decoder is built for captures that grow while being decoded. A
//! [`poll`](UartDecoder::poll) call consumes as much of the available
//! input as it can and then suspends, returning
//! [`DecodeStatus::Starved`]. All cross-call state lives in the decoder
//! value: the state machine position, the sample cursor, the bit-sampler
//! cursor and the running parity accumulator. Suspension only ever
//! happens between dispatches — a state step either runs to completion
//! or does not start — so a resumed call picks up exactly where the
//! previous one left off and the emitted words are identical to those of
//! a single uninterrupted run.
//!
//! The abort flag is polled once per dispatch. An aborted call returns
//! without emitting anything for a partially examined frame; the frame
//! is picked up again on the next call.
//!
//! ## Cursor
//!
//! A single monotonically non-decreasing sample index. Start edges
//! behind the cursor are stale echoes of frames already consumed and are
//! ignored, which is what makes overlapping frames impossible by
//! construction.

use crate::capture::{BitSampler, CaptureSource};
use crate::config::{BitOrder, FrameConfig, Parity};
use crate::timing::SampleClock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// What a decoded span annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    /// Start bit
    Start,
    /// Data field (carries the word value)
    Data,
    /// Parity bit
    Parity,
    /// Stop region
    Stop,
}

/// An annotated, inclusive sample-index span inside the capture.
///
/// Span ends are inset by the clock's cosmetic margin so adjacent
/// annotations render separated; the margins never influence decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedSpan {
    /// First sample of the span
    pub start: u64,
    /// Last sample of the span
    pub end: u64,
    /// Which frame field the span covers
    pub kind: SpanKind,
    /// Word value, for [`SpanKind::Data`] spans
    pub value: Option<u16>,
    /// Whether the field failed its check (bad parity, missing stop)
    pub is_error: bool,
}

/// One fully decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedWord {
    /// Word value assembled per the configured bit order
    pub value: u16,
    /// Parity check result; always true when parity is disabled
    pub parity_ok: bool,
    /// True iff every half-bit sample across the stop region was idle
    pub stop_ok: bool,
    /// First sample of the frame (start-bit edge)
    pub start_sample: u64,
    /// Last sample of the frame (end of the stop region)
    pub end_sample: u64,
}

/// Receiver for decoder output.
pub trait DecodeSink {
    /// Accept an annotated span.
    fn span(&mut self, span: DecodedSpan);

    /// Accept a completed word.
    fn word(&mut self, word: DecodedWord);
}

/// Sink that collects everything into vectors.
#[derive(Debug, Clone, Default)]
pub struct WordCollector {
    /// Completed words, in decode order
    pub words: Vec<DecodedWord>,
    /// Annotated spans, in emission order
    pub spans: Vec<DecodedSpan>,
}

impl WordCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        WordCollector::default()
    }

    /// The collected word values.
    pub fn values(&self) -> Vec<u16> {
        self.words.iter().map(|w| w.value).collect()
    }
}

impl DecodeSink for WordCollector {
    fn span(&mut self, span: DecodedSpan) {
        self.spans.push(span);
    }

    fn word(&mut self, word: DecodedWord) {
        self.words.push(word);
    }
}

/// Why a decode call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Input exhausted or not enough samples for the current state;
    /// call again once the capture has grown.
    Starved,
    /// The abort flag was observed set.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SearchStart,
    StartBit,
    DataField,
}

/// Resumable UART capture decoder.
pub struct UartDecoder {
    config: FrameConfig,
    clock: SampleClock,
    state: State,
    cursor: u64,
    sampler: BitSampler,
    parity_acc: u8,
    frame_start: u64,
    word_count: u64,
}

impl UartDecoder {
    /// Create a decoder over the given framing and timing.
    pub fn new(config: FrameConfig, clock: SampleClock) -> Self {
        UartDecoder {
            config,
            clock,
            state: State::SearchStart,
            cursor: 1,
            sampler: BitSampler::default(),
            parity_acc: 0,
            frame_start: 0,
            word_count: 0,
        }
    }

    /// Current sample cursor. Non-decreasing across the decoder's life.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Words emitted so far.
    pub fn words_decoded(&self) -> u64 {
        self.word_count
    }

    /// Decode until the input is exhausted or `abort` is set.
    ///
    /// Suspends (rather than failing) when the capture does not yet hold
    /// enough samples for the state the machine is in; the same call can
    /// be repeated after more samples arrive.
    pub fn poll<S, K>(&mut self, source: &mut S, sink: &mut K, abort: &AtomicBool) -> DecodeStatus
    where
        S: CaptureSource,
        K: DecodeSink,
    {
        loop {
            if abort.load(Ordering::Relaxed) {
                debug!(cursor = self.cursor, "decode aborted");
                return DecodeStatus::Aborted;
            }
            if !source.has_more_transitions() {
                return DecodeStatus::Starved;
            }

            match self.state {
                State::SearchStart => self.step_search_start(source),
                State::StartBit => {
                    if !self.step_start_bit(source, sink) {
                        return DecodeStatus::Starved;
                    }
                    // Fall through: the whole word may already be
                    // available in the same pass.
                    let _ = self.step_data_field(source, sink);
                }
                State::DataField => {
                    if !self.step_data_field(source, sink) {
                        return DecodeStatus::Starved;
                    }
                }
            }
        }
    }

    /// [`poll`](UartDecoder::poll) without an abort flag: decode
    /// everything currently available.
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> DecodeStatus
    where
        S: CaptureSource,
        K: DecodeSink,
    {
        let abort = AtomicBool::new(false);
        self.poll(source, sink, &abort)
    }

    /// Pull one transition, looking for a start edge at or past the
    /// cursor.
    fn step_search_start<S: CaptureSource>(&mut self, source: &mut S) {
        let Some(transition) = source.next_transition() else {
            return;
        };
        if transition.level == self.config.start_level() && transition.sample_index >= self.cursor {
            trace!(sample = transition.sample_index, "start edge found");
            self.cursor = transition.sample_index;
            self.frame_start = transition.sample_index;
            self.state = State::StartBit;
        }
    }

    /// Annotate the start bit and arm the data sampler.
    ///
    /// Returns false (leaving all state untouched) while the capture
    /// holds fewer samples than the start bit needs.
    fn step_start_bit<S, K>(&mut self, source: &S, sink: &mut K) -> bool
    where
        S: CaptureSource,
        K: DecodeSink,
    {
        let spb = self.clock.samples_per_bit();
        if source.available_samples() <= self.cursor + spb {
            return false;
        }

        let margin = self.clock.margin();
        sink.span(DecodedSpan {
            start: self.cursor + margin,
            end: self.cursor + spb - margin,
            kind: SpanKind::Start,
            value: None,
            is_error: false,
        });

        self.cursor += spb;
        // Arm the sampler at the centre of the first data bit.
        self.sampler = BitSampler::full_bit(self.cursor + spb / 2, spb);
        self.parity_acc = self.config.parity_seed();
        self.state = State::DataField;
        debug!(cursor = self.cursor, "start bit accepted");
        true
    }

    /// Sample the data field, the parity bit and the stop region, then
    /// emit the word and return to the start-edge search.
    ///
    /// Returns false (leaving all state untouched) until the capture
    /// holds the frame's full conservative sample budget, so the step is
    /// atomic: it either does all of its work or none of it.
    fn step_data_field<S, K>(&mut self, source: &S, sink: &mut K) -> bool
    where
        S: CaptureSource,
        K: DecodeSink,
    {
        let spb = self.clock.samples_per_bit();
        let margin = self.clock.margin();
        let width = self.config.word_width();
        // Data, parity and stop all fit inside width + 3 bit periods.
        if source.available_samples() <= self.cursor + spb * (u64::from(width) + 3) {
            return false;
        }

        let mut value: u16 = 0;
        for i in 0..width {
            let mut bit = self.sampler.next(source);
            if self.config.inverts_data() {
                bit = !bit;
            }
            value = match self.config.bit_order() {
                BitOrder::LsbFirst => value | (u16::from(bit) << i),
                BitOrder::MsbFirst => (value << 1) | u16::from(bit),
            };
            self.parity_acc ^= bit as u8;
        }

        sink.span(DecodedSpan {
            start: self.cursor + margin,
            end: self.cursor + u64::from(width) * spb - margin,
            kind: SpanKind::Data,
            value: Some(value),
            is_error: false,
        });
        self.cursor += u64::from(width) * spb;

        let parity_ok = match self.config.parity() {
            Parity::None => true,
            mode => {
                // The parity bit is taken as a raw wire level; the seed
                // accounts for inversion.
                self.parity_acc ^= self.sampler.next(source) as u8;
                let ok = match mode {
                    Parity::Odd => self.parity_acc == 1,
                    Parity::Even => self.parity_acc == 0,
                    Parity::None => unreachable!(),
                };
                sink.span(DecodedSpan {
                    start: self.cursor + margin,
                    end: self.cursor + spb - margin,
                    kind: SpanKind::Parity,
                    value: None,
                    is_error: !ok,
                });
                self.cursor += spb;
                ok
            }
        };

        // Walk the stop region in half-bit steps.
        let mut stop_sampler = BitSampler::half_bit(self.cursor, spb);
        let mut stop_ok = true;
        for _ in 0..self.config.stop_bits().half_units() {
            if stop_sampler.next(source) != self.config.idle_level() {
                stop_ok = false;
            }
        }
        let stop_len = self.clock.stop_samples(self.config.stop_bits());
        sink.span(DecodedSpan {
            start: self.cursor + margin,
            end: self.cursor + stop_len - margin,
            kind: SpanKind::Stop,
            value: None,
            is_error: !stop_ok,
        });
        self.cursor += stop_len;

        let word = DecodedWord {
            value,
            parity_ok,
            stop_ok,
            start_sample: self.frame_start,
            end_sample: self.cursor - 1,
        };
        self.word_count += 1;
        debug!(
            value = word.value,
            parity_ok,
            stop_ok,
            start = word.start_sample,
            end = word.end_sample,
            "word decoded"
        );
        sink.word(word);

        self.state = State::SearchStart;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureBuffer;
    use crate::config::{Inversion, StopBits};
    use crate::encoder::UartEncoder;

    fn clock() -> SampleClock {
        SampleClock::new(96_000, 9_600).unwrap()
    }

    fn decode_all(config: FrameConfig, capture: &mut CaptureBuffer) -> WordCollector {
        let mut decoder = UartDecoder::new(config, clock());
        let mut sink = WordCollector::new();
        assert_eq!(decoder.run(capture, &mut sink), DecodeStatus::Starved);
        sink
    }

    #[test]
    fn test_single_word() {
        let config = FrameConfig::default();
        let encoder = UartEncoder::new(config, clock());
        let mut capture = CaptureBuffer::new(96_000);
        encoder.encode_idle(&mut capture, 4);
        encoder.encode_word(&mut capture, 0x41);
        encoder.encode_idle(&mut capture, 4);

        let sink = decode_all(config, &mut capture);
        assert_eq!(sink.values(), [0x41]);
        let word = sink.words[0];
        assert!(word.parity_ok);
        assert!(word.stop_ok);
        // Frame starts at the end of the 4-period lead-in and spans
        // 10 bit periods.
        assert_eq!(word.start_sample, 40);
        assert_eq!(word.end_sample, 139);
    }

    #[test]
    fn test_span_sequence_for_word() {
        let config = FrameConfig::builder().parity(Parity::Even).build().unwrap();
        let encoder = UartEncoder::new(config, clock());
        let mut capture = CaptureBuffer::new(96_000);
        encoder.encode_idle(&mut capture, 2);
        encoder.encode_word(&mut capture, 0x00);
        encoder.encode_idle(&mut capture, 4);

        let sink = decode_all(config, &mut capture);
        let kinds: Vec<SpanKind> = sink.spans.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            [SpanKind::Start, SpanKind::Data, SpanKind::Parity, SpanKind::Stop]
        );

        // margin = 1 at 10 samples per bit; start edge at sample 20
        assert_eq!((sink.spans[0].start, sink.spans[0].end), (21, 29));
        assert_eq!((sink.spans[1].start, sink.spans[1].end), (31, 109));
        assert_eq!((sink.spans[2].start, sink.spans[2].end), (111, 119));
        assert_eq!((sink.spans[3].start, sink.spans[3].end), (121, 129));
        assert!(sink.spans.iter().all(|s| !s.is_error));
    }

    #[test]
    fn test_stale_start_edges_ignored() {
        // Noise: a level change dips to start level and back before the
        // cursor has anything to do with it, then a real frame follows.
        let config = FrameConfig::default();
        let encoder = UartEncoder::new(config, clock());
        let mut capture = CaptureBuffer::new(96_000);
        encoder.encode_idle(&mut capture, 2);
        encoder.encode_word(&mut capture, 0x55);
        encoder.encode_idle(&mut capture, 6);

        let mut decoder = UartDecoder::new(config, clock());
        let mut sink = WordCollector::new();
        decoder.run(&mut capture, &mut sink);
        assert_eq!(sink.values(), [0x55]);

        // Data-bit edges of the consumed frame sit behind the cursor;
        // the search must skip them all without re-framing.
        assert_eq!(decoder.words_decoded(), 1);
        assert!(decoder.cursor() >= 120);
    }

    #[test]
    fn test_abort_before_work() {
        let config = FrameConfig::default();
        let encoder = UartEncoder::new(config, clock());
        let mut capture = CaptureBuffer::new(96_000);
        encoder.encode_idle(&mut capture, 2);
        encoder.encode_word(&mut capture, 0x7E);
        encoder.encode_idle(&mut capture, 4);

        let mut decoder = UartDecoder::new(config, clock());
        let mut sink = WordCollector::new();
        let abort = AtomicBool::new(true);
        assert_eq!(
            decoder.poll(&mut capture, &mut sink, &abort),
            DecodeStatus::Aborted
        );
        assert!(sink.words.is_empty());
        assert!(sink.spans.is_empty());
        assert_eq!(decoder.cursor(), 1);

        // Clearing the flag resumes from scratch.
        abort.store(false, Ordering::Relaxed);
        assert_eq!(
            decoder.poll(&mut capture, &mut sink, &abort),
            DecodeStatus::Starved
        );
        assert_eq!(sink.values(), [0x7E]);
    }

    #[test]
    fn test_word_per_frame_with_bad_stop() {
        // Hand-built frame whose stop region is held at start level:
        // still exactly one word, flagged, cursor past the frame.
        let config = FrameConfig::default();
        let mut capture = CaptureBuffer::new(96_000);
        capture.push_run(true, 20); // idle
        capture.push_run(false, 10); // start
        capture.push_run(true, 80); // data 0xFF
        capture.push_run(false, 10); // stop region forced low
        capture.push_run(true, 40); // idle tail

        let sink = decode_all(config, &mut capture);
        assert_eq!(sink.values(), [0xFF]);
        assert!(!sink.words[0].stop_ok);
        assert!(sink.words[0].parity_ok);
        let stop_span = sink.spans.iter().find(|s| s.kind == SpanKind::Stop).unwrap();
        assert!(stop_span.is_error);
    }

    #[test]
    fn test_data_only_inverted_roundtrip() {
        let config = FrameConfig::builder()
            .inversion(Inversion::DataOnlyInverted)
            .stop_bits(StopBits::OneAndHalf)
            .build()
            .unwrap();
        let encoder = UartEncoder::new(config, clock());
        let mut capture = CaptureBuffer::new(96_000);
        encoder.encode_idle(&mut capture, 2);
        encoder.encode_sequence(&mut capture, &[0x13, 0xE7]);
        encoder.encode_idle(&mut capture, 4);

        let sink = decode_all(config, &mut capture);
        assert_eq!(sink.values(), [0x13, 0xE7]);
        assert!(sink.words.iter().all(|w| w.stop_ok));
    }
}
