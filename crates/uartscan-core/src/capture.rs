//! Acquisition interfaces and the in-memory reference capture.
//!
//! The decoder never talks to hardware. It consumes a [`CaptureSource`]:
//! a monotonically growing sample store that exposes its level
//! transitions, how many samples are available so far, and point queries
//! for the bit sampler. A live acquisition backend implements the same
//! trait; tests and the CLI use [`CaptureBuffer`].
//!
//! [`BitSampler`] is the sampling primitive shared by the data and stop
//! walks: seeded at an origin index with a period, it returns one level
//! per call. Periods are carried in half-sample units so a half-bit
//! period over an odd samples-per-bit count stays in integer arithmetic
//! with no accumulated drift.

use crate::encoder::RunSink;
use tracing::trace;

/// A single level change in the capture.
///
/// `level` is the new level that takes effect at `sample_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Sample index at which the new level starts
    pub sample_index: u64,
    /// The level from this index onward
    pub level: bool,
}

/// Read-only view of a growing capture, as the decoder needs it.
///
/// Implementations must be append-only: `available_samples` never
/// decreases, transitions are yielded in increasing `sample_index`
/// order, and `level_at` answers for any index below the available
/// count.
pub trait CaptureSource {
    /// Sample rate of the capture in samples per second.
    fn sample_rate(&self) -> u64;

    /// Whether any unconsumed transitions remain.
    fn has_more_transitions(&self) -> bool;

    /// Consume and return the next transition, if any.
    fn next_transition(&mut self) -> Option<Transition>;

    /// Number of samples acquired so far.
    fn available_samples(&self) -> u64;

    /// Level of the sample at `sample_index`.
    fn level_at(&self, sample_index: u64) -> bool;
}

/// Periodic sampling cursor over a [`CaptureSource`].
///
/// Yields the level at `origin`, `origin + period`, `origin + 2*period`,
/// ... where the period is fixed at construction. Positions are computed
/// multiplicatively from the step index, so the sampler can be suspended
/// and resumed without drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitSampler {
    origin: u64,
    period_halves: u64,
    index: u64,
}

impl BitSampler {
    /// Sampler stepping one full bit period per call.
    pub fn full_bit(origin: u64, samples_per_bit: u64) -> Self {
        BitSampler {
            origin,
            period_halves: samples_per_bit * 2,
            index: 0,
        }
    }

    /// Sampler stepping half a bit period per call (stop region walk).
    pub fn half_bit(origin: u64, samples_per_bit: u64) -> Self {
        BitSampler {
            origin,
            period_halves: samples_per_bit,
            index: 0,
        }
    }

    /// Sample index the next call will read.
    pub fn position(&self) -> u64 {
        self.origin + self.index * self.period_halves / 2
    }

    /// Read one level and advance by one period.
    pub fn next<S: CaptureSource + ?Sized>(&mut self, source: &S) -> bool {
        let level = source.level_at(self.position());
        self.index += 1;
        level
    }
}

/// Growable in-memory capture.
///
/// Stores one boolean level per sample and derives the transition index
/// as samples are appended. The first append defines the initial line
/// level without producing a transition, so captures should lead in with
/// idle before the first frame — the same requirement a hardware
/// trigger imposes.
///
/// Implements [`RunSink`], so encoder output can be poured straight in
/// for round-trip decoding.
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    sample_rate: u64,
    levels: Vec<bool>,
    transitions: Vec<Transition>,
    next_transition: usize,
}

impl CaptureBuffer {
    /// Create an empty capture with the given sample rate.
    pub fn new(sample_rate: u64) -> Self {
        CaptureBuffer {
            sample_rate,
            levels: Vec::new(),
            transitions: Vec::new(),
            next_transition: 0,
        }
    }

    /// Append a run of `count` samples at `level`.
    pub fn push_run(&mut self, level: bool, count: u64) {
        if count == 0 {
            return;
        }
        let start = self.levels.len() as u64;
        if let Some(&last) = self.levels.last() {
            if last != level {
                self.transitions.push(Transition {
                    sample_index: start,
                    level,
                });
            }
        }
        self.levels
            .extend(std::iter::repeat(level).take(count as usize));
        trace!(start, count, level, "capture run appended");
    }

    /// Append individual samples, deriving transitions along the way.
    pub fn push_samples(&mut self, samples: &[bool]) {
        for &level in samples {
            self.push_run(level, 1);
        }
    }

    /// All sample levels acquired so far.
    pub fn samples(&self) -> &[bool] {
        &self.levels
    }
}

impl CaptureSource for CaptureBuffer {
    fn sample_rate(&self) -> u64 {
        self.sample_rate
    }

    fn has_more_transitions(&self) -> bool {
        self.next_transition < self.transitions.len()
    }

    fn next_transition(&mut self) -> Option<Transition> {
        let transition = self.transitions.get(self.next_transition).copied();
        if transition.is_some() {
            self.next_transition += 1;
        }
        transition
    }

    fn available_samples(&self) -> u64 {
        self.levels.len() as u64
    }

    fn level_at(&self, sample_index: u64) -> bool {
        self.levels
            .get(sample_index as usize)
            .or(self.levels.last())
            .copied()
            .unwrap_or(false)
    }
}

impl RunSink for CaptureBuffer {
    fn run(&mut self, level: bool, duration: u64) {
        self.push_run(level, duration);
    }
}
