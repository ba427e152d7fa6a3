//! Debouncing of raw per-buffer estimates into a held note.
//!
//! Readings are kept in a short time window. Once the window spans
//! `window_ms` and every reading is within `tolerance` of the window median, the
//! filter is [Locked][FilterState::Locked] and reports the median. Ticks without
//! a pitch neither add to the window nor reset it, so a brief dropout in the
//! middle of a note does not break the lock; a window whose newest reading is
//! older than `window_ms` is discarded.

use std::cmp::Ordering;
use std::collections::VecDeque;

use log::{debug, trace};
use rustfft::num_traits::Float as NumFloat;

use crate::config::{Sensitivity, StabilityConfig};
use crate::detector::PitchEstimate;
use crate::error::PitchError;
use crate::float::Float;
use crate::note::{Note, NoteName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterState {
    /// No recent readings.
    Empty,
    /// Readings are arriving but do not yet span the window, or disagree.
    Accumulating,
    /// The window spans its full length and all readings agree.
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeldReading<T> {
    pub frequency_hz: T,
    pub timestamp_ms: u64,
}

/// A debounced reading, only produced while the filter is locked.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StableReading<T> {
    pub frequency_hz: T,
    pub note: Note,
}

impl<T: Float> StableReading<T> {
    fn new(frequency_hz: T) -> Option<Self> {
        Note::from_frequency(frequency_hz).map(|note| StableReading { frequency_hz, note })
    }

    pub fn note_name(&self) -> NoteName {
        self.note.name()
    }

    pub fn cents_offset(&self) -> i32 {
        self.note.cents_offset()
    }
}

pub struct StabilityFilter<T>
where
    T: Float,
{
    tolerance: T,
    window_ms: u64,
    octave_tolerance: T,
    readings: VecDeque<HeldReading<T>>,
    /// Scratch for the median.
    sorted: Vec<T>,
    state: FilterState,
    rms: T,
    raw_frequency_hz: Option<T>,
}

impl<T> StabilityFilter<T>
where
    T: Float,
{
    pub fn new(config: &StabilityConfig) -> Result<Self, PitchError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    pub fn with_sensitivity(sensitivity: Sensitivity) -> Self {
        Self::from_valid_config(&StabilityConfig::from_sensitivity(sensitivity))
    }

    fn from_valid_config(config: &StabilityConfig) -> Self {
        StabilityFilter {
            tolerance: T::cast(config.tolerance),
            window_ms: config.window_ms,
            octave_tolerance: T::cast(config.octave_tolerance),
            readings: VecDeque::new(),
            sorted: Vec::new(),
            state: FilterState::Empty,
            rms: T::zero(),
            raw_frequency_hz: None,
        }
    }

    /// Feed the estimate of one tick taken at `now_ms`. Returns a reading
    /// whenever the filter is locked after this tick.
    pub fn ingest(&mut self, estimate: &PitchEstimate<T>, now_ms: u64) -> Option<StableReading<T>> {
        self.rms = estimate.rms;
        self.raw_frequency_hz = estimate.frequency_hz();

        if self
            .readings
            .back()
            .map_or(false, |newest| newest.timestamp_ms.saturating_add(self.window_ms) < now_ms)
        {
            trace!("dropping {} stale readings", self.readings.len());
            self.readings.clear();
        }

        if let Some(frequency_hz) = estimate.frequency_hz() {
            if self.is_octave_jump(frequency_hz) {
                debug!("rejecting {} Hz as an octave jump", frequency_hz);
            } else {
                self.readings.push_back(HeldReading {
                    frequency_hz,
                    timestamp_ms: now_ms,
                });
                self.slide(now_ms);
            }
        }

        let (state, reading) = self.evaluate();
        if state != self.state {
            debug!(
                "stability {:?} -> {:?} with {} readings",
                self.state,
                state,
                self.readings.len()
            );
            self.state = state;
        }
        reading
    }

    /// Forget all readings, e.g. when switching what is being measured.
    pub fn reset(&mut self) {
        self.readings.clear();
        self.state = FilterState::Empty;
        self.rms = T::zero();
        self.raw_frequency_hz = None;
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == FilterState::Locked
    }

    /// Level of the most recent estimate, for meters.
    pub fn rms(&self) -> T {
        self.rms
    }

    /// Most recent raw frequency, a preview that is not authoritative until locked.
    pub fn raw_frequency_hz(&self) -> Option<T> {
        self.raw_frequency_hz
    }

    pub fn readings(&self) -> impl Iterator<Item = &HeldReading<T>> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    fn is_octave_jump(&self, frequency_hz: T) -> bool {
        let newest = match self.readings.back() {
            Some(newest) => newest,
            None => return false,
        };
        let ratio = frequency_hz / newest.frequency_hz;
        let near = |target: T| NumFloat::abs(ratio / target - T::one()) <= self.octave_tolerance;
        near(T::cast(2.0)) || near(T::cast(0.5))
    }

    /// Drop front readings made redundant by a newer one that already reaches
    /// back a full window from `now_ms`.
    fn slide(&mut self, now_ms: u64) {
        let boundary = now_ms.saturating_sub(self.window_ms);
        while self.readings.len() >= 2 && self.readings[1].timestamp_ms <= boundary {
            self.readings.pop_front();
        }
    }

    fn evaluate(&mut self) -> (FilterState, Option<StableReading<T>>) {
        let (oldest, newest) = match (self.readings.front(), self.readings.back()) {
            (Some(oldest), Some(newest)) => (oldest.timestamp_ms, newest.timestamp_ms),
            _ => return (FilterState::Empty, None),
        };
        if newest.saturating_sub(oldest) < self.window_ms {
            return (FilterState::Accumulating, None);
        }

        let median = self.median();
        let max_deviation = self
            .readings
            .iter()
            .map(|r| NumFloat::abs(r.frequency_hz - median))
            .fold(T::zero(), |max, d| if d > max { d } else { max });

        if max_deviation < median * self.tolerance {
            match StableReading::new(median) {
                Some(reading) => (FilterState::Locked, Some(reading)),
                None => (FilterState::Accumulating, None),
            }
        } else {
            trace!(
                "window disagrees: median {} Hz, max deviation {} Hz",
                median,
                max_deviation
            );
            (FilterState::Accumulating, None)
        }
    }

    fn median(&mut self) -> T {
        self.sorted.clear();
        self.sorted
            .extend(self.readings.iter().map(|r| r.frequency_hz));
        self.sorted
            .sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mid = self.sorted.len() / 2;
        if self.sorted.len() % 2 == 0 {
            (self.sorted[mid - 1] + self.sorted[mid]) / T::cast(2.0)
        } else {
            self.sorted[mid]
        }
    }
}
