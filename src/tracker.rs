//! Glue between a capture collaborator, one detector and one stability filter.
//!
//! The caller owns the clock: every tick it hands over the latest window of
//! samples together with a millisecond timestamp and gets back both the raw
//! estimate and, once the filter is locked, the stable reading.

use log::trace;

use crate::config::{DetectorConfig, StabilityConfig};
use crate::detector::lag::LagDetector;
use crate::detector::{PitchDetector, PitchEstimate, SampleBuffer};
use crate::error::PitchError;
use crate::float::Float;
use crate::stability::{FilterState, StabilityFilter, StableReading};

/// Anything that can provide the most recent window of captured audio.
pub trait SampleSource<T>
where
    T: Float,
{
    fn sample_rate_hz(&self) -> u32;

    /// The latest `N` samples, oldest first.
    fn buffer(&self) -> &[T];
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackerUpdate<T>
where
    T: Float,
{
    pub estimate: PitchEstimate<T>,
    pub stable: Option<StableReading<T>>,
    pub state: FilterState,
}

pub struct PitchTracker<T, D>
where
    T: Float,
    D: PitchDetector<T>,
{
    detector: D,
    filter: StabilityFilter<T>,
}

impl<T> PitchTracker<T, LagDetector<T>>
where
    T: Float,
{
    pub fn with_config(
        detector: &DetectorConfig,
        stability: &StabilityConfig,
        sample_rate_hz: u32,
        size: usize,
    ) -> Result<Self, PitchError> {
        Ok(PitchTracker {
            detector: LagDetector::with_config(detector, sample_rate_hz, size)?,
            filter: StabilityFilter::new(stability)?,
        })
    }
}

impl<T, D> PitchTracker<T, D>
where
    T: Float,
    D: PitchDetector<T>,
{
    pub fn new(detector: D, filter: StabilityFilter<T>) -> Self {
        PitchTracker { detector, filter }
    }

    pub fn tick(&mut self, buffer: &SampleBuffer<T>, now_ms: u64) -> TrackerUpdate<T> {
        let estimate = self.detector.detect(buffer);
        let stable = self.filter.ingest(&estimate, now_ms);
        trace!(
            "tick at {} ms: raw {:?}, stable {:?}",
            now_ms,
            estimate.detection,
            stable.map(|s| s.frequency_hz)
        );
        TrackerUpdate {
            estimate,
            stable,
            state: self.filter.state(),
        }
    }

    /// Pull the latest window from `source` and run one tick on it.
    pub fn poll<S>(&mut self, source: &S, now_ms: u64) -> Result<TrackerUpdate<T>, PitchError>
    where
        S: SampleSource<T> + ?Sized,
    {
        let buffer = SampleBuffer::new(source.buffer(), source.sample_rate_hz())?;
        Ok(self.tick(&buffer, now_ms))
    }

    pub fn reset(&mut self) {
        self.filter.reset();
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn filter(&self) -> &StabilityFilter<T> {
        &self.filter
    }
}
