use crate::error::PitchError;
use crate::float::Float;

pub mod correlator;
pub mod harmonic;
pub mod internals;
pub mod lag;
pub mod refine;
pub mod voicing;

pub use harmonic::Candidate;

/// One read-only snapshot of captured audio: samples in `[-1, 1]` and their rate.
#[derive(Debug, Clone, Copy)]
pub struct SampleBuffer<'a, T>
where
    T: Float,
{
    samples: &'a [T],
    sample_rate_hz: u32,
}

impl<'a, T> SampleBuffer<'a, T>
where
    T: Float,
{
    pub fn new(samples: &'a [T], sample_rate_hz: u32) -> Result<Self, PitchError> {
        if sample_rate_hz == 0 {
            return Err(PitchError::InvalidSampleRate);
        }
        Ok(SampleBuffer {
            samples,
            sample_rate_hz,
        })
    }

    pub fn samples(&self) -> &'a [T] {
        self.samples
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Why a buffer produced no pitch. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoPitch {
    /// The buffer is too quiet to analyze.
    NoSignal,
    /// No periodicity was found, or every candidate was rejected as noise.
    Unresolvable,
    /// The estimate fell outside the supported frequency range.
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Detection<T> {
    Detected(T),
    NotDetected(NoPitch),
}

impl<T: Float> Detection<T> {
    pub fn frequency_hz(&self) -> Option<T> {
        match *self {
            Detection::Detected(frequency) => Some(frequency),
            Detection::NotDetected(_) => None,
        }
    }
}

/// The raw, per-buffer outcome of a [PitchDetector].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PitchEstimate<T>
where
    T: Float,
{
    pub detection: Detection<T>,
    /// Signal level of the buffer, reported even when nothing was detected.
    pub rms: T,
    /// In-band candidates ordered by correlation strength, strongest first.
    pub candidates: Vec<Candidate<T>>,
}

impl<T> PitchEstimate<T>
where
    T: Float,
{
    pub fn not_detected(reason: NoPitch, rms: T) -> Self {
        PitchEstimate {
            detection: Detection::NotDetected(reason),
            rms,
            candidates: Vec::new(),
        }
    }

    pub fn frequency_hz(&self) -> Option<T> {
        self.detection.frequency_hz()
    }
}

/// Inclusive frequency interval in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRange<T: Float> {
    pub min_hz: T,
    pub max_hz: T,
}

impl<T: Float> FrequencyRange<T> {
    pub fn new(min_hz: T, max_hz: T) -> Self {
        FrequencyRange { min_hz, max_hz }
    }

    pub fn contains(&self, frequency_hz: T) -> bool {
        frequency_hz >= self.min_hz && frequency_hz <= self.max_hz
    }
}

pub trait PitchDetector<T>
where
    T: Float,
{
    /// Estimate the pitch of one buffer. Never fails: a buffer without a
    /// usable pitch yields [Detection::NotDetected].
    fn detect(&mut self, buffer: &SampleBuffer<T>) -> PitchEstimate<T>;
}
