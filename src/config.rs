//! Tunable parameters for detection and stabilization.
//!
//! The harmonic and noise thresholds are empirically tuned rather than derived,
//! which is why they live here instead of being baked into the algorithms.

use crate::error::PitchError;

/// How the squared-difference curve is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CorrelationMethod {
    /// Direct summation, subsampled with a stride of 2 for long lags.
    Direct,
    /// Exact curve through an FFT windowed autocorrelation.
    Fft,
}

/// Detection configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorConfig {
    /// Buffers with an RMS level below this are unvoiced (default: 0.003)
    pub rms_threshold: f64,

    /// Lowest reportable frequency in Hz (default: 50.0)
    pub min_frequency_hz: f64,

    /// Highest reportable frequency in Hz (default: 2000.0)
    pub max_frequency_hz: f64,

    /// Lower edge of the preferred vocal band in Hz (default: 80.0)
    /// Candidates below it without harmonic support are treated as rumble.
    pub preferred_low_hz: f64,

    /// Upper edge of the preferred vocal band in Hz (default: 1200.0)
    pub preferred_high_hz: f64,

    /// Maximum distance of a frequency ratio from an integer for one candidate
    /// to count as a harmonic of another (default: 0.12)
    pub harmonic_tolerance: f64,

    /// Normalized correlation quality above which a low, unsupported
    /// candidate is noise (default: 0.1)
    pub noise_quality: f64,

    /// Quality below which a well supported in-band candidate is accepted
    /// immediately (default: 0.05)
    pub confident_quality: f64,

    /// Harmonic support needed for the early accept (default: 2)
    pub confident_harmonic_count: usize,

    /// A candidate is a periodicity echo of a higher candidate sitting on one of
    /// its multiples when that one is at most this much worse (default: 0.05)
    pub subharmonic_margin: f64,

    /// Extra allowance for the echo test, as a fraction of the candidate's own
    /// quality, so that noisy signals with a raised quality floor still
    /// collapse their echoes (default: 0.5)
    pub subharmonic_ratio: f64,

    /// How far the period implied by a long lag may sit from a shorter lag,
    /// as a fraction of the shorter lag, for the long lag to count as one of
    /// its multiples (default: 0.05, never less than one sample)
    pub period_tolerance: f64,

    /// Only candidates within this quality of the best one can be selected;
    /// weaker ones still count as harmonic support (default: 0.1)
    pub selection_margin: f64,

    /// Number of candidates considered by the disambiguator (default: 10)
    pub max_candidates: usize,

    /// Smallest lag ever evaluated, in samples (default: 4)
    pub min_lag: usize,

    /// Lags from this one upward are summed with a stride of 2 (default: 50)
    pub stride_lag: usize,

    /// Curve computation (default: Direct)
    pub method: CorrelationMethod,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            rms_threshold: 0.003,
            min_frequency_hz: 50.0,
            max_frequency_hz: 2000.0,
            preferred_low_hz: 80.0,
            preferred_high_hz: 1200.0,
            harmonic_tolerance: 0.12,
            noise_quality: 0.1,
            confident_quality: 0.05,
            confident_harmonic_count: 2,
            subharmonic_margin: 0.05,
            subharmonic_ratio: 0.5,
            period_tolerance: 0.05,
            selection_margin: 0.1,
            max_candidates: 10,
            min_lag: 4,
            stride_lag: 50,
            method: CorrelationMethod::Direct,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), PitchError> {
        if !(self.min_frequency_hz > 0.0)
            || !self.max_frequency_hz.is_finite()
            || self.min_frequency_hz >= self.max_frequency_hz
        {
            return Err(PitchError::InvalidFrequencyRange {
                min_hz: self.min_frequency_hz,
                max_hz: self.max_frequency_hz,
            });
        }
        if !(self.preferred_low_hz < self.preferred_high_hz) {
            return Err(PitchError::InvalidFrequencyRange {
                min_hz: self.preferred_low_hz,
                max_hz: self.preferred_high_hz,
            });
        }
        non_negative("rms_threshold", self.rms_threshold)?;
        non_negative("noise_quality", self.noise_quality)?;
        non_negative("confident_quality", self.confident_quality)?;
        non_negative("subharmonic_margin", self.subharmonic_margin)?;
        non_negative("subharmonic_ratio", self.subharmonic_ratio)?;
        non_negative("selection_margin", self.selection_margin)?;
        if !(self.period_tolerance >= 0.0 && self.period_tolerance < 0.25) {
            return Err(PitchError::InvalidParameter {
                name: "period_tolerance",
                value: self.period_tolerance,
            });
        }
        if !(self.harmonic_tolerance > 0.0 && self.harmonic_tolerance < 0.5) {
            return Err(PitchError::InvalidParameter {
                name: "harmonic_tolerance",
                value: self.harmonic_tolerance,
            });
        }
        if self.max_candidates == 0 {
            return Err(PitchError::InvalidParameter {
                name: "max_candidates",
                value: 0.0,
            });
        }
        if self.min_lag < 2 {
            return Err(PitchError::InvalidParameter {
                name: "min_lag",
                value: self.min_lag as f64,
            });
        }
        Ok(())
    }
}

/// How forgiving the stability filter is about pitch wobble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sensitivity {
    Strict,
    Normal,
    Forgiving,
}

impl Sensitivity {
    /// Allowed deviation from the median, as a fraction of it.
    pub fn tolerance(self) -> f64 {
        match self {
            Sensitivity::Strict => 0.03,
            Sensitivity::Normal => 0.05,
            Sensitivity::Forgiving => 0.08,
        }
    }
}

/// Stability filter configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StabilityConfig {
    /// Allowed deviation from the window median as a fraction of it (default: 0.05)
    pub tolerance: f64,

    /// Span of readings that must agree before locking, in ms (default: 200)
    pub window_ms: u64,

    /// Distance from an exact 2:1 or 1:2 ratio, as a fraction, within which a
    /// reading is an octave-tracking artifact (default: 0.05)
    pub octave_tolerance: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self::from_sensitivity(Sensitivity::Normal)
    }
}

impl StabilityConfig {
    pub fn from_sensitivity(sensitivity: Sensitivity) -> Self {
        Self {
            tolerance: sensitivity.tolerance(),
            window_ms: 200,
            octave_tolerance: 0.05,
        }
    }

    pub fn validate(&self) -> Result<(), PitchError> {
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err(PitchError::InvalidParameter {
                name: "tolerance",
                value: self.tolerance,
            });
        }
        if self.window_ms == 0 {
            return Err(PitchError::InvalidParameter {
                name: "window_ms",
                value: 0.0,
            });
        }
        if !(self.octave_tolerance >= 0.0 && self.octave_tolerance < 0.5) {
            return Err(PitchError::InvalidParameter {
                name: "octave_tolerance",
                value: self.octave_tolerance,
            });
        }
        Ok(())
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), PitchError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PitchError::InvalidParameter { name, value })
    }
}
