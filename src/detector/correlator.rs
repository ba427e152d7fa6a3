//! The lag correlator measures how well a signal lines up with a shifted copy of
//! itself. Let $S=(s_0,s_1,\ldots,s_{N-1})$ be a discrete signal. For every lag $t$
//! in the supported range it computes the squared difference over the first half
//! of the buffer,
//! $$ d(t) = \sum_{i=0}^{N/2-1} (s_i-s_{i+t})^2, $$
//! which dips towards zero wherever $t$ is a multiple of the period. The local
//! minima of $d$ are the candidate periods handed to the
//! [harmonic disambiguator][crate::detector::harmonic]. The curve is evaluated
//! one lag beyond each end of the range, so that the range limits themselves
//! can be minima.
//!
//! ## Implementation
//! [CorrelationMethod::Direct] sums directly, sampling every second term once the
//! lag is long enough that a high frequency can no longer be aliased away.
//! Strided sums are scaled by the stride so the curve keeps one scale across the
//! stride boundary.
//!
//! [CorrelationMethod::Fft] computes the exact curve from an FFT windowed
//! autocorrelation, which pays off for long buffers.

use std::cmp::Ordering;

use crate::config::CorrelationMethod;
use crate::detector::internals::FftScratch;
use crate::error::PitchError;
use crate::float::Float;
use crate::utils::buffer::new_real_buffer;
use crate::utils::peak::detect_minima;

/// Inclusive range of lags, in samples, that the correlator evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    pub min_lag: usize,
    pub max_lag: usize,
}

impl LagRange {
    /// Lags covering `min_frequency_hz..=max_frequency_hz` for buffers of `size`
    /// samples. The shortest lag is at least `floor_lag` and the longest at most
    /// half the buffer.
    pub fn new(
        sample_rate_hz: u32,
        min_frequency_hz: f64,
        max_frequency_hz: f64,
        size: usize,
        floor_lag: usize,
    ) -> Result<Self, PitchError> {
        if sample_rate_hz == 0 {
            return Err(PitchError::InvalidSampleRate);
        }
        if !(min_frequency_hz > 0.0 && min_frequency_hz < max_frequency_hz) {
            return Err(PitchError::InvalidFrequencyRange {
                min_hz: min_frequency_hz,
                max_hz: max_frequency_hz,
            });
        }

        let sample_rate = sample_rate_hz as f64;
        let min_lag = ((sample_rate / max_frequency_hz).floor() as usize).max(floor_lag);
        let max_lag = ((sample_rate / min_frequency_hz).floor() as usize).min(size / 2);

        // A minimum needs a neighbour on each side.
        if max_lag < min_lag + 2 {
            return Err(PitchError::BufferTooShort {
                len: size,
                min: 2 * (min_lag + 2),
            });
        }
        Ok(LagRange { min_lag, max_lag })
    }

    pub fn contains(&self, lag: usize) -> bool {
        (self.min_lag..=self.max_lag).contains(&lag)
    }
}

/// A local minimum of the squared difference curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagMinimum<T: Float> {
    pub lag: usize,
    pub value: T,
}

pub struct LagCorrelator<T>
where
    T: Float,
{
    size: usize,
    range: LagRange,
    stride_lag: usize,
    /// `range` widened by one lag on each side, within half the buffer.
    first_lag: usize,
    last_lag: usize,
    /// Indexed by lag; only `first_lag..=last_lag` is meaningful.
    curve: Vec<T>,
    fft: Option<FftScratch<T>>,
}

impl<T> LagCorrelator<T>
where
    T: Float,
{
    pub fn new(size: usize, range: LagRange, stride_lag: usize, method: CorrelationMethod) -> Self {
        let fft = match method {
            CorrelationMethod::Direct => None,
            CorrelationMethod::Fft => Some(FftScratch::new(size)),
        };
        let first_lag = range.min_lag.saturating_sub(1);
        let last_lag = (range.max_lag + 1).min(size / 2).max(range.max_lag);
        LagCorrelator {
            size,
            range,
            stride_lag,
            first_lag,
            last_lag,
            curve: new_real_buffer(last_lag + 1),
            fft,
        }
    }

    pub fn range(&self) -> LagRange {
        self.range
    }

    /// The squared difference value at `lag` from the last call to [compute][Self::compute].
    /// Valid one lag beyond each end of the range where the buffer allows it.
    pub fn value_at(&self, lag: usize) -> T {
        self.curve[lag]
    }

    /// The curve over the lag range, starting at `range().min_lag`.
    pub fn curve(&self) -> &[T] {
        &self.curve[self.range.min_lag..=self.range.max_lag]
    }

    /// Fill the squared difference curve for `signal`.
    pub fn compute(&mut self, signal: &[T]) {
        assert_eq!(signal.len(), self.size);
        let window_size = self.size / 2;

        match self.fft.as_mut() {
            Some(fft) => fft.windowed_square_error(signal, window_size, &mut self.curve),
            None => {
                for lag in self.first_lag..=self.last_lag {
                    let stride = if lag >= self.stride_lag { 2 } else { 1 };
                    let sum = (0..window_size)
                        .step_by(stride)
                        .map(|i| {
                            let diff = signal[i] - signal[i + lag];
                            diff * diff
                        })
                        .sum::<T>();
                    self.curve[lag] = sum * T::from_count(stride);
                }
            }
        }
    }

    /// Local minima of the current curve, strongest (lowest) first.
    /// Equal values stay in ascending lag order.
    pub fn minima(&self) -> Vec<LagMinimum<T>> {
        let first_lag = self.first_lag;
        let range = self.range;
        let mut minima: Vec<LagMinimum<T>> =
            detect_minima(&self.curve[first_lag..=self.last_lag])
                .map(|(i, value)| LagMinimum {
                    lag: i + first_lag,
                    value,
                })
                .filter(|m| range.contains(m.lag))
                .collect();
        minima.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));
        minima
    }
}
