//! Difference-function minima fire at every multiple of the period, and with
//! vowel-like signals also at fractions of it when an overtone is stronger than
//! the fundamental. The disambiguator re-ranks the minima by harmonic support and
//! picks the most plausible fundamental.
//!
//! Each candidate gets a normalized *quality*, its curve value divided by
//! `rms² · N`: about 1 for an uncorrelated lag and 0 for a perfect period.
//!
//! 1. Minima outside the supported range are dropped.
//! 2. A candidate whose lag sits on a whole multiple of a shorter candidate's
//!    lag, with a quality not meaningfully better, is an echo of that period and
//!    is dropped as well. Multiples are matched in the lag domain, so integer
//!    rounding of a long lag does not hide the relation.
//! 3. The strongest survivors are scored by how many other candidates lie near
//!    integer multiples of their frequency.
//! 4. The walk over the re-sorted candidates only considers candidates close
//!    to the best quality, skips low, unsupported, weak candidates (rumble) and
//!    prefers the vocal band.

use std::cmp::Ordering;

use log::trace;
use rustfft::num_traits::Float as NumFloat;

use crate::config::DetectorConfig;
use crate::detector::correlator::LagMinimum;
use crate::detector::FrequencyRange;
use crate::float::Float;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate<T> {
    pub frequency_hz: T,
    pub lag: usize,
    /// Raw squared difference value at `lag`.
    pub correlation: T,
    /// `correlation / (rms² · N)`, lower is better.
    pub quality: T,
    pub harmonic_count: usize,
}

pub struct Disambiguator<T>
where
    T: Float,
{
    range: FrequencyRange<T>,
    preferred: FrequencyRange<T>,
    harmonic_tolerance: T,
    noise_quality: T,
    confident_quality: T,
    confident_harmonic_count: usize,
    subharmonic_margin: T,
    subharmonic_ratio: T,
    period_tolerance: T,
    selection_margin: T,
    max_candidates: usize,
}

impl<T> Disambiguator<T>
where
    T: Float,
{
    pub fn new(config: &DetectorConfig) -> Self {
        Disambiguator {
            range: FrequencyRange::new(
                T::cast(config.min_frequency_hz),
                T::cast(config.max_frequency_hz),
            ),
            preferred: FrequencyRange::new(
                T::cast(config.preferred_low_hz),
                T::cast(config.preferred_high_hz),
            ),
            harmonic_tolerance: T::cast(config.harmonic_tolerance),
            noise_quality: T::cast(config.noise_quality),
            confident_quality: T::cast(config.confident_quality),
            confident_harmonic_count: config.confident_harmonic_count,
            subharmonic_margin: T::cast(config.subharmonic_margin),
            subharmonic_ratio: T::cast(config.subharmonic_ratio),
            period_tolerance: T::cast(config.period_tolerance),
            selection_margin: T::cast(config.selection_margin),
            max_candidates: config.max_candidates,
        }
    }

    /// `upper` lies close to an integer multiple (at least 2) of `lower`.
    pub fn is_harmonic(&self, lower: T, upper: T) -> bool {
        let ratio = upper / lower;
        let nearest = ratio.round();
        nearest >= T::cast(2.0) && NumFloat::abs(ratio - nearest) < self.harmonic_tolerance
    }

    /// `longer` lies close to a whole multiple (at least 2) of `shorter`: the
    /// period it implies is within `period_tolerance` of `shorter`, or within
    /// one sample for short lags.
    pub fn is_period_multiple(&self, shorter: usize, longer: usize) -> bool {
        if shorter == 0 || longer <= shorter {
            return false;
        }
        let shorter = T::from_count(shorter);
        let longer = T::from_count(longer);
        let multiple = (longer / shorter).round();
        if multiple < T::cast(2.0) {
            return false;
        }
        let slack = NumFloat::max(T::one(), self.period_tolerance * shorter);
        NumFloat::abs(longer / multiple - shorter) <= slack
    }

    /// Turn sorted minima into scored candidates, strongest correlation first.
    /// `energy` is `rms² · N` of the analyzed buffer and must be positive.
    pub fn rank(&self, minima: &[LagMinimum<T>], sample_rate: T, energy: T) -> Vec<Candidate<T>> {
        let in_range: Vec<Candidate<T>> = minima
            .iter()
            .map(|m| Candidate {
                frequency_hz: sample_rate / T::from_count(m.lag),
                lag: m.lag,
                correlation: m.value,
                quality: m.value / energy,
                harmonic_count: 0,
            })
            .filter(|c| self.range.contains(c.frequency_hz))
            .collect();

        let mut candidates: Vec<Candidate<T>> = in_range
            .iter()
            .filter(|c| !self.is_echo(c, &in_range))
            .take(self.max_candidates)
            .copied()
            .collect();

        let frequencies: Vec<T> = candidates.iter().map(|c| c.frequency_hz).collect();
        for (i, candidate) in candidates.iter_mut().enumerate() {
            let fundamental = candidate.frequency_hz;
            candidate.harmonic_count = frequencies
                .iter()
                .enumerate()
                .filter(|&(j, &f)| j != i && self.is_harmonic(fundamental, f))
                .count();
        }

        trace!(
            "{} minima, {} in range, {} candidates: {:?}",
            minima.len(),
            in_range.len(),
            candidates.len(),
            candidates
                .iter()
                .map(|c| (c.frequency_hz, c.quality, c.harmonic_count))
                .collect::<Vec<_>>()
        );
        candidates
    }

    /// Pick the most plausible fundamental among ranked candidates. Only
    /// candidates within `selection_margin` of the best quality can be picked;
    /// weaker ones still count as harmonic support.
    pub fn select(&self, candidates: &[Candidate<T>]) -> Option<Candidate<T>> {
        let mut order: Vec<&Candidate<T>> = candidates.iter().collect();
        order.sort_by(|a, b| {
            b.harmonic_count.cmp(&a.harmonic_count).then(
                a.correlation
                    .partial_cmp(&b.correlation)
                    .unwrap_or(Ordering::Equal),
            )
        });

        let floor = candidates
            .iter()
            .map(|c| c.quality)
            .fold(T::infinity(), NumFloat::min);
        let cutoff = floor + self.selection_margin;

        let mut best: Option<&Candidate<T>> = None;
        for candidate in order {
            if self.is_noise(candidate) || candidate.quality > cutoff {
                continue;
            }
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    let in_band = self.preferred.contains(candidate.frequency_hz);
                    let current_in_band = self.preferred.contains(current.frequency_hz);
                    if (in_band && !current_in_band)
                        || (in_band == current_in_band
                            && candidate.harmonic_count > current.harmonic_count)
                    {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
            if best.map_or(false, |b| self.is_confident(b)) {
                break;
            }
        }
        best.copied()
    }

    /// Low, unsupported and weakly correlated: rumble rather than a voice.
    pub fn is_noise(&self, candidate: &Candidate<T>) -> bool {
        candidate.frequency_hz < self.preferred.min_hz
            && candidate.harmonic_count == 0
            && candidate.quality > self.noise_quality
    }

    fn is_confident(&self, candidate: &Candidate<T>) -> bool {
        self.preferred.contains(candidate.frequency_hz)
            && candidate.harmonic_count >= self.confident_harmonic_count
            && candidate.quality < self.confident_quality
    }

    fn is_echo(&self, candidate: &Candidate<T>, all: &[Candidate<T>]) -> bool {
        let allowed =
            candidate.quality * (T::one() + self.subharmonic_ratio) + self.subharmonic_margin;
        all.iter().any(|other| {
            self.is_period_multiple(other.lag, candidate.lag) && other.quality <= allowed
        })
    }
}
