//! The complete detection pipeline: voicing gate, lag correlation, harmonic
//! disambiguation and sub-sample refinement.
//!
//! The detector owns its scratch buffers and is sized for one buffer length and
//! one sample rate. It keeps no result from one call to the next; `detect`
//! takes `&mut self` only to reuse those buffers.

use log::{debug, warn};

use crate::config::DetectorConfig;
use crate::detector::correlator::{LagCorrelator, LagRange};
use crate::detector::harmonic::Disambiguator;
use crate::detector::refine::refine_frequency;
use crate::detector::voicing::{Voicing, VoicingGate};
use crate::detector::{
    Detection, FrequencyRange, NoPitch, PitchDetector, PitchEstimate, SampleBuffer,
};
use crate::error::PitchError;
use crate::float::Float;
use crate::utils::buffer::rms;

pub struct LagDetector<T>
where
    T: Float,
{
    sample_rate_hz: u32,
    size: usize,
    gate: VoicingGate<T>,
    correlator: LagCorrelator<T>,
    disambiguator: Disambiguator<T>,
    range: FrequencyRange<T>,
}

impl<T> LagDetector<T>
where
    T: Float,
{
    /// A detector with the default configuration.
    pub fn new(sample_rate_hz: u32, size: usize) -> Result<Self, PitchError> {
        Self::with_config(&DetectorConfig::default(), sample_rate_hz, size)
    }

    pub fn with_config(
        config: &DetectorConfig,
        sample_rate_hz: u32,
        size: usize,
    ) -> Result<Self, PitchError> {
        config.validate()?;
        let lag_range = LagRange::new(
            sample_rate_hz,
            config.min_frequency_hz,
            config.max_frequency_hz,
            size,
            config.min_lag,
        )?;

        Ok(LagDetector {
            sample_rate_hz,
            size,
            gate: VoicingGate::new(T::cast(config.rms_threshold)),
            correlator: LagCorrelator::new(size, lag_range, config.stride_lag, config.method),
            disambiguator: Disambiguator::new(config),
            range: FrequencyRange::new(
                T::cast(config.min_frequency_hz),
                T::cast(config.max_frequency_hz),
            ),
        })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn lag_range(&self) -> LagRange {
        self.correlator.range()
    }

    pub fn frequency_range(&self) -> FrequencyRange<T> {
        self.range
    }
}

impl<T> PitchDetector<T> for LagDetector<T>
where
    T: Float,
{
    fn detect(&mut self, buffer: &SampleBuffer<T>) -> PitchEstimate<T> {
        let signal = buffer.samples();

        if signal.len() != self.size || buffer.sample_rate_hz() != self.sample_rate_hz {
            warn!(
                "ignoring buffer of {} samples at {} Hz, detector expects {} samples at {} Hz",
                signal.len(),
                buffer.sample_rate_hz(),
                self.size,
                self.sample_rate_hz
            );
            return PitchEstimate::not_detected(NoPitch::NoSignal, rms(signal));
        }

        // STEP 1: Voicing gate.
        let rms = match self.gate.check(signal) {
            Voicing::Voiced { rms } if rms > T::zero() => rms,
            voicing => {
                debug!("unvoiced buffer, rms {}", voicing.rms());
                return PitchEstimate::not_detected(NoPitch::NoSignal, voicing.rms());
            }
        };

        // STEP 2: Squared difference curve and its local minima.
        self.correlator.compute(signal);
        let minima = self.correlator.minima();
        if minima.is_empty() {
            debug!("no periodicity found, rms {}", rms);
            return PitchEstimate::not_detected(NoPitch::Unresolvable, rms);
        }

        // STEP 3: Harmonic disambiguation.
        let sample_rate = T::from_count(self.sample_rate_hz as usize);
        let energy = rms * rms * T::from_count(self.size);
        let candidates = self.disambiguator.rank(&minima, sample_rate, energy);
        let selected = match self.disambiguator.select(&candidates) {
            Some(selected) => selected,
            None => {
                debug!("all {} candidates rejected", candidates.len());
                return PitchEstimate {
                    detection: Detection::NotDetected(NoPitch::Unresolvable),
                    rms,
                    candidates,
                };
            }
        };

        // STEP 4: Parabolic refinement around the selected lag. A minimum is
        // only reported where the curve has both neighbours.
        let lag = selected.lag;
        let neighbours = (
            self.correlator.value_at(lag - 1),
            self.correlator.value_at(lag),
            self.correlator.value_at(lag + 1),
        );
        let detection = refine_frequency(lag, neighbours, sample_rate, &self.range);
        debug!(
            "selected lag {} ({} harmonics, quality {}): {:?}",
            lag, selected.harmonic_count, selected.quality, detection
        );

        PitchEstimate {
            detection,
            rms,
            candidates,
        }
    }
}
