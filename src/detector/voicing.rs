//! The voicing gate decides whether a buffer carries enough energy to be worth
//! analyzing. Upstream gain normalization is the capture side's job, so the
//! threshold is an absolute RMS level.

use crate::float::Float;
use crate::utils::buffer::rms;

#[derive(Debug, Clone, Copy)]
pub struct VoicingGate<T: Float> {
    threshold: T,
}

/// Result of gating one buffer. The level is reported either way so callers
/// can drive level meters while unvoiced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Voicing<T: Float> {
    Voiced { rms: T },
    Unvoiced { rms: T },
}

impl<T: Float> Voicing<T> {
    pub fn rms(&self) -> T {
        match *self {
            Voicing::Voiced { rms } | Voicing::Unvoiced { rms } => rms,
        }
    }

    pub fn is_voiced(&self) -> bool {
        matches!(self, Voicing::Voiced { .. })
    }
}

impl<T: Float> VoicingGate<T> {
    pub fn new(threshold: T) -> Self {
        VoicingGate { threshold }
    }

    pub fn threshold(&self) -> T {
        self.threshold
    }

    pub fn check(&self, signal: &[T]) -> Voicing<T> {
        let rms = rms(signal);
        if rms < self.threshold {
            Voicing::Unvoiced { rms }
        } else {
            Voicing::Voiced { rms }
        }
    }
}
