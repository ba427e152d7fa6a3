//! Construction-time errors.
//!
//! Detection itself never fails: a missing pitch is a regular
//! [Detection::NotDetected][crate::detector::Detection::NotDetected] outcome.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PitchError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,

    #[error("buffer of {len} samples is too short, at least {min} are required")]
    BufferTooShort { len: usize, min: usize },

    #[error("frequency range {min_hz} Hz - {max_hz} Hz is empty or not representable")]
    InvalidFrequencyRange { min_hz: f64, max_hz: f64 },

    #[error("invalid value {value} for `{name}`")]
    InvalidParameter { name: &'static str, value: f64 },
}
