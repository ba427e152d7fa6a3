//! Generic [Float] type which acts as a stand-in for `f32` or `f64`.
use rustfft::num_traits::Float as NumFloat;
use rustfft::FftNum;
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Signals are processed as arrays of [Float]s. A [Float] is normally `f32` or `f64`.
///
/// `abs` and `signum` exist on both `num_traits::Float` and `Signed`; call them as
/// `NumFloat::abs(x)` inside generic code.
pub trait Float: Display + Debug + NumFloat + FftNum + Sum {
    /// Convert a tuning constant. Lossy for `f32`.
    fn cast(value: f64) -> Self;

    /// Convert a sample count or lag.
    fn from_count(count: usize) -> Self;
}

impl Float for f64 {
    fn cast(value: f64) -> Self {
        value
    }

    fn from_count(count: usize) -> Self {
        count as f64
    }
}

impl Float for f32 {
    fn cast(value: f64) -> Self {
        value as f32
    }

    fn from_count(count: usize) -> Self {
        count as f32
    }
}
