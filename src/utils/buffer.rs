use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;

use crate::float::Float;

pub fn new_real_buffer<T: Float>(size: usize) -> Vec<T> {
    vec![T::zero(); size]
}

pub fn new_complex_buffer<T: Float>(size: usize) -> Vec<Complex<T>> {
    vec![Complex::zero(); size]
}

/// Load `input` into the real part of `output` and zero-pad the rest.
pub fn copy_real_to_complex<T: Float>(input: &[T], output: &mut [Complex<T>]) {
    assert!(input.len() <= output.len());
    input.iter().zip(output.iter_mut()).for_each(|(i, o)| {
        o.re = *i;
        o.im = T::zero();
    });
    output[input.len()..]
        .iter_mut()
        .for_each(|o| *o = Complex::zero())
}

/// Copy the real part of `input` to `output`. Only `output.len()` values are copied.
pub fn copy_complex_to_real<T: Float>(input: &[Complex<T>], output: &mut [T]) {
    assert!(output.len() <= input.len());
    input
        .iter()
        .map(|c| c.re)
        .zip(output.iter_mut())
        .for_each(|(i, o)| *o = i);
}

/// Compute the sum of the square of each element of `arr`.
pub fn square_sum<T: Float>(arr: &[T]) -> T {
    arr.iter().map(|&s| s * s).sum::<T>()
}

/// Root mean square level of `arr`. Zero for an empty slice.
pub fn rms<T: Float>(arr: &[T]) -> T {
    if arr.is_empty() {
        return T::zero();
    }
    (square_sum(arr) / T::from_count(arr.len())).sqrt()
}
