use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::float::Float;
use crate::utils::buffer::{copy_complex_to_real, copy_real_to_complex, new_complex_buffer, square_sum};

/// FFT plans and buffers for the windowed correlation of signals of one fixed length.
/// Allocated once so that per-tick processing does not touch the allocator.
pub struct FftScratch<T>
where
    T: Float,
{
    pub size: usize,
    forward: Arc<dyn Fft<T>>,
    inverse: Arc<dyn Fft<T>>,
    signal: Vec<Complex<T>>,
    truncated: Vec<Complex<T>>,
    scratch: Vec<Complex<T>>,
}

impl<T> FftScratch<T>
where
    T: Float,
{
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        FftScratch {
            size,
            forward,
            inverse,
            signal: new_complex_buffer(size),
            truncated: new_complex_buffer(size),
            scratch: new_complex_buffer(scratch_len),
        }
    }

    /// Compute the windowed autocorrelation of `signal` and put the result in `result`.
    /// For a signal _x=(x_0,x_1,...)_, the windowed autocorrelation with window size _w_ is
    /// the function
    ///
    /// > r(t) = sum_{i=0}^{w-1} x_i*x_{i+t}
    ///
    /// `result` may hold at most `signal.len() - window_size + 1` lags.
    pub fn windowed_autocorrelation(&mut self, signal: &[T], window_size: usize, result: &mut [T]) {
        assert_eq!(signal.len(), self.size, "FFT plans were made for another length");
        assert!(result.len() <= signal.len() - window_size + 1);

        // The windowed autocorrelation is the cross correlation between
        // the original signal and the signal truncated to lie in `0..window_size`
        copy_real_to_complex(signal, &mut self.signal);
        copy_real_to_complex(&signal[..window_size], &mut self.truncated);
        self.forward
            .process_with_scratch(&mut self.signal, &mut self.scratch);
        self.forward
            .process_with_scratch(&mut self.truncated, &mut self.scratch);

        // rustfft doesn't normalize, and fft -> inverse fft scales by `signal.len()`.
        let normalization_const = T::one() / T::from_count(signal.len());
        self.signal
            .iter_mut()
            .zip(self.truncated.iter())
            .for_each(|(a, b)| {
                *a = *a * normalization_const * b.conj();
            });
        self.inverse
            .process_with_scratch(&mut self.signal, &mut self.scratch);

        copy_complex_to_real(&self.signal, result);
    }

    /// Compute the windowed square error, _d(t)_, of `signal`. For a window size of _w_ and a signal
    /// _x=(x_0,x_1,...)_, this is defined by
    ///
    ///  > d(t) = sum_{i=0}^{w-1} (x_i - x_{i+t})^2
    ///
    /// and is obtained as `pow_0^w + pow_t^{t+w} - 2 * r(t)`, where `pow_a^b` is the
    /// power of `signal` on `a..b`.
    pub fn windowed_square_error(&mut self, signal: &[T], window_size: usize, result: &mut [T]) {
        assert!(
            2 * window_size <= signal.len(),
            "The window size cannot be more than half the signal length"
        );

        let two = T::cast(2.0);

        self.windowed_autocorrelation(signal, window_size, result);
        let power = square_sum(&signal[..window_size]);
        let mut windowed_power = power;

        let last = result.len().saturating_sub(1);
        for (t, a) in result.iter_mut().enumerate() {
            *a = power + windowed_power - two * *a;
            // Slide pow_t^{t+w} to pow_{t+1}^{t+1+w} by its boundary terms.
            if t < last {
                windowed_power = windowed_power - signal[t] * signal[t]
                    + signal[t + window_size] * signal[t + window_size];
            }
        }
    }
}
