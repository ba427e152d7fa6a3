//! Sub-sample refinement of the selected lag. A parabola through the curve
//! values at `lag - 1`, `lag` and `lag + 1` places the true minimum between
//! samples, which matters most for high voices where one lag step is several
//! cents wide.

use log::debug;

use crate::detector::{Detection, FrequencyRange, NoPitch};
use crate::float::Float;
use crate::utils::peak::{quadratic_interpolation, Point};

/// Refined lag for the minimum at `lag` with neighbours `y0` (at `lag - 1`) and
/// `y2` (at `lag + 1`). Falls back to `lag` when the parabola is degenerate.
pub fn refine_lag<T: Float>(lag: usize, y0: T, y1: T, y2: T) -> T {
    let center = T::from_count(lag);
    let vertex = quadratic_interpolation(
        Point {
            x: center - T::one(),
            y: y0,
        },
        Point { x: center, y: y1 },
        Point {
            x: center + T::one(),
            y: y2,
        },
    );
    if vertex.x.is_finite() && vertex.x > T::zero() {
        vertex.x
    } else {
        center
    }
}

/// Frequency of the minimum at `lag`, refined when the refinement stays inside `range`.
pub fn refine_frequency<T: Float>(
    lag: usize,
    (y0, y1, y2): (T, T, T),
    sample_rate: T,
    range: &FrequencyRange<T>,
) -> Detection<T> {
    let refined = sample_rate / refine_lag(lag, y0, y1, y2);
    if range.contains(refined) {
        return Detection::Detected(refined);
    }

    let coarse = sample_rate / T::from_count(lag);
    debug!(
        "refined frequency {} Hz out of range, falling back to {} Hz",
        refined, coarse
    );
    if range.contains(coarse) {
        Detection::Detected(coarse)
    } else {
        Detection::NotDetected(NoPitch::OutOfRange)
    }
}
