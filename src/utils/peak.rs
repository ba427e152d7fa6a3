use crate::float::Float;

pub struct Point<T: Float> {
    pub x: T,
    pub y: T,
}

/// Local minima of `arr`: interior indices whose value is strictly below both
/// neighbours. Yields `(index, value)` in ascending index order.
pub fn detect_minima<'a, T: Float>(arr: &'a [T]) -> impl Iterator<Item = (usize, T)> + 'a {
    arr.windows(3)
        .enumerate()
        .filter(|(_, win)| win[1] < win[0] && win[1] < win[2])
        .map(|(i, win)| (i + 1, win[1]))
}

/// Vertex of the parabola through three equally spaced points.
/// The shift relative to `center.x` is non-finite when the points are collinear.
pub fn quadratic_interpolation<T: Float>(
    left: Point<T>,
    center: Point<T>,
    right: Point<T>,
) -> Point<T> {
    let shift = T::cast(0.5) * (right.y - left.y) / (T::cast(2.0) * center.y - left.y - right.y);
    let x = center.x + shift;
    let y = center.y + T::cast(0.25) * (right.y - left.y) * shift;
    Point { x, y }
}
