use num_traits::PrimInt;

/// Greatest common divisor of two integers, always non-negative.
///
/// `gcd(0, 0)` is `0`.
pub fn gcd<T: PrimInt>(a: T, b: T) -> T {
    let mut a = abs(a);
    let mut b = abs(b);
    while b != T::zero() {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Integer division rounding towards positive infinity.
///
/// # Panics
///
/// Panics if `rhs` is zero, like the `/` operator.
pub fn div_ceil<T: PrimInt>(lhs: T, rhs: T) -> T {
    let q = lhs / rhs;
    let r = lhs % rhs;
    if r != T::zero() && ((r > T::zero()) == (rhs > T::zero())) {
        q + T::one()
    } else {
        q
    }
}

/// Integer division rounding towards negative infinity.
///
/// # Panics
///
/// Panics if `rhs` is zero, like the `/` operator.
pub fn div_floor<T: PrimInt>(lhs: T, rhs: T) -> T {
    let q = lhs / rhs;
    let r = lhs % rhs;
    if r != T::zero() && ((r < T::zero()) != (rhs < T::zero())) {
        q - T::one()
    } else {
        q
    }
}

/// Integer division rounding to the nearest integer, halves rounded up.
pub fn div_round<T: PrimInt>(lhs: T, rhs: T) -> T {
    let two = T::one() + T::one();
    div_floor(lhs + rhs / two, rhs)
}

/// Rounds `value` up to the next multiple of `multiple`.
pub fn round_up(value: usize, multiple: usize) -> usize {
    if multiple <= 1 {
        return value;
    }
    div_ceil(value, multiple) * multiple
}

/// Indices that sort `values` in ascending order. Equal values keep their relative order.
///
/// Values that do not compare, such as NaN, are treated as equal to everything.
pub fn sort_indices<T: PartialOrd>(values: &[T]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

fn abs<T: PrimInt>(v: T) -> T {
    if v < T::zero() {
        T::zero() - v
    } else {
        v
    }
}
