//! Integer arithmetic that clamps at the limits of the type.
//!
//! Floating-point types implement the trait with the plain operators, so generic line filters
//! can use the same calls for every real sample type.

/// Arithmetic whose integer results are clamped to the range of the type.
pub trait SaturatedArithmetic: Copy {
    /// `self + rhs`, clamped.
    fn saturated_add(self, rhs: Self) -> Self;

    /// `self - rhs`, clamped. Unsigned subtraction never goes below zero.
    fn saturated_sub(self, rhs: Self) -> Self;

    /// `self * rhs`, clamped.
    fn saturated_mul(self, rhs: Self) -> Self;

    /// `self / rhs`, clamped.
    ///
    /// Integer division by zero saturates to the limit in the direction of the sign of `self`,
    /// and `0 / 0` is `0`.
    fn saturated_div(self, rhs: Self) -> Self;

    /// Inversion: `max - self` for unsigned integers, clamped negation otherwise.
    fn saturated_inv(self) -> Self;
}

macro_rules! impl_saturated_unsigned {
    ($($t:ty),*) => {$(
        impl SaturatedArithmetic for $t {
            #[inline]
            fn saturated_add(self, rhs: Self) -> Self {
                self.saturating_add(rhs)
            }

            #[inline]
            fn saturated_sub(self, rhs: Self) -> Self {
                self.saturating_sub(rhs)
            }

            #[inline]
            fn saturated_mul(self, rhs: Self) -> Self {
                self.saturating_mul(rhs)
            }

            #[inline]
            fn saturated_div(self, rhs: Self) -> Self {
                match self.checked_div(rhs) {
                    Some(v) => v,
                    None if self == 0 => 0,
                    None => <$t>::MAX,
                }
            }

            #[inline]
            fn saturated_inv(self) -> Self {
                <$t>::MAX - self
            }
        }
    )*};
}

macro_rules! impl_saturated_signed {
    ($($t:ty),*) => {$(
        impl SaturatedArithmetic for $t {
            #[inline]
            fn saturated_add(self, rhs: Self) -> Self {
                self.saturating_add(rhs)
            }

            #[inline]
            fn saturated_sub(self, rhs: Self) -> Self {
                self.saturating_sub(rhs)
            }

            #[inline]
            fn saturated_mul(self, rhs: Self) -> Self {
                self.saturating_mul(rhs)
            }

            #[inline]
            fn saturated_div(self, rhs: Self) -> Self {
                if rhs == 0 {
                    return match self.signum() {
                        0 => 0,
                        1 => <$t>::MAX,
                        _ => <$t>::MIN,
                    };
                }
                self.saturating_div(rhs)
            }

            #[inline]
            fn saturated_inv(self) -> Self {
                self.saturating_neg()
            }
        }
    )*};
}

macro_rules! impl_saturated_float {
    ($($t:ty),*) => {$(
        impl SaturatedArithmetic for $t {
            #[inline]
            fn saturated_add(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn saturated_sub(self, rhs: Self) -> Self {
                self - rhs
            }

            #[inline]
            fn saturated_mul(self, rhs: Self) -> Self {
                self * rhs
            }

            #[inline]
            fn saturated_div(self, rhs: Self) -> Self {
                self / rhs
            }

            #[inline]
            fn saturated_inv(self) -> Self {
                -self
            }
        }
    )*};
}

impl_saturated_unsigned!(u8, u16, u32, u64);
impl_saturated_signed!(i8, i16, i32, i64);
impl_saturated_float!(f32, f64);

/// Adds two values, clamping integer overflow.
#[inline]
pub fn saturated_add<T: SaturatedArithmetic>(lhs: T, rhs: T) -> T {
    lhs.saturated_add(rhs)
}

/// Subtracts two values, clamping integer overflow.
#[inline]
pub fn saturated_sub<T: SaturatedArithmetic>(lhs: T, rhs: T) -> T {
    lhs.saturated_sub(rhs)
}

/// Multiplies two values, clamping integer overflow.
#[inline]
pub fn saturated_mul<T: SaturatedArithmetic>(lhs: T, rhs: T) -> T {
    lhs.saturated_mul(rhs)
}

/// Divides two values, clamping integer overflow and division by zero.
#[inline]
pub fn saturated_div<T: SaturatedArithmetic>(lhs: T, rhs: T) -> T {
    lhs.saturated_div(rhs)
}

/// Inverts a value within the range of its type.
#[inline]
pub fn saturated_inv<T: SaturatedArithmetic>(v: T) -> T {
    v.saturated_inv()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturated_add() {
        assert_eq!(saturated_add(50u8, 20u8), 70u8);
        assert_eq!(saturated_add(250u8, 20u8), 255u8);
        assert_eq!(saturated_add(250i16, 20i16), 270i16);
        assert_eq!(saturated_add(30000i16, 10000i16), 32767i16);
        assert_eq!(saturated_add(100i8, -30i8), 70i8);
        assert_eq!(saturated_add(1.5f32, 2.0f32), 3.5f32);
    }

    #[test]
    fn test_saturated_sub() {
        assert_eq!(saturated_sub(20u16, 10u16), 10u16);
        assert_eq!(saturated_sub(10u16, 20u16), 0u16);
        assert_eq!(saturated_sub(10i16, 20i16), -10i16);
        assert_eq!(saturated_sub(10_000u32, 20_000u32), 0u32);
    }

    #[test]
    fn test_saturated_mul() {
        assert_eq!(saturated_mul(300i16, 100i16), 30000i16);
        assert_eq!(saturated_mul(300i16, -100i16), -30000i16);
        assert_eq!(saturated_mul(300i16, 1000i16), 32767i16);
        assert_eq!(saturated_mul(300i16, -1000i16), -32768i16);
        assert_eq!(saturated_mul(300u16, 1000u16), 65535u16);
    }

    #[test]
    fn test_saturated_div() {
        assert_eq!(saturated_div(300i16, 10i16), 30i16);
        assert_eq!(saturated_div(i16::MIN, -1i16), i16::MAX);
        assert_eq!(saturated_div(5i32, 0i32), i32::MAX);
        assert_eq!(saturated_div(-5i32, 0i32), i32::MIN);
        assert_eq!(saturated_div(0i32, 0i32), 0);
        assert_eq!(saturated_div(5u8, 0u8), u8::MAX);
        assert_eq!(saturated_div(0u8, 0u8), 0);
    }

    #[test]
    fn test_saturated_inv() {
        assert_eq!(saturated_inv(300i16), -300i16);
        assert_eq!(saturated_inv(-32768i16), 32767i16);
        assert_eq!(saturated_inv(-32767i16), 32767i16);
        assert_eq!(saturated_inv(300u16), 65235u16);
        assert_eq!(saturated_inv(2.0f64), -2.0f64);
    }
}
