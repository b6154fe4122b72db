use std::fmt;

use ndimage_numeric::SaturatedArithmetic;
use num_complex::Complex;
use num_traits::{Bounded, Float, Num, NumCast, PrimInt, ToPrimitive};

use crate::datatype::DataType;

/// Single-precision complex sample.
pub type SComplex = Complex<f32>;

/// Double-precision complex sample.
pub type DComplex = Complex<f64>;

/// A binary sample: one byte, zero is `false` and anything else is `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Bin(u8);

impl Bin {
    /// The `false` sample.
    pub const FALSE: Bin = Bin(0);
    /// The `true` sample.
    pub const TRUE: Bin = Bin(1);

    /// Creates a binary sample.
    pub const fn new(value: bool) -> Self {
        Bin(value as u8)
    }

    /// The truth value of the sample.
    pub const fn get(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for Bin {
    fn from(value: bool) -> Self {
        Bin::new(value)
    }
}

impl From<Bin> for bool {
    fn from(value: Bin) -> Self {
        value.get()
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get() as u8)
    }
}

impl SaturatedArithmetic for Bin {
    fn saturated_add(self, rhs: Self) -> Self {
        Bin::new(self.get() || rhs.get())
    }

    fn saturated_sub(self, rhs: Self) -> Self {
        Bin::new(self.get() && !rhs.get())
    }

    fn saturated_mul(self, rhs: Self) -> Self {
        Bin::new(self.get() && rhs.get())
    }

    fn saturated_div(self, rhs: Self) -> Self {
        Bin::new(self.get() || !rhs.get())
    }

    fn saturated_inv(self) -> Self {
        Bin::new(!self.get())
    }
}

/// A sample value of any type, widened so that no information is lost.
///
/// This is the pivot of [`clamp_cast`]: every sample converts into it exactly, and every
/// sample type can be built from it with saturation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    /// A binary value.
    Bin(bool),
    /// Any integer value.
    Int(i128),
    /// A real floating-point value.
    Float(f64),
    /// A complex value.
    Complex(DComplex),
}

impl SampleValue {
    /// The value as a real number; complex values give their modulus.
    pub fn as_f64(self) -> f64 {
        match self {
            SampleValue::Bin(b) => b as u8 as f64,
            SampleValue::Int(i) => i as f64,
            SampleValue::Float(f) => f,
            SampleValue::Complex(c) => c.norm(),
        }
    }

    /// The value as a complex number.
    pub fn as_complex(self) -> DComplex {
        match self {
            SampleValue::Complex(c) => c,
            v => Complex::new(v.as_f64(), 0.0),
        }
    }

    /// Whether the value is non-zero.
    pub fn as_bool(self) -> bool {
        match self {
            SampleValue::Bin(b) => b,
            SampleValue::Int(i) => i != 0,
            SampleValue::Float(f) => f != 0.0,
            SampleValue::Complex(c) => c.re != 0.0 || c.im != 0.0,
        }
    }
}

/// The element type of one of the thirteen [`DataType`]s.
///
/// Implemented for [`Bin`], `u8`, `i8`, `u16`, `i16`, `u32`, `i32`, `u64`, `i64`, `f32`, `f64`,
/// [`SComplex`] and [`DComplex`] only.
pub trait Sample: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The run-time tag of this type.
    const DATA_TYPE: DataType;

    /// Widens the sample without loss.
    fn to_value(self) -> SampleValue;

    /// Builds a sample from any value, saturating at the limits of the type.
    fn from_value(value: SampleValue) -> Self;
}

/// Integer and floating-point samples.
pub trait RealSample:
    Sample + PartialOrd + Num + NumCast + Bounded + SaturatedArithmetic + fmt::Display
{
}

/// Integer samples, excluding binary.
pub trait IntegerSample: RealSample + PrimInt {}

/// Floating-point samples.
pub trait FloatSample: RealSample + Float {}

/// Binary and real samples; everything that can be ordered.
pub trait NonComplexSample: Sample + PartialOrd + fmt::Display {}

/// Floating-point and complex samples.
pub trait FlexSample: Sample + Num {}

/// Complex samples.
pub trait ComplexSample: FlexSample {
    /// The type of the real and imaginary parts.
    type Real: FloatSample;

    /// Real part.
    fn re(self) -> Self::Real;

    /// Imaginary part.
    fn im(self) -> Self::Real;
}

impl Sample for Bin {
    const DATA_TYPE: DataType = DataType::Bin;

    #[inline]
    fn to_value(self) -> SampleValue {
        SampleValue::Bin(self.get())
    }

    #[inline]
    fn from_value(value: SampleValue) -> Self {
        Bin::new(value.as_bool())
    }
}

impl NonComplexSample for Bin {}

macro_rules! impl_integer_sample {
    ($($t:ty => $dt:ident),*) => {$(
        impl Sample for $t {
            const DATA_TYPE: DataType = DataType::$dt;

            #[inline]
            fn to_value(self) -> SampleValue {
                SampleValue::Int(self as i128)
            }

            #[inline]
            fn from_value(value: SampleValue) -> Self {
                match value {
                    SampleValue::Bin(b) => b as $t,
                    SampleValue::Int(i) => i.clamp(<$t>::MIN as i128, <$t>::MAX as i128) as $t,
                    // float to int `as` saturates, NaN becomes 0
                    SampleValue::Float(f) => f as $t,
                    SampleValue::Complex(c) => c.norm() as $t,
                }
            }
        }

        impl RealSample for $t {}
        impl IntegerSample for $t {}
        impl NonComplexSample for $t {}
    )*};
}

macro_rules! impl_float_sample {
    ($($t:ty => $dt:ident),*) => {$(
        impl Sample for $t {
            const DATA_TYPE: DataType = DataType::$dt;

            #[inline]
            fn to_value(self) -> SampleValue {
                SampleValue::Float(self as f64)
            }

            #[inline]
            fn from_value(value: SampleValue) -> Self {
                value.as_f64() as $t
            }
        }

        impl RealSample for $t {}
        impl FloatSample for $t {}
        impl NonComplexSample for $t {}
        impl FlexSample for $t {}
    )*};
}

macro_rules! impl_complex_sample {
    ($($f:ty => $dt:ident),*) => {$(
        impl Sample for Complex<$f> {
            const DATA_TYPE: DataType = DataType::$dt;

            #[inline]
            fn to_value(self) -> SampleValue {
                SampleValue::Complex(Complex::new(self.re as f64, self.im as f64))
            }

            #[inline]
            fn from_value(value: SampleValue) -> Self {
                let c = value.as_complex();
                Complex::new(c.re as $f, c.im as $f)
            }
        }

        impl FlexSample for Complex<$f> {}

        impl ComplexSample for Complex<$f> {
            type Real = $f;

            #[inline]
            fn re(self) -> $f {
                self.re
            }

            #[inline]
            fn im(self) -> $f {
                self.im
            }
        }
    )*};
}

impl_integer_sample!(
    u8 => UInt8, i8 => SInt8, u16 => UInt16, i16 => SInt16,
    u32 => UInt32, i32 => SInt32, u64 => UInt64, i64 => SInt64
);
impl_float_sample!(f32 => SFloat, f64 => DFloat);
impl_complex_sample!(f32 => SComplex, f64 => DComplex);

/// Casts a sample to another sample type, clamping to the range of the target.
///
/// - integers clamp to the target range;
/// - floats clamp and truncate when cast to integers, NaN becomes 0;
/// - any value cast to [`Bin`] is `true` when non-zero;
/// - complex values cast to a real type use their modulus;
/// - real values cast to complex get a zero imaginary part.
#[inline]
pub fn clamp_cast<T: Sample, S: Sample>(value: S) -> T {
    T::from_value(value.to_value())
}

/// Converts a real sample to `f64`. Never fails for the types implementing [`RealSample`].
#[inline]
pub fn real_to_f64<T: RealSample>(value: T) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
