//! Selecting a monomorphized implementation from a run-time [`DataType`].
//!
//! An algorithm is written once as a generic function over a sample type. To call it for an
//! image whose type is only known at run time, wrap the call in a visitor and hand it to the
//! dispatcher for the family of types the algorithm supports:
//!
//! ```rust
//! use ndimage_core::{dispatch_real, DataType, RealSample, RealVisitor};
//!
//! struct MaxValue;
//!
//! impl RealVisitor for MaxValue {
//!     type Output = f64;
//!
//!     fn visit<T: RealSample>(self) -> f64 {
//!         num_traits::ToPrimitive::to_f64(&T::max_value()).unwrap_or(0.0)
//!     }
//! }
//!
//! assert_eq!(dispatch_real(DataType::UInt8, MaxValue).unwrap(), 255.0);
//! assert!(dispatch_real(DataType::SComplex, MaxValue).is_err());
//! ```
//!
//! The `match` happens once per call; inside `visit` the code is fully typed. Visitors commonly
//! return a boxed trait object, such as a line filter, so the caller never names the type.

use crate::datatype::DataType;
use crate::error::CoreError;
use crate::sample::{
    Bin, ComplexSample, DComplex, FlexSample, FloatSample, IntegerSample, NonComplexSample,
    RealSample, SComplex, Sample,
};

/// A generic operation over every sample type.
pub trait SampleVisitor {
    /// Result of the operation.
    type Output;

    /// Runs the operation for sample type `T`.
    fn visit<T: Sample>(self) -> Self::Output;
}

/// Calls `visitor` with the sample type of `data_type`. Covers all types, so it cannot fail.
pub fn dispatch<V: SampleVisitor>(data_type: DataType, visitor: V) -> V::Output {
    match data_type {
        DataType::Bin => visitor.visit::<Bin>(),
        DataType::UInt8 => visitor.visit::<u8>(),
        DataType::SInt8 => visitor.visit::<i8>(),
        DataType::UInt16 => visitor.visit::<u16>(),
        DataType::SInt16 => visitor.visit::<i16>(),
        DataType::UInt32 => visitor.visit::<u32>(),
        DataType::SInt32 => visitor.visit::<i32>(),
        DataType::UInt64 => visitor.visit::<u64>(),
        DataType::SInt64 => visitor.visit::<i64>(),
        DataType::SFloat => visitor.visit::<f32>(),
        DataType::DFloat => visitor.visit::<f64>(),
        DataType::SComplex => visitor.visit::<SComplex>(),
        DataType::DComplex => visitor.visit::<DComplex>(),
    }
}

macro_rules! family_dispatch {
    (
        $(#[$trait_doc:meta])* $visitor:ident,
        $(#[$fn_doc:meta])* $func:ident,
        $bound:ident, $family:literal,
        [$($dt:ident => $t:ty),* $(,)?]
    ) => {
        $(#[$trait_doc])*
        pub trait $visitor {
            /// Result of the operation.
            type Output;

            /// Runs the operation for sample type `T`.
            fn visit<T: $bound>(self) -> Self::Output;
        }

        $(#[$fn_doc])*
        ///
        /// # Errors
        ///
        /// Returns [`CoreError::DataTypeNotSupported`] if `data_type` is outside the family.
        pub fn $func<V: $visitor>(data_type: DataType, visitor: V) -> Result<V::Output, CoreError> {
            match data_type {
                $(DataType::$dt => Ok(visitor.visit::<$t>()),)*
                #[allow(unreachable_patterns)]
                other => Err(CoreError::data_type_not_supported(other, $family)),
            }
        }
    };
}

family_dispatch!(
    /// A generic operation over integer and float sample types.
    RealVisitor,
    /// Calls `visitor` with the sample type of `data_type`, which must be real.
    dispatch_real,
    RealSample, "real",
    [
        UInt8 => u8, SInt8 => i8, UInt16 => u16, SInt16 => i16, UInt32 => u32,
        SInt32 => i32, UInt64 => u64, SInt64 => i64, SFloat => f32, DFloat => f64,
    ]
);

family_dispatch!(
    /// A generic operation over binary and real sample types.
    NonComplexVisitor,
    /// Calls `visitor` with the sample type of `data_type`, which must not be complex.
    dispatch_non_complex,
    NonComplexSample, "non-complex",
    [
        Bin => Bin, UInt8 => u8, SInt8 => i8, UInt16 => u16, SInt16 => i16, UInt32 => u32,
        SInt32 => i32, UInt64 => u64, SInt64 => i64, SFloat => f32, DFloat => f64,
    ]
);

family_dispatch!(
    /// A generic operation over integer sample types.
    IntegerVisitor,
    /// Calls `visitor` with the sample type of `data_type`, which must be an integer type.
    dispatch_integer,
    IntegerSample, "integer",
    [
        UInt8 => u8, SInt8 => i8, UInt16 => u16, SInt16 => i16, UInt32 => u32,
        SInt32 => i32, UInt64 => u64, SInt64 => i64,
    ]
);

family_dispatch!(
    /// A generic operation over floating-point sample types.
    FloatVisitor,
    /// Calls `visitor` with the sample type of `data_type`, which must be a float type.
    dispatch_float,
    FloatSample, "float",
    [SFloat => f32, DFloat => f64]
);

family_dispatch!(
    /// A generic operation over float and complex sample types.
    FlexVisitor,
    /// Calls `visitor` with the sample type of `data_type`, which must be float or complex.
    dispatch_flex,
    FlexSample, "float or complex",
    [SFloat => f32, DFloat => f64, SComplex => SComplex, DComplex => DComplex]
);

family_dispatch!(
    /// A generic operation over complex sample types.
    ComplexVisitor,
    /// Calls `visitor` with the sample type of `data_type`, which must be complex.
    dispatch_complex,
    ComplexSample, "complex",
    [SComplex => SComplex, DComplex => DComplex]
);

#[cfg(test)]
mod tests {
    use super::*;

    struct TypeOf;

    impl SampleVisitor for TypeOf {
        type Output = DataType;

        fn visit<T: Sample>(self) -> DataType {
            T::DATA_TYPE
        }
    }

    impl RealVisitor for TypeOf {
        type Output = DataType;

        fn visit<T: RealSample>(self) -> DataType {
            T::DATA_TYPE
        }
    }

    impl ComplexVisitor for TypeOf {
        type Output = DataType;

        fn visit<T: ComplexSample>(self) -> DataType {
            T::DATA_TYPE
        }
    }

    struct Boxed(f64);

    trait Scale {
        fn scale(&self, v: f64) -> f64;
    }

    struct Typed<T>(f64, std::marker::PhantomData<T>);

    impl<T: FloatSample> Scale for Typed<T> {
        fn scale(&self, v: f64) -> f64 {
            let x: T = crate::sample::clamp_cast(v);
            let f: T = crate::sample::clamp_cast(self.0);
            crate::sample::clamp_cast::<f64, T>(x * f)
        }
    }

    impl FloatVisitor for Boxed {
        type Output = Box<dyn Scale>;

        fn visit<T: FloatSample>(self) -> Box<dyn Scale> {
            Box::new(Typed::<T>(self.0, std::marker::PhantomData))
        }
    }

    #[test]
    fn test_dispatch_selects_matching_type() {
        for t in DataType::ALL {
            assert_eq!(dispatch(t, TypeOf), t);
        }
    }

    #[test]
    fn test_family_dispatch() -> Result<(), CoreError> {
        for t in DataType::ALL {
            let real = dispatch_real(t, TypeOf);
            assert_eq!(real.is_ok(), t.is_real(), "{t}");
            if let Ok(v) = real {
                assert_eq!(v, t);
            }
            assert_eq!(dispatch_complex(t, TypeOf).is_ok(), t.is_complex());
        }
        assert_eq!(
            dispatch_real(DataType::Bin, TypeOf),
            Err(CoreError::data_type_not_supported(DataType::Bin, "real"))
        );
        let scale = dispatch_float(DataType::SFloat, Boxed(2.0))?;
        assert_eq!(scale.scale(1.5), 3.0);
        Ok(())
    }
}
