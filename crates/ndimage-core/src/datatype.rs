use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::error::CoreError;

/// The type of the samples stored in an image.
///
/// The variants are ordered from "smallest" to "largest" type, which the promotion functions rely
/// on. Every variant belongs to exactly one of binary, unsigned integer, signed integer, float or
/// complex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum DataType {
    /// Binary, one byte per sample holding 0 or 1.
    Bin,
    /// 8-bit unsigned integer.
    UInt8,
    /// 8-bit signed integer.
    SInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 16-bit signed integer.
    SInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 32-bit signed integer.
    SInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 64-bit signed integer.
    SInt64,
    /// Single-precision float.
    #[default]
    SFloat,
    /// Double-precision float.
    DFloat,
    /// Single-precision complex.
    SComplex,
    /// Double-precision complex.
    DComplex,
}

impl DataType {
    /// All data types, in order.
    pub const ALL: [DataType; 13] = [
        DataType::Bin,
        DataType::UInt8,
        DataType::SInt8,
        DataType::UInt16,
        DataType::SInt16,
        DataType::UInt32,
        DataType::SInt32,
        DataType::UInt64,
        DataType::SInt64,
        DataType::SFloat,
        DataType::DFloat,
        DataType::SComplex,
        DataType::DComplex,
    ];

    /// The canonical name of the type, e.g. `"UINT8"`.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Bin => "BIN",
            DataType::UInt8 => "UINT8",
            DataType::SInt8 => "SINT8",
            DataType::UInt16 => "UINT16",
            DataType::SInt16 => "SINT16",
            DataType::UInt32 => "UINT32",
            DataType::SInt32 => "SINT32",
            DataType::UInt64 => "UINT64",
            DataType::SInt64 => "SINT64",
            DataType::SFloat => "SFLOAT",
            DataType::DFloat => "DFLOAT",
            DataType::SComplex => "SCOMPLEX",
            DataType::DComplex => "DCOMPLEX",
        }
    }

    /// Number of bytes of one sample.
    pub const fn size_of(self) -> usize {
        match self {
            DataType::Bin | DataType::UInt8 | DataType::SInt8 => 1,
            DataType::UInt16 | DataType::SInt16 => 2,
            DataType::UInt32 | DataType::SInt32 | DataType::SFloat => 4,
            DataType::UInt64 | DataType::SInt64 | DataType::DFloat | DataType::SComplex => 8,
            DataType::DComplex => 16,
        }
    }

    /// The single class this type belongs to.
    pub const fn class(self) -> DataTypeClasses {
        match self {
            DataType::Bin => DataTypeClasses::BIN,
            DataType::UInt8 => DataTypeClasses::UINT8,
            DataType::SInt8 => DataTypeClasses::SINT8,
            DataType::UInt16 => DataTypeClasses::UINT16,
            DataType::SInt16 => DataTypeClasses::SINT16,
            DataType::UInt32 => DataTypeClasses::UINT32,
            DataType::SInt32 => DataTypeClasses::SINT32,
            DataType::UInt64 => DataTypeClasses::UINT64,
            DataType::SInt64 => DataTypeClasses::SINT64,
            DataType::SFloat => DataTypeClasses::SFLOAT,
            DataType::DFloat => DataTypeClasses::DFLOAT,
            DataType::SComplex => DataTypeClasses::SCOMPLEX,
            DataType::DComplex => DataTypeClasses::DCOMPLEX,
        }
    }

    /// Whether the type is in the given collection of classes.
    pub const fn is_a(self, classes: DataTypeClasses) -> bool {
        classes.contains(self)
    }

    /// `Bin`.
    pub const fn is_binary(self) -> bool {
        self.is_a(DataTypeClasses::BINARY)
    }

    /// An unsigned integer type.
    pub const fn is_uint(self) -> bool {
        self.is_a(DataTypeClasses::UINT)
    }

    /// A signed integer type.
    pub const fn is_sint(self) -> bool {
        self.is_a(DataTypeClasses::SINT)
    }

    /// Any integer type, excluding `Bin`.
    pub const fn is_integer(self) -> bool {
        self.is_a(DataTypeClasses::INTEGER)
    }

    /// `SFloat` or `DFloat`.
    pub const fn is_float(self) -> bool {
        self.is_a(DataTypeClasses::FLOAT)
    }

    /// Integer or float.
    pub const fn is_real(self) -> bool {
        self.is_a(DataTypeClasses::REAL)
    }

    /// `SComplex` or `DComplex`.
    pub const fn is_complex(self) -> bool {
        self.is_a(DataTypeClasses::COMPLEX)
    }

    /// Float or complex.
    pub const fn is_flex(self) -> bool {
        self.is_a(DataTypeClasses::FLEX)
    }

    /// Float, complex or binary.
    pub const fn is_flex_bin(self) -> bool {
        self.is_a(DataTypeClasses::FLEX_BIN)
    }

    /// Binary or unsigned integer.
    pub const fn is_unsigned(self) -> bool {
        self.is_a(DataTypeClasses::UNSIGNED)
    }

    /// Signed integer, float or complex.
    pub const fn is_signed(self) -> bool {
        self.is_a(DataTypeClasses::SIGNED)
    }

    /// An integer type able to hold the values of this type.
    ///
    /// Floats map to a signed integer of the same size, binary to `UInt8`.
    pub const fn suggest_integer(self) -> DataType {
        match self {
            DataType::Bin => DataType::UInt8,
            DataType::SFloat | DataType::SComplex => DataType::SInt32,
            DataType::DFloat | DataType::DComplex => DataType::SInt64,
            t => t,
        }
    }

    /// A signed type able to hold the values of this type.
    pub const fn suggest_signed(self) -> DataType {
        match self {
            DataType::Bin => DataType::SInt8,
            DataType::UInt8 => DataType::SInt16,
            DataType::UInt16 => DataType::SInt32,
            DataType::UInt32 | DataType::UInt64 => DataType::SInt64,
            t => t,
        }
    }

    /// The type of the absolute value of this type.
    pub const fn suggest_abs(self) -> DataType {
        match self {
            DataType::SInt8 => DataType::UInt8,
            DataType::SInt16 => DataType::UInt16,
            DataType::SInt32 => DataType::UInt32,
            DataType::SInt64 => DataType::UInt64,
            DataType::SComplex => DataType::SFloat,
            DataType::DComplex => DataType::DFloat,
            t => t,
        }
    }

    /// A float type: double precision for 32 and 64-bit inputs.
    pub const fn suggest_float(self) -> DataType {
        match self {
            DataType::UInt32
            | DataType::SInt32
            | DataType::UInt64
            | DataType::SInt64
            | DataType::DFloat
            | DataType::DComplex => DataType::DFloat,
            _ => DataType::SFloat,
        }
    }

    /// A double-precision type, complex if this type is complex.
    pub const fn suggest_double(self) -> DataType {
        if self.is_complex() {
            DataType::DComplex
        } else {
            DataType::DFloat
        }
    }

    /// A real type: complex maps to float, binary to `UInt8`.
    pub const fn suggest_real(self) -> DataType {
        match self {
            DataType::Bin => DataType::UInt8,
            DataType::SComplex => DataType::SFloat,
            DataType::DComplex => DataType::DFloat,
            t => t,
        }
    }

    /// A complex type: double precision for 32 and 64-bit inputs.
    pub const fn suggest_complex(self) -> DataType {
        match self.suggest_float() {
            DataType::DFloat => DataType::DComplex,
            _ => DataType::SComplex,
        }
    }

    /// A float or complex type.
    pub const fn suggest_flex(self) -> DataType {
        if self.is_complex() {
            self
        } else {
            self.suggest_float()
        }
    }

    /// A float, complex or binary type.
    pub const fn suggest_flex_bin(self) -> DataType {
        match self {
            DataType::Bin => DataType::Bin,
            t => t.suggest_flex(),
        }
    }

    /// The float type of the real and imaginary parts of a complex type.
    ///
    /// Returns `None` for non-complex types.
    pub const fn real_counterpart(self) -> Option<DataType> {
        match self {
            DataType::SComplex => Some(DataType::SFloat),
            DataType::DComplex => Some(DataType::DFloat),
            _ => None,
        }
    }

    /// A float, complex or binary type for the result of arithmetic between the two types.
    pub fn suggest_arithmetic(type1: DataType, type2: DataType) -> DataType {
        let t1 = type1.suggest_flex_bin();
        let t2 = type2.suggest_flex_bin();
        let (hi, lo) = if t1 >= t2 { (t1, t2) } else { (t2, t1) };
        match (hi, lo) {
            (DataType::DComplex, _) => DataType::DComplex,
            (DataType::SComplex, DataType::DFloat) => DataType::DComplex,
            (DataType::SComplex, _) => DataType::SComplex,
            (DataType::DFloat, _) => DataType::DFloat,
            (DataType::SFloat, _) => DataType::SFloat,
            _ => DataType::Bin,
        }
    }

    /// A type that can hold any sample of either type, for dyadic operations.
    ///
    /// The result is symmetric in its arguments.
    pub fn suggest_dyadic_operation(type1: DataType, type2: DataType) -> DataType {
        if type1 == type2 {
            return type1;
        }
        let wide = |t: DataType| t.is_integer() && t.size_of() >= 4;
        if type1.is_complex() || type2.is_complex() {
            let double = type1 == DataType::DComplex
                || type2 == DataType::DComplex
                || type1 == DataType::DFloat
                || type2 == DataType::DFloat
                || wide(type1)
                || wide(type2);
            return if double {
                DataType::DComplex
            } else {
                DataType::SComplex
            };
        }
        if type1.is_float() || type2.is_float() {
            let double = type1 == DataType::DFloat
                || type2 == DataType::DFloat
                || wide(type1)
                || wide(type2);
            return if double {
                DataType::DFloat
            } else {
                DataType::SFloat
            };
        }
        if type1.is_binary() {
            return type2;
        }
        if type2.is_binary() {
            return type1;
        }
        let bits1 = type1.size_of() * 8;
        let bits2 = type2.size_of() * 8;
        match (type1.is_sint(), type2.is_sint()) {
            (false, false) => unsigned_of_bits(bits1.max(bits2)),
            (true, true) => signed_of_bits(bits1.max(bits2)),
            (s1, _) => {
                let (signed_bits, unsigned_bits) = if s1 { (bits1, bits2) } else { (bits2, bits1) };
                if signed_bits > unsigned_bits {
                    signed_of_bits(signed_bits)
                } else {
                    signed_of_bits((unsigned_bits * 2).min(64))
                }
            }
        }
    }
}

const fn unsigned_of_bits(bits: usize) -> DataType {
    match bits {
        8 => DataType::UInt8,
        16 => DataType::UInt16,
        32 => DataType::UInt32,
        _ => DataType::UInt64,
    }
}

const fn signed_of_bits(bits: usize) -> DataType {
    match bits {
        8 => DataType::SInt8,
        16 => DataType::SInt16,
        32 => DataType::SInt32,
        _ => DataType::SInt64,
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownDataTypeName(s.to_string()))
    }
}

/// A collection of data types, used to state which types an operation accepts.
///
/// Collections combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DataTypeClasses(u16);

impl DataTypeClasses {
    /// Only `Bin`.
    pub const BIN: Self = Self(1 << 0);
    /// Only `UInt8`.
    pub const UINT8: Self = Self(1 << 1);
    /// Only `SInt8`.
    pub const SINT8: Self = Self(1 << 2);
    /// Only `UInt16`.
    pub const UINT16: Self = Self(1 << 3);
    /// Only `SInt16`.
    pub const SINT16: Self = Self(1 << 4);
    /// Only `UInt32`.
    pub const UINT32: Self = Self(1 << 5);
    /// Only `SInt32`.
    pub const SINT32: Self = Self(1 << 6);
    /// Only `UInt64`.
    pub const UINT64: Self = Self(1 << 7);
    /// Only `SInt64`.
    pub const SINT64: Self = Self(1 << 8);
    /// Only `SFloat`.
    pub const SFLOAT: Self = Self(1 << 9);
    /// Only `DFloat`.
    pub const DFLOAT: Self = Self(1 << 10);
    /// Only `SComplex`.
    pub const SCOMPLEX: Self = Self(1 << 11);
    /// Only `DComplex`.
    pub const DCOMPLEX: Self = Self(1 << 12);

    /// Binary types.
    pub const BINARY: Self = Self::BIN;
    /// Unsigned integers.
    pub const UINT: Self = Self(Self::UINT8.0 | Self::UINT16.0 | Self::UINT32.0 | Self::UINT64.0);
    /// Signed integers.
    pub const SINT: Self = Self(Self::SINT8.0 | Self::SINT16.0 | Self::SINT32.0 | Self::SINT64.0);
    /// All integers, excluding binary.
    pub const INTEGER: Self = Self(Self::UINT.0 | Self::SINT.0);
    /// Integers and binary.
    pub const INT_OR_BIN: Self = Self(Self::INTEGER.0 | Self::BIN.0);
    /// Floats.
    pub const FLOAT: Self = Self(Self::SFLOAT.0 | Self::DFLOAT.0);
    /// Complex types.
    pub const COMPLEX: Self = Self(Self::SCOMPLEX.0 | Self::DCOMPLEX.0);
    /// Floats and complex.
    pub const FLEX: Self = Self(Self::FLOAT.0 | Self::COMPLEX.0);
    /// Floats, complex and binary.
    pub const FLEX_BIN: Self = Self(Self::FLEX.0 | Self::BIN.0);
    /// Binary and unsigned integers.
    pub const UNSIGNED: Self = Self(Self::UINT.0 | Self::BIN.0);
    /// Signed integers, floats and complex.
    pub const SIGNED: Self = Self(Self::SINT.0 | Self::FLEX.0);
    /// Integers and floats.
    pub const REAL: Self = Self(Self::INTEGER.0 | Self::FLOAT.0);
    /// Signed integers and floats.
    pub const SIGNED_REAL: Self = Self(Self::SINT.0 | Self::FLOAT.0);
    /// Everything except binary.
    pub const NON_BINARY: Self = Self(Self::REAL.0 | Self::COMPLEX.0);
    /// Everything except complex.
    pub const NON_COMPLEX: Self = Self(Self::REAL.0 | Self::BIN.0);
    /// All types.
    pub const ALL: Self = Self(Self::NON_COMPLEX.0 | Self::COMPLEX.0);

    /// Whether `data_type` is in the collection.
    pub const fn contains(self, data_type: DataType) -> bool {
        self.0 & data_type.class().0 != 0
    }

    /// Number of types in the collection.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates over the types in the collection, in order.
    pub fn iter(self) -> impl Iterator<Item = DataType> {
        DataType::ALL.into_iter().filter(move |&t| self.contains(t))
    }
}

impl BitOr for DataTypeClasses {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DataTypeClasses {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<DataType> for DataTypeClasses {
    fn from(data_type: DataType) -> Self {
        data_type.class()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DataType::*;

    #[test]
    fn test_sizes_and_names() -> Result<(), CoreError> {
        let sizes: Vec<usize> = DataType::ALL.iter().map(|t| t.size_of()).collect();
        assert_eq!(sizes, vec![1, 1, 1, 2, 2, 4, 4, 8, 8, 4, 8, 8, 16]);
        for t in DataType::ALL {
            assert_eq!(t.name().parse::<DataType>()?, t);
        }
        assert_eq!("sfloat".parse::<DataType>()?, SFloat);
        assert!("FLOAT32".parse::<DataType>().is_err());
        Ok(())
    }

    #[test]
    fn test_every_type_in_one_class() {
        let partition = [
            DataTypeClasses::BINARY,
            DataTypeClasses::UINT,
            DataTypeClasses::SINT,
            DataTypeClasses::FLOAT,
            DataTypeClasses::COMPLEX,
        ];
        for t in DataType::ALL {
            let n = partition.iter().filter(|c| c.contains(t)).count();
            assert_eq!(n, 1, "{t}");
        }
        assert_eq!(DataTypeClasses::ALL.count(), 13);
        assert_eq!(DataTypeClasses::NON_COMPLEX.count(), 11);
        assert!(Bin.is_unsigned());
        assert!(SFloat.is_signed());
        assert!(!Bin.is_integer());
        let classes = DataTypeClasses::UINT8 | DataTypeClasses::FLOAT;
        assert_eq!(classes.iter().collect::<Vec<_>>(), vec![UInt8, SFloat, DFloat]);
    }

    #[test]
    fn test_suggest_table() {
        // (input, integer, signed, abs, float, double, real, complex, flex, flexbin)
        let table = [
            (Bin, UInt8, SInt8, Bin, SFloat, DFloat, UInt8, SComplex, SFloat, Bin),
            (UInt8, UInt8, SInt16, UInt8, SFloat, DFloat, UInt8, SComplex, SFloat, SFloat),
            (SInt8, SInt8, SInt8, UInt8, SFloat, DFloat, SInt8, SComplex, SFloat, SFloat),
            (UInt16, UInt16, SInt32, UInt16, SFloat, DFloat, UInt16, SComplex, SFloat, SFloat),
            (SInt16, SInt16, SInt16, UInt16, SFloat, DFloat, SInt16, SComplex, SFloat, SFloat),
            (UInt32, UInt32, SInt64, UInt32, DFloat, DFloat, UInt32, DComplex, DFloat, DFloat),
            (SInt32, SInt32, SInt32, UInt32, DFloat, DFloat, SInt32, DComplex, DFloat, DFloat),
            (UInt64, UInt64, SInt64, UInt64, DFloat, DFloat, UInt64, DComplex, DFloat, DFloat),
            (SInt64, SInt64, SInt64, UInt64, DFloat, DFloat, SInt64, DComplex, DFloat, DFloat),
            (SFloat, SInt32, SFloat, SFloat, SFloat, DFloat, SFloat, SComplex, SFloat, SFloat),
            (DFloat, SInt64, DFloat, DFloat, DFloat, DFloat, DFloat, DComplex, DFloat, DFloat),
            (SComplex, SInt32, SComplex, SFloat, SFloat, DComplex, SFloat, SComplex, SComplex, SComplex),
            (DComplex, SInt64, DComplex, DFloat, DFloat, DComplex, DFloat, DComplex, DComplex, DComplex),
        ];
        for (t, int, signed, abs, float, double, real, complex, flex, flex_bin) in table {
            assert_eq!(t.suggest_integer(), int, "integer {t}");
            assert_eq!(t.suggest_signed(), signed, "signed {t}");
            assert_eq!(t.suggest_abs(), abs, "abs {t}");
            assert_eq!(t.suggest_float(), float, "float {t}");
            assert_eq!(t.suggest_double(), double, "double {t}");
            assert_eq!(t.suggest_real(), real, "real {t}");
            assert_eq!(t.suggest_complex(), complex, "complex {t}");
            assert_eq!(t.suggest_flex(), flex, "flex {t}");
            assert_eq!(t.suggest_flex_bin(), flex_bin, "flexbin {t}");
        }
    }

    #[test]
    fn test_suggest_arithmetic() {
        assert_eq!(DataType::suggest_arithmetic(Bin, Bin), Bin);
        assert_eq!(DataType::suggest_arithmetic(UInt8, UInt8), SFloat);
        assert_eq!(DataType::suggest_arithmetic(UInt8, SInt32), DFloat);
        assert_eq!(DataType::suggest_arithmetic(SComplex, UInt32), DComplex);
        assert_eq!(DataType::suggest_arithmetic(Bin, SComplex), SComplex);
        assert_eq!(DataType::suggest_arithmetic(SFloat, Bin), SFloat);
    }

    #[test]
    fn test_suggest_dyadic_operation() {
        let cases = [
            (Bin, UInt8, UInt8),
            (UInt8, SInt8, SInt16),
            (UInt8, UInt16, UInt16),
            (SInt8, UInt16, SInt32),
            (SInt8, UInt32, SInt64),
            (SInt16, UInt16, SInt32),
            (UInt32, SInt32, SInt64),
            (UInt64, SInt8, SInt64),
            (SInt64, UInt8, SInt64),
            (SFloat, UInt16, SFloat),
            (SFloat, UInt32, DFloat),
            (SFloat, SInt64, DFloat),
            (SComplex, SInt16, SComplex),
            (SComplex, DFloat, DComplex),
            (SComplex, UInt32, DComplex),
            (DComplex, Bin, DComplex),
        ];
        for (a, b, expected) in cases {
            assert_eq!(DataType::suggest_dyadic_operation(a, b), expected, "{a} {b}");
            assert_eq!(DataType::suggest_dyadic_operation(b, a), expected, "{b} {a}");
        }
        for t in DataType::ALL {
            assert_eq!(DataType::suggest_dyadic_operation(t, t), t);
        }
    }
}
