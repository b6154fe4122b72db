//! Option sets for the frameworks.
//!
//! Each framework has an enum naming its options and a small set type combining any number of
//! them with `|`, together with the [`ExecutionStrategy`] to run with.
//!
//! ```rust
//! use ndimage_framework::{ExecutionStrategy, ScanOption, ScanOptions};
//!
//! let opts = ScanOption::TensorAsSpatialDim | ScanOption::NotInPlace;
//! assert!(opts.contains(ScanOption::NotInPlace));
//! assert!(!opts.contains(ScanOption::NeedCoordinates));
//! assert_eq!(ScanOptions::default().strategy(), ExecutionStrategy::Auto);
//! ```

use std::ops::BitOr;

use crate::parallel::ExecutionStrategy;

macro_rules! option_set {
    (
        $(#[$enum_meta:meta])*
        $option:ident,
        $(#[$set_meta:meta])*
        $set:ident,
        $serial:ident,
        { $($(#[$variant_meta:meta])* $variant:ident),+ $(,)? }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $option {
            $($(#[$variant_meta])* $variant),+
        }

        $(#[$set_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $set {
            flags: u16,
            strategy: ExecutionStrategy,
        }

        impl $set {
            /// No options, run with [`ExecutionStrategy::Auto`].
            pub const fn empty() -> Self {
                Self {
                    flags: 0,
                    strategy: ExecutionStrategy::Auto,
                }
            }

            /// Returns true if `option` is in the set.
            pub fn contains(self, option: $option) -> bool {
                self.flags & (1 << option as u16) != 0
            }

            /// The set with `option` added.
            pub fn with(self, option: $option) -> Self {
                Self {
                    flags: self.flags | (1 << option as u16),
                    ..self
                }
            }

            /// The set with `option` removed.
            pub fn without(self, option: $option) -> Self {
                Self {
                    flags: self.flags & !(1 << option as u16),
                    ..self
                }
            }

            /// The set running with `strategy`.
            pub fn with_strategy(self, strategy: ExecutionStrategy) -> Self {
                Self { strategy, ..self }
            }

            /// How to spread work over threads. Serial if
            #[doc = concat!("[`", stringify!($option), "::", stringify!($serial), "`]")]
            /// is set.
            pub fn strategy(self) -> ExecutionStrategy {
                if self.contains($option::$serial) {
                    ExecutionStrategy::Serial
                } else {
                    self.strategy
                }
            }
        }

        impl From<$option> for $set {
            fn from(option: $option) -> Self {
                Self::empty().with(option)
            }
        }

        impl BitOr for $option {
            type Output = $set;

            fn bitor(self, rhs: $option) -> $set {
                $set::from(self).with(rhs)
            }
        }

        impl BitOr<$option> for $set {
            type Output = $set;

            fn bitor(self, rhs: $option) -> $set {
                self.with(rhs)
            }
        }

        impl BitOr for $set {
            type Output = $set;

            fn bitor(self, rhs: $set) -> $set {
                let strategy = match rhs.strategy {
                    ExecutionStrategy::Auto => self.strategy,
                    other => other,
                };
                $set {
                    flags: self.flags | rhs.flags,
                    strategy,
                }
            }
        }
    };
}

option_set!(
    /// Options for the scan framework.
    ScanOption,
    /// A set of [`ScanOption`]s.
    ScanOptions,
    NoMultiThreading,
    {
        /// Never call the line filter from more than one thread.
        NoMultiThreading,
        /// The line filter needs the coordinates of the first pixel of each line.
        NeedCoordinates,
        /// Treat the tensor as an extra spatial dimension, so the filter only sees scalars.
        TensorAsSpatialDim,
        /// Require inputs of equal sizes instead of expanding singleton dimensions.
        NoSingletonExpansion,
        /// Output buffers never share memory with input buffers.
        NotInPlace,
    }
);

option_set!(
    /// Options for the separable framework.
    SeparableOption,
    /// A set of [`SeparableOption`]s.
    SeparableOptions,
    NoMultiThreading,
    {
        /// Never call the line filter from more than one thread.
        NoMultiThreading,
        /// Process each tensor element as a separate scalar image.
        AsScalarImage,
        /// Always give the filter a private, contiguous copy of the input line.
        UseInputBuffer,
        /// Always give the filter a contiguous output line, copied into the image afterwards.
        UseOutputBuffer,
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine() {
        let opts = ScanOptions::default() | ScanOption::NeedCoordinates;
        assert!(opts.contains(ScanOption::NeedCoordinates));
        let opts = opts.without(ScanOption::NeedCoordinates);
        assert_eq!(opts, ScanOptions::empty());

        let fixed = ScanOptions::empty().with_strategy(ExecutionStrategy::Fixed(2));
        let merged = fixed | (ScanOption::NotInPlace | ScanOption::TensorAsSpatialDim);
        assert_eq!(merged.strategy(), ExecutionStrategy::Fixed(2));
        assert!(merged.contains(ScanOption::TensorAsSpatialDim));
    }

    #[test]
    fn test_no_multithreading_forces_serial() {
        let opts = SeparableOptions::empty()
            .with_strategy(ExecutionStrategy::Fixed(4))
            .with(SeparableOption::NoMultiThreading);
        assert_eq!(opts.strategy(), ExecutionStrategy::Serial);
    }
}
