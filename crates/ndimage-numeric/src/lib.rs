#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `ndimage-numeric` is the leaf crate of the workspace. It has no notion of images; it
//! provides the small numeric building blocks that image code and line filters use:
//!
//! - **Integer helpers**: [`gcd`], [`div_ceil`], [`div_floor`], [`div_round`] and [`round_up`].
//! - **Saturated arithmetic**: the [`SaturatedArithmetic`] trait, where integer results clamp
//!   to the representable range instead of wrapping.
//! - **Accumulators**: streaming statistics that can be merged across threads.
//! - **Eigen-decomposition**: of small real symmetric matrices.
//! - **Bessel functions**: of the first and second kind, single-precision accurate.
//!
//! ```rust
//! use ndimage_numeric::{saturated_add, StatisticsAccumulator};
//!
//! assert_eq!(saturated_add(250u8, 20u8), 255u8);
//!
//! let mut acc = StatisticsAccumulator::default();
//! [1.0, 2.0, 3.0].iter().for_each(|&x| acc.push(x));
//! assert_eq!(acc.mean(), 2.0);
//! ```

/// Streaming statistics accumulators.
pub mod accumulators;

/// Bessel functions of the first and second kind.
pub mod bessel;

/// Eigen-decomposition of small symmetric matrices.
pub mod eigen;

/// Error types for the numeric crate.
pub mod error;

/// Integer division and rounding helpers.
pub mod math;

/// Arithmetic that clamps instead of wrapping.
pub mod saturated;

pub use crate::accumulators::{MinMaxAccumulator, StatisticsAccumulator, VarianceAccumulator};
pub use crate::bessel::{bessel_j0, bessel_j1, bessel_jn, bessel_y0, bessel_y1, bessel_yn};
pub use crate::eigen::{
    symmetric_eigen_decomposition, symmetric_eigen_decomposition_2d,
    symmetric_eigen_decomposition_packed, EigenDecomposition,
};
pub use crate::error::NumericError;
pub use crate::math::{div_ceil, div_floor, div_round, gcd, round_up, sort_indices};
pub use crate::saturated::{
    saturated_add, saturated_div, saturated_inv, saturated_mul, saturated_sub,
    SaturatedArithmetic,
};
