#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `ndimage-core` holds everything below the image abstraction:
//!
//! - **DataType**: the closed set of thirteen sample types an image can hold, with their sizes,
//!   classes and promotion rules.
//! - **Sample**: the Rust types behind each [`DataType`] and the saturating [`clamp_cast`]
//!   between any two of them.
//! - **Dispatch**: visitor traits that turn a run-time [`DataType`] into a call of a generic
//!   function, once per operation.
//! - **Storage**: the reference-counted [`DataSegment`] that views of one image share, and the
//!   [`DataAllocator`] it is allocated with.
//! - **Line copy**: strided copy and conversion of one image line into another.
//!
//! ```rust
//! use ndimage_core::{clamp_cast, DataType, Sample};
//!
//! assert_eq!(<u8 as Sample>::DATA_TYPE, DataType::UInt8);
//! assert_eq!(clamp_cast::<u8, i32>(300), 255);
//! assert_eq!(DataType::suggest_arithmetic(DataType::UInt8, DataType::SInt32), DataType::DFloat);
//! ```

/// Memory allocation for data segments.
pub mod allocator;

/// Strided copy and conversion of lines of samples.
pub mod copy_buffer;

/// The [`DataType`] registry.
pub mod datatype;

/// Run-time to compile-time sample type dispatch.
pub mod dispatch;

/// Error types for the core crate.
pub mod error;

/// Sample types and the saturating cast between them.
pub mod sample;

/// Reference-counted storage shared between image views.
pub mod storage;

pub use crate::allocator::{CpuAllocator, DataAllocator, DataAllocatorError};
pub use crate::copy_buffer::{copy_buffer, fill_buffer, ConstLine, MutLine};
pub use crate::datatype::{DataType, DataTypeClasses};
pub use crate::dispatch::{
    dispatch, dispatch_complex, dispatch_flex, dispatch_float, dispatch_integer,
    dispatch_non_complex, dispatch_real, ComplexVisitor, FlexVisitor, FloatVisitor,
    IntegerVisitor, NonComplexVisitor, RealVisitor, SampleVisitor,
};
pub use crate::error::CoreError;
pub use crate::sample::{
    clamp_cast, Bin, ComplexSample, DComplex, FlexSample, FloatSample, IntegerSample,
    NonComplexSample, RealSample, SComplex, Sample, SampleValue,
};
pub use crate::storage::DataSegment;
